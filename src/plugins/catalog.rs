//! Compiled-in capabilities and their instantiation from manifests

use std::collections::BTreeMap;
use std::sync::Arc;

use super::manifest::PluginManifest;
use super::{EchoPlugin, EthereumPlugin, Plugin};

/// Builds a capability bound to the given verb
pub type PluginFactory = fn(verb: &str) -> Arc<dyn Plugin>;

/// Closed set of capabilities linked into the gateway
///
/// Adding a capability means adding a factory here and rebuilding.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    factories: BTreeMap<&'static str, PluginFactory>,
}

impl Catalog {
    /// Empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every capability shipped with the gateway
    #[must_use]
    pub fn builtin() -> Self {
        Self::new().with("echo", echo).with("ethereum", ethereum)
    }

    /// Add a capability factory
    #[must_use]
    pub fn with(mut self, name: &'static str, factory: PluginFactory) -> Self {
        self.factories.insert(name, factory);
        self
    }

    /// Capability names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// One manifest per capability, exposed under the capability name
    #[must_use]
    pub fn default_manifests(&self) -> Vec<PluginManifest> {
        self.factories
            .keys()
            .map(|name| PluginManifest::for_capability(name))
            .collect()
    }

    /// Instantiate the capabilities named by `manifests`
    ///
    /// Disabled manifests and unknown capability names are reported as
    /// diagnostics.
    #[must_use]
    pub fn instantiate(&self, manifests: &[PluginManifest]) -> (Vec<Arc<dyn Plugin>>, Vec<String>) {
        let mut plugins = Vec::with_capacity(manifests.len());
        let mut diagnostics = Vec::new();

        for manifest in manifests {
            if !manifest.enabled {
                diagnostics.push(format!("Plugin for '{}' is disabled", manifest.verb));
                continue;
            }

            match self.factories.get(manifest.capability.as_str()) {
                Some(factory) => plugins.push(factory(&manifest.verb)),
                None => diagnostics.push(format!(
                    "Unknown capability '{}' for verb '{}' (available: {})",
                    manifest.capability,
                    manifest.verb,
                    self.names().join(", ")
                )),
            }
        }

        (plugins, diagnostics)
    }
}

fn echo(verb: &str) -> Arc<dyn Plugin> {
    Arc::new(EchoPlugin::new(verb))
}

fn ethereum(verb: &str) -> Arc<dyn Plugin> {
    Arc::new(EthereumPlugin::new(verb))
}
