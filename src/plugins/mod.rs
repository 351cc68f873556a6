//! Verification plugins
//!
//! A plugin binds one verb to an async verification routine. Plugins are
//! compiled into the gateway and exposed through a [`Catalog`]; the plugin
//! folder decides which of them are registered, and under which verb.
//!
//! # Example
//!
//! ```rust,ignore
//! use ccgateway::plugins::{Catalog, Registry, discover_manifests};
//!
//! let (manifests, mut diagnostics) = discover_manifests(&plugin_dir);
//! let (capabilities, more) = Catalog::builtin().instantiate(&manifests);
//! diagnostics.extend(more);
//! let (registry, more) = Registry::load(capabilities);
//! diagnostics.extend(more);
//! ```

pub mod catalog;
pub mod discovery;
pub mod echo;
pub mod ethereum;
pub mod manifest;
pub mod registry;

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use async_trait::async_trait;

pub use catalog::Catalog;
pub use discovery::{discover_manifests, resolve_plugin_dir};
pub use echo::EchoPlugin;
pub use ethereum::EthereumPlugin;
pub use manifest::PluginManifest;
pub use registry::Registry;

/// Result of one verification
///
/// Success carries no detail; failure always carries a reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Whether the verification passed
    pub success: bool,
    /// Reason for a failure
    pub detail: Option<String>,
}

impl Outcome {
    /// Verification passed
    #[must_use]
    pub const fn success() -> Self {
        Self {
            success: true,
            detail: None,
        }
    }

    /// Verification failed for the given reason
    #[must_use]
    pub fn failure(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: Some(reason.into()),
        }
    }
}

/// Verification plugin contract
///
/// Expected validation failures are reported as [`Outcome::failure`].
/// `Err` is reserved for unexpected faults (unreachable endpoint, malformed
/// remote response); the dispatcher turns those into a `fail` reply.
/// Implementations may suspend on network I/O and must not keep state
/// across calls that the gateway relies on.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Verb this plugin answers to
    fn verb(&self) -> &str;

    /// Run one verification
    ///
    /// `args` excludes the verb token itself.
    ///
    /// # Errors
    ///
    /// Returns error on unexpected faults only
    async fn run(&self, config: &PluginConfig, args: &[String]) -> anyhow::Result<Outcome>;
}

/// Verb-scoped configuration section, forwarded to the plugin verbatim
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginConfig {
    values: BTreeMap<String, String>,
}

impl PluginConfig {
    /// Build a section from key/value pairs
    #[must_use]
    pub const fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Raw value for a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for a key, treating blank values as unset
    #[must_use]
    pub fn get_non_blank(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Parsed value for a key; `None` when missing or unparsable
    #[must_use]
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Whether the section has no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PluginConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// All verb sections from process configuration
#[derive(Debug, Clone, Default)]
pub struct PluginSections {
    sections: HashMap<String, PluginConfig>,
    empty: PluginConfig,
}

impl PluginSections {
    /// Build from a verb -> section map
    #[must_use]
    pub fn new(sections: HashMap<String, PluginConfig>) -> Self {
        Self {
            sections,
            empty: PluginConfig::default(),
        }
    }

    /// Section for a verb; empty when the verb has none
    #[must_use]
    pub fn get(&self, verb: &str) -> &PluginConfig {
        self.sections.get(verb).unwrap_or(&self.empty)
    }

    /// Number of configured sections
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether no sections are configured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_constructors() {
        assert_eq!(Outcome::success().detail, None);
        let failed = Outcome::failure("bad");
        assert!(!failed.success);
        assert_eq!(failed.detail.as_deref(), Some("bad"));
    }

    #[test]
    fn config_lookup() {
        let cfg: PluginConfig = [("rpc", "http://node"), ("blank", "  "), ("n", " 3 ")]
            .into_iter()
            .collect();
        assert_eq!(cfg.get("rpc"), Some("http://node"));
        assert_eq!(cfg.get_non_blank("blank"), None);
        assert_eq!(cfg.get_parsed::<u64>("n"), Some(3));
        assert_eq!(cfg.get_parsed::<u64>("rpc"), None);
        assert_eq!(cfg.get("missing"), None);
    }

    #[test]
    fn missing_section_is_empty() {
        let sections = PluginSections::default();
        assert!(sections.get("ethereum").is_empty());
    }
}
