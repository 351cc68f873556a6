//! Plugin manifest format (`*.plugin.toml`)
//!
//! A manifest exposes one compiled-in capability under a verb:
//!
//! ```toml
//! verb = "ethereum"
//! capability = "ethereum"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// File name suffix recognised as a manifest
pub const MANIFEST_SUFFIX: &str = ".plugin.toml";

/// Binds a verb to a compiled-in capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Verb clients use to reach the capability
    pub verb: String,
    /// Name of the capability in the catalog (e.g. "ethereum")
    pub capability: String,
    /// Disabled manifests are reported and skipped
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_enabled() -> bool {
    true
}

impl PluginManifest {
    /// Manifest exposing a capability under its own name
    #[must_use]
    pub fn for_capability(capability: &str) -> Self {
        Self {
            verb: capability.to_string(),
            capability: capability.to_string(),
            enabled: true,
            description: None,
        }
    }

    /// Read and parse a manifest file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or is not a valid manifest
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}
