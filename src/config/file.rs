//! TOML configuration file loading
//!
//! Looks for `gateway.toml` in the working directory, then in
//! `~/.config/ccgateway/`. All fields are optional; the file is a partial
//! overlay on top of defaults. A `gateway.dev.toml` next to the base file
//! overlays it in turn.
//!
//! ```toml
//! [server]
//! bind_ip = "0.0.0.0"
//! port = 55555
//!
//! [plugins]
//! dir = "plugins"
//!
//! [sections.ethereum]
//! rpc = "http://localhost:8545"
//! confirmationsCount = 12
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Base configuration file name
pub const CONFIG_FILE_NAME: &str = "gateway.toml";

/// Development overlay file name
pub const DEV_CONFIG_FILE_NAME: &str = "gateway.dev.toml";

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Clone, Deserialize)]
pub struct GatewayConfigFile {
    /// Socket configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Plugin folder configuration
    #[serde(default)]
    pub plugins: PluginsFileConfig,

    /// Per-verb configuration sections, forwarded to plugins
    #[serde(default)]
    pub sections: HashMap<String, toml::Table>,
}

/// Socket configuration
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    /// Address to bind (e.g. "127.0.0.1")
    pub bind_ip: Option<String>,

    /// Port to bind
    pub port: Option<u16>,
}

/// Plugin folder configuration
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PluginsFileConfig {
    /// Plugin folder; relative paths resolve against the working directory
    pub dir: Option<PathBuf>,
}

impl GatewayConfigFile {
    /// Parse a configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Apply `other` on top of `self`, key by key
    #[must_use]
    pub fn overlay(mut self, other: Self) -> Self {
        if other.server.bind_ip.is_some() {
            self.server.bind_ip = other.server.bind_ip;
        }
        if other.server.port.is_some() {
            self.server.port = other.server.port;
        }
        if other.plugins.dir.is_some() {
            self.plugins.dir = other.plugins.dir;
        }
        for (verb, table) in other.sections {
            let section = self.sections.entry(verb).or_default();
            for (key, value) in table {
                section.insert(key, value);
            }
        }
        self
    }
}

/// Load the configuration file
///
/// An explicit path must exist and parse. Without one, the standard
/// locations are searched and a broken file is logged and ignored.
/// Returns the path of the base file that was used, if any.
///
/// # Errors
///
/// Returns error if an explicitly requested file cannot be loaded
pub fn load_config_file(
    explicit: Option<&Path>,
    cwd: &Path,
) -> Result<(Option<PathBuf>, GatewayConfigFile)> {
    let (base_path, base) = if let Some(path) = explicit {
        (Some(path.to_path_buf()), GatewayConfigFile::from_file(path)?)
    } else {
        config_file_candidates(cwd)
            .into_iter()
            .find(|p| p.is_file())
            .map_or_else(|| (None, GatewayConfigFile::default()), load_implicit)
    };

    if let Some(path) = &base_path {
        tracing::info!(path = %path.display(), "loaded config file");
    }

    let dev_dir = base_path.as_deref().and_then(Path::parent).unwrap_or(cwd);
    let dev_path = dev_dir.join(DEV_CONFIG_FILE_NAME);
    if !dev_path.is_file() {
        return Ok((base_path, base));
    }

    match GatewayConfigFile::from_file(&dev_path) {
        Ok(dev) => {
            tracing::info!(path = %dev_path.display(), "applied config overlay");
            Ok((base_path, base.overlay(dev)))
        }
        Err(e) => {
            tracing::warn!(
                path = %dev_path.display(),
                error = %e,
                "failed to load config overlay"
            );
            Ok((base_path, base))
        }
    }
}

/// Load a discovered config file, falling back to defaults if it is broken
fn load_implicit(path: PathBuf) -> (Option<PathBuf>, GatewayConfigFile) {
    match GatewayConfigFile::from_file(&path) {
        Ok(config) => (Some(path), config),
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            (None, GatewayConfigFile::default())
        }
    }
}

/// Standard configuration file locations, in search order
#[must_use]
pub fn config_file_candidates(cwd: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![cwd.join(CONFIG_FILE_NAME)];
    if let Some(dirs) = directories::BaseDirs::new() {
        candidates.push(dirs.config_dir().join("ccgateway").join(CONFIG_FILE_NAME));
    }
    candidates
}
