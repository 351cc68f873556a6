//! Configuration management for the gateway
//!
//! Precedence is command line / environment > config file > default.

pub mod file;

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::plugins::{PluginConfig, PluginSections};
use crate::{Error, Result};

pub use file::GatewayConfigFile;

/// Port bound when none is configured
pub const DEFAULT_PORT: u16 = 55_555;

/// Address bound when none is configured (local connections only)
pub const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the socket binds to
    pub bind_ip: IpAddr,

    /// Port the socket binds to
    pub port: u16,

    /// Configured plugin folder; searched for when unset
    pub plugin_dir: Option<PathBuf>,

    /// Per-verb plugin sections
    pub sections: PluginSections,

    /// Base config file that was loaded, if any
    pub source: Option<PathBuf>,
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Bind address override
    pub bind_ip: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Plugin folder override
    pub plugin_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_ip: DEFAULT_BIND_IP,
            port: DEFAULT_PORT,
            plugin_dir: None,
            sections: PluginSections::default(),
            source: None,
        }
    }
}

impl Config {
    /// Load configuration from disk and apply overrides
    ///
    /// # Errors
    ///
    /// Returns error if an explicit config file cannot be loaded or the
    /// bind address is invalid
    pub fn load(explicit: Option<&Path>, cwd: &Path, overrides: Overrides) -> Result<Self> {
        let (source, fc) = file::load_config_file(explicit, cwd)?;
        let mut config = Self::resolve(fc, overrides)?;
        config.source = source;
        Ok(config)
    }

    /// Merge a parsed config file with overrides
    ///
    /// # Errors
    ///
    /// Returns error if the bind address is not a valid IP address
    pub fn resolve(fc: GatewayConfigFile, overrides: Overrides) -> Result<Self> {
        let bind_ip = match overrides.bind_ip.or(fc.server.bind_ip) {
            Some(ip) if !ip.trim().is_empty() => ip
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("invalid bind_ip {ip:?}: {e}")))?,
            _ => {
                tracing::warn!(
                    "bind_ip is not set, defaulting to {DEFAULT_BIND_IP} (local connections only)"
                );
                DEFAULT_BIND_IP
            }
        };

        let port = overrides.port.or(fc.server.port).unwrap_or(DEFAULT_PORT);
        let plugin_dir = overrides.plugin_dir.or(fc.plugins.dir);

        let sections = fc
            .sections
            .into_iter()
            .map(|(verb, table)| (verb, section_from_table(table)))
            .collect::<HashMap<_, _>>();

        Ok(Self {
            bind_ip,
            port,
            plugin_dir,
            sections: PluginSections::new(sections),
            source: None,
        })
    }

    /// Socket address to bind
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }
}

/// Flatten a TOML table into string values
fn section_from_table(table: toml::Table) -> PluginConfig {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> GatewayConfigFile {
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn defaults() {
        let config = Config::resolve(GatewayConfigFile::default(), Overrides::default()).unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:55555".parse().unwrap());
        assert!(config.plugin_dir.is_none());
    }

    #[test]
    fn blank_bind_ip_falls_back() {
        let fc = parse("[server]\nbind_ip = \"  \"\n");
        let config = Config::resolve(fc, Overrides::default()).unwrap();
        assert_eq!(config.bind_ip, DEFAULT_BIND_IP);
    }

    #[test]
    fn invalid_bind_ip_is_an_error() {
        let fc = parse("[server]\nbind_ip = \"localhost:1\"\n");
        assert!(matches!(
            Config::resolve(fc, Overrides::default()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn overrides_beat_file() {
        let fc = parse("[server]\nbind_ip = \"0.0.0.0\"\nport = 6000\n[plugins]\ndir = \"a\"\n");
        let overrides = Overrides {
            bind_ip: Some("::1".to_string()),
            port: Some(7000),
            plugin_dir: Some(PathBuf::from("b")),
        };

        let config = Config::resolve(fc, overrides).unwrap();
        assert_eq!(config.bind_addr(), "[::1]:7000".parse().unwrap());
        assert_eq!(config.plugin_dir, Some(PathBuf::from("b")));
    }

    #[test]
    fn sections_are_stringified() {
        let fc = parse(
            "[sections.ethereum]\nrpc = \"http://node\"\nconfirmationsCount = 3\nstrict = true\n",
        );
        let config = Config::resolve(fc, Overrides::default()).unwrap();

        let eth = config.sections.get("ethereum");
        assert_eq!(eth.get("rpc"), Some("http://node"));
        assert_eq!(eth.get("confirmationsCount"), Some("3"));
        assert_eq!(eth.get("strict"), Some("true"));
        assert!(config.sections.get("bitcoin").is_empty());
    }
}
