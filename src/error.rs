//! Error types for the gateway
//!
//! Only boot-time failures surface as [`Error`]. Request-scoped failures
//! (malformed requests, unknown verbs, handler failures and faults) are
//! absorbed by the dispatcher and turned into wire replies.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while booting or running the gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// The client-facing socket could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the gateway attempted to bind
        addr: SocketAddr,
        /// Underlying socket error
        #[source]
        source: std::io::Error,
    },

    /// No plugin folder could be resolved
    #[error("failed to locate plugin folder (searched from {searched_from})")]
    PluginDirNotFound {
        /// Directory the search started from (or the configured path)
        searched_from: PathBuf,
    },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON-RPC endpoint returned an error or an unexpected payload
    #[error("rpc error: {0}")]
    Rpc(String),
}
