//! Gateway bootstrap: plugin loading, socket binding and serving

use std::future::Future;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::dispatch::Dispatcher;
use crate::plugins::{Catalog, Registry, discover_manifests, resolve_plugin_dir};
use crate::reactor::Reactor;
use crate::{Config, Error, Result};

/// Outcome of loading plugins at startup
#[derive(Debug)]
pub struct LoadedPlugins {
    /// Folder the manifests were read from
    pub dir: PathBuf,
    /// Registration table
    pub registry: Registry,
    /// Problems found while loading: unreadable manifests, unknown or
    /// disabled capabilities, rejected verbs
    pub diagnostics: Vec<String>,
}

/// Resolve the plugin folder and build the registration table
///
/// An empty folder registers every capability in `catalog` under its own
/// name.
///
/// # Errors
///
/// Returns [`Error::PluginDirNotFound`] if no plugin folder can be resolved
pub fn load_plugins(config: &Config, root: &Path, catalog: &Catalog) -> Result<LoadedPlugins> {
    let dir = resolve_plugin_dir(config.plugin_dir.as_deref(), root)?;

    let (mut manifests, mut diagnostics) = discover_manifests(&dir);
    if manifests.is_empty() {
        tracing::info!(
            dir = %dir.display(),
            "no plugin manifests, registering builtin capabilities"
        );
        manifests = catalog.default_manifests();
    }

    let (capabilities, more) = catalog.instantiate(&manifests);
    diagnostics.extend(more);

    let (registry, more) = Registry::load(capabilities);
    diagnostics.extend(more);

    Ok(LoadedPlugins {
        dir,
        registry,
        diagnostics,
    })
}

/// A bound gateway, ready to serve
#[derive(Debug)]
pub struct Gateway {
    reactor: Reactor,
    addr: SocketAddr,
}

impl Gateway {
    /// Load plugins from disk and bind the configured address
    ///
    /// Load diagnostics are logged; they never stop the boot.
    ///
    /// # Errors
    ///
    /// Returns error if the plugin folder cannot be resolved or the socket
    /// cannot be bound
    pub async fn boot(config: &Config, root: &Path) -> Result<Self> {
        let loaded = load_plugins(config, root, &Catalog::builtin())?;

        for msg in &loaded.diagnostics {
            tracing::warn!(dir = %loaded.dir.display(), "{msg}");
        }
        tracing::info!(verbs = ?loaded.registry.verbs(), "plugins loaded");

        Self::bind(config, loaded.registry).await
    }

    /// Bind the configured address with an already loaded registry
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the socket cannot be bound
    pub async fn bind(config: &Config, registry: Registry) -> Result<Self> {
        let requested = config.bind_addr();
        let socket = UdpSocket::bind(requested)
            .await
            .map_err(|source| Error::Bind {
                addr: requested,
                source,
            })?;
        let addr = socket.local_addr()?;

        let dispatcher = Dispatcher::new(Arc::new(registry), Arc::new(config.sections.clone()));
        tracing::info!(%addr, "gateway bound");

        Ok(Self {
            reactor: Reactor::new(socket, dispatcher),
            addr,
        })
    }

    /// Address the gateway is serving on
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Serve until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the Ctrl-C handler cannot be installed
    pub async fn run(self) -> Result<()> {
        let mut signal_error = None;
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                signal_error = Some(e);
            }
        })
        .await;

        signal_error.map_or(Ok(()), |e| Err(Error::Io(e)))
    }

    /// Serve until `shutdown` resolves
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.reactor.run(shutdown).await;
    }
}
