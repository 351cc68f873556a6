//! Shared test utilities

#![allow(dead_code)]

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ccgateway::plugins::PluginSections;
use ccgateway::{Config, Gateway, Outcome, Plugin, PluginConfig, Registry};
use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::subscriber::DefaultGuard;

/// How long a test client waits for a reply
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// Gateway serving on an ephemeral loopback port
pub struct TestGateway {
    pub addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestGateway {
    /// Stop the reactor and wait for it to return
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(REPLY_TIMEOUT, &mut self.handle)
            .await
            .expect("reactor did not stop")
            .expect("reactor panicked");
    }
}

/// Config binding an ephemeral loopback port
#[must_use]
pub fn loopback_config(sections: PluginSections) -> Config {
    Config {
        bind_ip: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        sections,
        ..Config::default()
    }
}

/// Start a gateway serving the given plugins
pub async fn start_gateway(plugins: Vec<Arc<dyn Plugin>>, sections: PluginSections) -> TestGateway {
    let (registry, _) = Registry::load(plugins);
    let gateway = Gateway::bind(&loopback_config(sections), registry)
        .await
        .expect("failed to bind test gateway");
    let addr = gateway.local_addr();

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(gateway.run_until(async {
        let _ = rx.await;
    }));

    TestGateway {
        addr,
        shutdown: Some(tx),
        handle,
    }
}

/// Client socket on an ephemeral loopback port
pub async fn client() -> UdpSocket {
    UdpSocket::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("failed to bind client socket")
}

/// Receive one reply frame
pub async fn recv_reply(socket: &UdpSocket) -> String {
    let mut buf = [0_u8; 64];
    let (len, _) = tokio::time::timeout(REPLY_TIMEOUT, socket.recv_from(&mut buf))
        .await
        .expect("timed out waiting for reply")
        .expect("failed to receive reply");
    String::from_utf8(buf[..len].to_vec()).expect("reply is not utf-8")
}

/// Send one frame from a fresh client and wait for the reply
pub async fn request(addr: SocketAddr, frame: &str) -> String {
    let socket = client().await;
    socket
        .send_to(frame.as_bytes(), addr)
        .await
        .expect("failed to send request");
    recv_reply(&socket).await
}

/// Sleeps, then succeeds or fails with a tag
///
/// Args: `<ms> <good|fail> [tag]`
pub struct DelayPlugin;

#[async_trait]
impl Plugin for DelayPlugin {
    fn verb(&self) -> &str {
        "delay"
    }

    async fn run(&self, _config: &PluginConfig, args: &[String]) -> anyhow::Result<Outcome> {
        let millis: u64 = args[0].parse()?;
        tokio::time::sleep(Duration::from_millis(millis)).await;

        match args.get(1).map(String::as_str) {
            Some("good") => Ok(Outcome::success()),
            _ => Ok(Outcome::failure(
                args.get(2).cloned().unwrap_or_else(|| "untagged".to_string()),
            )),
        }
    }
}

/// Log output captured by [`capture_logs`]
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Lines logged at `level` (e.g. "WARN")
    #[must_use]
    pub fn at(&self, level: &str) -> Vec<String> {
        self.text()
            .lines()
            .filter(|line| line.split_whitespace().next() == Some(level))
            .map(ToString::to_string)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Route this thread's log events into a buffer until the guard drops
#[must_use]
pub fn capture_logs() -> (CapturedLogs, DefaultGuard) {
    let captured = CapturedLogs::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::TRACE)
        .finish();

    (captured, tracing::subscriber::set_default(subscriber))
}
