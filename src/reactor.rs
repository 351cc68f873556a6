//! Request reactor: sole owner of the client-facing socket
//!
//! The reactor waits on two sources, inbound datagrams and the loopback
//! channel. Inbound frames are handed to a worker immediately; completed
//! replies come back over the loopback channel and are written here, so
//! the socket is only ever touched from this task.

use std::future::Future;
use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::dispatch::{Dispatcher, LoopbackSender};
use crate::protocol::{Completion, Identity, MAX_FRAME_LEN};

/// Event loop owning the gateway socket
#[derive(Debug)]
pub struct Reactor {
    socket: UdpSocket,
    dispatcher: Dispatcher,
    loopback_tx: LoopbackSender,
    loopback_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Reactor {
    /// Take ownership of a bound socket
    #[must_use]
    pub fn new(socket: UdpSocket, dispatcher: Dispatcher) -> Self {
        let (loopback_tx, loopback_rx) = mpsc::unbounded_channel();
        Self {
            socket,
            dispatcher,
            loopback_tx,
            loopback_rx,
        }
    }

    /// Address the socket is bound to
    ///
    /// # Errors
    ///
    /// Returns error if the socket address cannot be read
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serve until `shutdown` resolves
    ///
    /// Workers still in flight when the loop stops are abandoned; their
    /// replies are dropped.
    pub async fn run<F>(mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut buf = vec![0_u8; MAX_FRAME_LEN];

        tracing::info!(addr = ?self.socket.local_addr().ok(), "reactor running");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        let identity = Identity::new(peer);
                        let raw = String::from_utf8_lossy(&buf[..len]).into_owned();
                        tracing::trace!(%identity, len, "received request");
                        drop(self.dispatcher.spawn(identity, raw, self.loopback_tx.clone()));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "receive failed");
                    }
                },
                Some(completion) = self.loopback_rx.recv() => {
                    deliver(&self.socket, completion).await;
                }
            }
        }
    }
}

/// Write one reply to the identity it belongs to
async fn deliver(socket: &UdpSocket, completion: Completion) {
    let Completion {
        identity, reply, ..
    } = completion;

    match socket
        .send_to(reply.as_wire().as_bytes(), identity.addr())
        .await
    {
        Ok(_) => tracing::trace!(%identity, %reply, "sent reply"),
        Err(e) => tracing::warn!(%identity, %reply, error = %e, "failed to send reply"),
    }
}
