//! ccgateway - verb-routed verification gateway
//!
//! Clients send one text frame per request, `VERB ARG1 ... ARGn`, and get
//! back exactly one of `good`, `fail`, `miss` or `poor`. The verb selects a
//! verification plugin; plugins may take their time on remote calls without
//! holding up other requests.
//!
//! # Architecture
//!
//! ```text
//!  client ──frame──▶ ┌───────────┐  spawn   ┌────────────┐  run   ┌──────────┐
//!                    │  Reactor  │ ───────▶ │ Dispatcher │ ─────▶ │  Plugin  │
//!  client ◀──reply── │ (socket)  │ ◀─────── │  (worker)  │ ◀───── │          │
//!                    └───────────┘ loopback └────────────┘        └──────────┘
//! ```
//!
//! The reactor is the only task that touches the socket. Workers hand their
//! replies back over the loopback channel, tagged with the identity of the
//! client that sent the request.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gateway;
pub mod plugins;
pub mod protocol;
pub mod reactor;

pub use config::Config;
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use plugins::{Outcome, Plugin, PluginConfig, Registry};
pub use protocol::{Identity, Reply, Request};
pub use reactor::Reactor;
