//! Worker dispatch: runs one plugin invocation per request off the reactor
//!
//! Every accepted request resolves to exactly one [`Completion`], whatever
//! the plugin does. Failures, faults and panics are absorbed here and never
//! reach the reactor or other requests.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::plugins::{Outcome, PluginSections, Registry};
use crate::protocol::{Completion, Identity, Reply, Request};

/// Detail used when a plugin fails without saying why
pub const MISSING_DETAIL: &str = "handler reported failure without detail";

/// Detail used when a plugin faults with an empty message
pub const FAULT_WITHOUT_MESSAGE: &str = "handler fault without message";

/// Sending half of the loopback channel
pub type LoopbackSender = mpsc::UnboundedSender<Completion>;

/// Routes requests to plugins and maps their outcome to a reply
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    sections: Arc<PluginSections>,
}

impl Dispatcher {
    /// Create a dispatcher over a loaded registry and the verb sections
    #[must_use]
    pub const fn new(registry: Arc<Registry>, sections: Arc<PluginSections>) -> Self {
        Self { registry, sections }
    }

    /// Registry requests are routed through
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run `raw` on a fresh task and post its completion to `loopback`
    #[must_use]
    pub fn spawn(
        &self,
        identity: Identity,
        raw: String,
        loopback: LoopbackSender,
    ) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let (reply, detail) = dispatcher.handle(&raw).await;
            let completion = Completion {
                identity,
                reply,
                detail,
            };
            if loopback.send(completion).is_err() {
                tracing::debug!(%identity, "reactor stopped, dropping reply");
            }
        })
    }

    /// Resolve one raw request to a reply and an optional failure detail
    pub async fn handle(&self, raw: &str) -> (Reply, Option<String>) {
        let request = match Request::parse(raw) {
            Ok(request) => request,
            Err(e) => {
                tracing::info!(request = raw.trim(), "{e}");
                return (Reply::Poor, None);
            }
        };

        let Some(plugin) = self.registry.get(&request.verb) else {
            tracing::debug!(verb = %request.verb, "plugin not found");
            return (Reply::Miss, None);
        };

        tracing::debug!(verb = %request.verb, request = raw.trim(), "processing request");

        let config = self.sections.get(&request.verb);
        let result = AssertUnwindSafe(plugin.run(config, &request.args))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(outcome)) => resolve(raw.trim(), &request.verb, outcome),
            Ok(Err(fault)) => {
                let mut message = format!("{fault:#}");
                if message.trim().is_empty() {
                    message = FAULT_WITHOUT_MESSAGE.to_string();
                }
                tracing::error!(
                    verb = %request.verb,
                    "{}: {message}",
                    raw.trim()
                );
                (Reply::Fail, Some(message))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    verb = %request.verb,
                    "{}: handler panicked: {message}",
                    raw.trim()
                );
                (Reply::Fail, Some(message))
            }
        }
    }
}

/// Map a plugin outcome to a reply, tolerating contract violations
fn resolve(raw: &str, verb: &str, outcome: Outcome) -> (Reply, Option<String>) {
    match (outcome.success, outcome.detail) {
        (true, None) => {
            tracing::debug!(verb, request = raw, "request succeeded");
            (Reply::Good, None)
        }
        (true, Some(detail)) => {
            tracing::warn!(
                verb,
                %detail,
                "plugin reported success with a detail, ignoring detail"
            );
            (Reply::Good, None)
        }
        (false, Some(detail)) if !detail.is_empty() => {
            tracing::warn!(verb, "{raw}: {detail}");
            (Reply::Fail, Some(detail))
        }
        (false, _) => {
            tracing::warn!(verb, "{raw}: {MISSING_DETAIL}");
            (Reply::Fail, Some(MISSING_DETAIL.to_string()))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string())
}
