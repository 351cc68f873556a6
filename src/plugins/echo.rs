//! Diagnostic capability for probing a running gateway
//!
//! | args                   | outcome                              |
//! |------------------------|--------------------------------------|
//! | `bad`                  | failure `bad command`                |
//! | `fail <words...>`      | failure with the words as the reason |
//! | `error <words...>`     | fault (`Err`)                        |
//! | `panic`                | panics                               |
//! | `sleep <ms> [...]`     | waits (at most 60 s), then succeeds  |
//! | anything else          | success                              |

use std::time::Duration;

use async_trait::async_trait;

use super::{Outcome, Plugin, PluginConfig};

/// Reason reported for `bad` and a bare `fail`
pub const BAD_COMMAND: &str = "bad command";

/// Longest `sleep` a client may request
pub const MAX_SLEEP: Duration = Duration::from_secs(60);

/// Diagnostic capability
#[derive(Debug, Clone)]
pub struct EchoPlugin {
    verb: String,
}

impl EchoPlugin {
    /// Bind the capability to a verb
    #[must_use]
    pub fn new(verb: &str) -> Self {
        Self {
            verb: verb.to_string(),
        }
    }
}

#[async_trait]
impl Plugin for EchoPlugin {
    fn verb(&self) -> &str {
        &self.verb
    }

    async fn run(&self, _config: &PluginConfig, args: &[String]) -> anyhow::Result<Outcome> {
        let Some((command, rest)) = args.split_first() else {
            return Ok(Outcome::failure(BAD_COMMAND));
        };

        match command.as_str() {
            "bad" => Ok(Outcome::failure(BAD_COMMAND)),
            "fail" if rest.is_empty() => Ok(Outcome::failure(BAD_COMMAND)),
            "fail" => Ok(Outcome::failure(rest.join(" "))),
            "error" => anyhow::bail!("{}", rest.join(" ")),
            "panic" => panic!("echo asked to panic"),
            "sleep" => {
                let millis: u64 = rest
                    .first()
                    .and_then(|ms| ms.parse().ok())
                    .ok_or_else(|| anyhow::anyhow!("sleep expects a duration in milliseconds"))?;
                let wait = Duration::from_millis(millis);
                if wait > MAX_SLEEP {
                    return Ok(Outcome::failure(format!(
                        "sleep is limited to {} ms",
                        MAX_SLEEP.as_millis()
                    )));
                }
                tokio::time::sleep(wait).await;
                Ok(Outcome::success())
            }
            _ => Ok(Outcome::success()),
        }
    }
}
