//! Wire protocol: request frames, routing identities and reply literals
//!
//! A request is one UTF-8 text frame of whitespace-separated tokens,
//! `VERB ARG1 ... ARGn`. A reply is exactly one of four literals.

use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

/// Largest payload a single UDP datagram can carry
pub const MAX_FRAME_LEN: usize = 65_507;

/// Opaque routing handle attached by the transport when a frame arrives
///
/// The gateway never interprets it; it is only carried from the inbound
/// frame to the reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity(SocketAddr);

impl Identity {
    /// Wrap the peer address a frame arrived from
    #[must_use]
    pub const fn new(addr: SocketAddr) -> Self {
        Self(addr)
    }

    /// Address replies for this identity are sent to
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.0
    }
}

impl From<SocketAddr> for Identity {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Malformed request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Fewer than two tokens (a verb plus at least one argument)
    #[error("not enough parameters ({count} token(s))")]
    NotEnoughTokens {
        /// Number of tokens found
        count: usize,
    },
}

/// A tokenized request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Token 0, selects the handler
    pub verb: String,
    /// Tokens 1..N, passed verbatim to the handler
    pub args: Vec<String>,
}

impl Request {
    /// Tokenize a raw frame on whitespace
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NotEnoughTokens`] when the frame has fewer
    /// than two tokens
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let mut tokens = raw.split_whitespace().map(ToString::to_string);
        let verb = tokens.next();
        let args: Vec<String> = tokens.collect();

        match verb {
            Some(verb) if !args.is_empty() => Ok(Self { verb, args }),
            Some(_) => Err(ProtocolError::NotEnoughTokens { count: 1 }),
            None => Err(ProtocolError::NotEnoughTokens { count: 0 }),
        }
    }
}

/// Reply literal sent back to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reply {
    /// Handler ran and reported success
    Good,
    /// Handler reported failure or faulted
    Fail,
    /// No handler registered for the verb
    Miss,
    /// Malformed request
    Poor,
}

impl Reply {
    /// The literal written on the wire
    #[must_use]
    pub const fn as_wire(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fail => "fail",
            Self::Miss => "miss",
            Self::Poor => "poor",
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// A finished request travelling from a worker back to the reactor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Identity the request arrived from
    pub identity: Identity,
    /// Reply literal to send
    pub reply: Reply,
    /// Local diagnostic for `fail` replies, never put on the wire
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_verb_and_args() {
        let req = Request::parse("ethereum verify a b c").unwrap();
        assert_eq!(req.verb, "ethereum");
        assert_eq!(req.args, vec!["verify", "a", "b", "c"]);
    }

    #[test]
    fn parse_collapses_whitespace_and_newlines() {
        let req = Request::parse("  echo\tping \r\n").unwrap();
        assert_eq!(req.verb, "echo");
        assert_eq!(req.args, vec!["ping"]);
    }

    #[test]
    fn single_token_is_malformed() {
        assert_eq!(
            Request::parse("x"),
            Err(ProtocolError::NotEnoughTokens { count: 1 })
        );
    }

    #[test]
    fn empty_frame_is_malformed() {
        assert_eq!(
            Request::parse(" \n"),
            Err(ProtocolError::NotEnoughTokens { count: 0 })
        );
    }

    #[test]
    fn verbs_are_case_preserved() {
        let req = Request::parse("Echo ping").unwrap();
        assert_eq!(req.verb, "Echo");
    }

    #[test]
    fn wire_literals() {
        assert_eq!(Reply::Good.as_wire(), "good");
        assert_eq!(Reply::Fail.as_wire(), "fail");
        assert_eq!(Reply::Miss.as_wire(), "miss");
        assert_eq!(Reply::Poor.to_string(), "poor");
    }
}
