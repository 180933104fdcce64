use std::fmt;
use thiserror::Error;

/// The last thing that went wrong talking to an upstream endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamFailure {
    /// HTTP 429 from the upstream.
    RateLimited,
    /// Any other non-success HTTP status.
    Status(u16),
    /// The request never produced a response (DNS, TLS, connect, timeout, body read).
    Transport(String),
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamFailure::RateLimited => write!(f, "HTTP error! status: 429"),
            UpstreamFailure::Status(code) => write!(f, "HTTP error! status: {code}"),
            UpstreamFailure::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum MarketError {
    #[error("Unknown index: {0}")]
    UnknownIndex(String),

    #[error("Unknown range: {0} (expected one of 1d, 1mo, 3mo, 1y, 5y, max)")]
    UnknownRange(String),

    #[error("{what}: {last_error}")]
    Upstream {
        what: String,
        last_error: UpstreamFailure,
    },

    #[error("{what}: malformed upstream data: {reason}")]
    MalformedUpstreamData { what: String, reason: String },
}

impl MarketError {
    pub(crate) fn upstream(what: impl Into<String>, last_error: UpstreamFailure) -> Self {
        Self::Upstream {
            what: what.into(),
            last_error,
        }
    }

    pub(crate) fn malformed(what: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::MalformedUpstreamData {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
