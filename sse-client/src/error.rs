//! Error types for the `sse-client` crate.
//!
//! A root `Error` struct holds an error kind plus an optional source for
//! error chaining. Connection-level failures are grouped into coarse
//! classes that drive the reconnection policy; intentional cancellation
//! is not an error and never constructs one of these.

use std::error::Error as StdError;
use std::fmt;

/// Top-level error type for stream consumption.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub kind: ErrorKind,
}

/// What went wrong, at the granularity the retry policy cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The external state provider reports no connectivity.
    Offline,
    /// Transport-level failure (DNS, TCP, TLS, timeout, mid-stream read error).
    Transport,
    /// Non-success HTTP response status.
    Http(u16),
    /// The server closed the stream without an explicit disconnect on our side.
    StreamEnded,
    /// An in-band `error` control frame from the server. Surfaced to the
    /// caller without tearing down the connection.
    ServerReported,
    /// The client is not usable as configured: no stream URL, or the
    /// underlying HTTP client could not be built.
    Config,
}

/// Retry classification. Each class has its own backoff table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Network,
    Auth,
    Server,
    Default,
}

impl Error {
    pub fn offline() -> Self {
        Self {
            source: None,
            kind: ErrorKind::Offline,
        }
    }

    pub fn transport(source: reqwest::Error) -> Self {
        Self {
            source: Some(Box::new(source)),
            kind: ErrorKind::Transport,
        }
    }

    pub fn http(status: u16) -> Self {
        Self {
            source: None,
            kind: ErrorKind::Http(status),
        }
    }

    pub fn stream_ended() -> Self {
        Self {
            source: None,
            kind: ErrorKind::StreamEnded,
        }
    }

    pub fn server_reported(message: String) -> Self {
        Self {
            source: Some(message.into()),
            kind: ErrorKind::ServerReported,
        }
    }

    pub fn config() -> Self {
        Self {
            source: None,
            kind: ErrorKind::Config,
        }
    }

    pub fn http_client(source: reqwest::Error) -> Self {
        Self {
            source: Some(Box::new(source)),
            kind: ErrorKind::Config,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::Offline => write!(f, "network is offline")?,
            ErrorKind::Transport => write!(f, "transport error")?,
            ErrorKind::Http(status) => write!(f, "unexpected HTTP status {status}")?,
            ErrorKind::StreamEnded => write!(f, "server ended the stream unexpectedly")?,
            ErrorKind::ServerReported => write!(f, "server-reported error")?,
            ErrorKind::Config => write!(f, "invalid client configuration")?,
        }
        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn StdError + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_http_status() {
        let err = Error::http(503);
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn config_errors_share_a_kind() {
        assert_eq!(Error::config().kind, ErrorKind::Config);
        assert!(Error::config().to_string().contains("configuration"));
    }

    #[test]
    fn stream_end_is_distinct_from_transport() {
        assert_ne!(Error::stream_ended().kind, Error::offline().kind);
        assert_ne!(Error::stream_ended().kind, ErrorKind::Transport);
    }
}
