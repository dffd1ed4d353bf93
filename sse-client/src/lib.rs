//! Resumable Server-Sent-Events consumption.
//!
//! This crate owns the hard part of talking to an SSE endpoint: a
//! long-lived streaming HTTP connection, incremental parsing of the
//! line-oriented frame format, a resume cursor sent back as
//! `Last-Event-ID` on reconnect, failure classification with per-class
//! backoff and jitter, a heartbeat watchdog, and network/visibility
//! awareness through an injected state provider.
//!
//! Callers construct a [`Client`] with a [`config::ClientConfig`] whose
//! observer slots receive every lifecycle notification, then drive it
//! with `connect` / `disconnect` / `force_reconnect`:
//!
//! ```rust,no_run
//! use sse_client::{Client, ClientConfig, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! let client = Client::new(ClientConfig {
//!     url: Some("http://localhost:4747/events".to_owned()),
//!     ..ClientConfig::default()
//! })?;
//! if let Err(err) = client.connect(None).await {
//!     eprintln!("initial connect failed: {err}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod monitor;
pub mod parser;

mod dispatch;
mod retry;
mod session;

pub use config::{
    Backoff, BackoffTables, ClientConfig, ConnectOptions, CredentialsMode, NoopObserver,
    StreamObserver,
};
pub use error::{Error, ErrorClass, ErrorKind};
pub use event::{
    BufferedEvent, ConnectionState, MessageMeta, NetworkStatus, ReplayProgress, SseFrame,
};
pub use metrics::MetricsSnapshot;
pub use monitor::{AlwaysOnline, ExternalStateProvider, ManualStateProvider, TabVisibility};
pub use session::Client;
