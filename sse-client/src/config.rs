//! Client configuration and the caller-facing callback surface.
//!
//! All tuning knobs and callback slots live in one immutable
//! [`ClientConfig`] passed at construction. The client holds the config
//! behind a swappable reference and reads it fresh on each use, so
//! replacing it with [`crate::Client::update_config`] takes effect on
//! the next frame or reconnect without re-capturing anything.

use crate::error::{Error, ErrorClass};
use crate::event::{MessageMeta, ReplayProgress};
use crate::monitor::{AlwaysOnline, ExternalStateProvider};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Whether the streaming request carries ambient credentials. Token
/// issuance and refresh belong to an external collaborator; the client
/// only attaches what it is given and reacts to 401/403.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialsMode {
    /// Use a cookie store shared across requests (session-cookie auth).
    Include,
    /// Send no ambient credentials.
    #[default]
    Omit,
}

/// One backoff curve: `delay = min(base * multiplier^(attempt-1), max)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    pub multiplier: f64,
}

/// Per-error-class backoff tables consulted by the reconnection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffTables {
    pub network: Backoff,
    pub auth: Backoff,
    pub server: Backoff,
    pub default: Backoff,
}

impl BackoffTables {
    pub fn for_class(&self, class: ErrorClass) -> &Backoff {
        match class {
            ErrorClass::Network => &self.network,
            ErrorClass::Auth => &self.auth,
            ErrorClass::Server => &self.server,
            ErrorClass::Default => &self.default,
        }
    }
}

impl Default for BackoffTables {
    fn default() -> Self {
        Self {
            network: Backoff {
                base: Duration::from_secs(1),
                max: Duration::from_secs(30),
                multiplier: 1.5,
            },
            auth: Backoff {
                base: Duration::from_secs(5),
                max: Duration::from_secs(60),
                multiplier: 2.0,
            },
            server: Backoff {
                base: Duration::from_secs(2),
                max: Duration::from_secs(60),
                multiplier: 2.0,
            },
            default: Backoff {
                base: Duration::from_secs(1),
                max: Duration::from_secs(30),
                multiplier: 2.0,
            },
        }
    }
}

/// Per-call options for `connect`. Headers given here override both the
/// built-in defaults and the config-level headers.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub headers: Vec<(String, String)>,
}

/// Full client configuration. Construct with struct-update syntax over
/// [`ClientConfig::default`].
#[derive(Clone)]
pub struct ClientConfig {
    /// Stream endpoint. `connect` is rejected while this is `None`.
    pub url: Option<String>,
    /// Extra request headers, applied after the built-in defaults.
    pub headers: Vec<(String, String)>,
    /// Automatic reconnection on failure.
    pub reconnect: bool,
    /// Retry budget before the client parks in `Failed`.
    pub max_reconnect_attempts: u32,
    pub backoff: BackoffTables,
    /// Expected server heartbeat cadence. `Some` enables the watchdog,
    /// which flags a gap of more than twice this interval.
    pub heartbeat_interval: Option<Duration>,
    /// Event buffer capacity. Overflow trims the front back to ~80%.
    pub buffer_limit: usize,
    pub metrics: bool,
    pub credentials: CredentialsMode,
    /// Opt-in: disconnect when the tab hides, reconnect when it shows.
    pub visibility_policy: bool,
    /// Advisory replay page size sent as a request header.
    pub replay_page_size: Option<u32>,
    pub observer: Arc<dyn StreamObserver>,
    /// Connectivity/visibility source. Fixed at construction; swapping
    /// the config does not rewire an already-running monitor.
    pub provider: Arc<dyn ExternalStateProvider>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: None,
            headers: Vec::new(),
            reconnect: true,
            max_reconnect_attempts: 10,
            backoff: BackoffTables::default(),
            heartbeat_interval: None,
            buffer_limit: 500,
            metrics: true,
            credentials: CredentialsMode::default(),
            visibility_policy: false,
            replay_page_size: None,
            observer: Arc::new(NoopObserver),
            provider: Arc::new(AlwaysOnline::new()),
        }
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("url", &self.url)
            .field("reconnect", &self.reconnect)
            .field("max_reconnect_attempts", &self.max_reconnect_attempts)
            .field("heartbeat_interval", &self.heartbeat_interval)
            .field("buffer_limit", &self.buffer_limit)
            .field("metrics", &self.metrics)
            .field("credentials", &self.credentials)
            .field("visibility_policy", &self.visibility_policy)
            .field("replay_page_size", &self.replay_page_size)
            .finish_non_exhaustive()
    }
}

/// Caller-facing callback slots. Every method has a no-op default, so
/// implementors override only what they consume. Callbacks fire from the
/// client's own tasks; keep them quick and non-blocking.
pub trait StreamObserver: Send + Sync {
    /// Stream opened. `resumed` is true when a `Last-Event-ID` cursor
    /// was sent with the request.
    fn on_open(&self, resumed: bool) {
        let _ = resumed;
    }

    /// Application message, already JSON-decoded when possible.
    fn on_message(&self, payload: &Value, meta: &MessageMeta) {
        let _ = (payload, meta);
    }

    /// A frame payload failed JSON decoding; it was still delivered as a
    /// raw string through `on_message`.
    fn on_parse_error(&self, raw: &str, error: &serde_json::Error) {
        let _ = (raw, error);
    }

    /// Connection-level error or a server-reported `error` frame.
    fn on_error(&self, error: &Error, class: ErrorClass, attempt: u32, max_attempts: u32) {
        let _ = (error, class, attempt, max_attempts);
    }

    /// Session closed deliberately. `reason` is `"manual"` for explicit
    /// disconnects and `"hidden"` for the visibility policy.
    fn on_close(&self, reason: &str, uptime: Duration) {
        let _ = (reason, uptime);
    }

    fn on_replay_start(&self, total: u64) {
        let _ = total;
    }

    fn on_replay_progress(&self, progress: &ReplayProgress) {
        let _ = progress;
    }

    fn on_replay_end(&self) {}

    fn on_heartbeat(&self) {}

    /// No heartbeat for more than twice the configured interval.
    fn on_heartbeat_missed(&self, gap: Duration) {
        let _ = gap;
    }

    /// A retry has been scheduled to fire after `delay`.
    fn on_reconnect_attempt(&self, attempt: u32, max_attempts: u32, delay: Duration) {
        let _ = (attempt, max_attempts, delay);
    }

    /// The retry budget is exhausted; the client is parked in `Failed`.
    fn on_reconnect_failed(&self, attempts: u32) {
        let _ = attempts;
    }

    fn on_network_lost(&self) {}

    fn on_network_restore(&self, downtime: Duration) {
        let _ = downtime;
    }

    /// `connect` was called while a session was already live.
    fn on_duplicate_connection(&self) {}

    /// The server sent a `retry:` interval hint. Advisory only.
    fn on_retry_interval_update(&self, interval: Duration) {
        let _ = interval;
    }
}

/// Observer that drops every notification.
pub struct NoopObserver;

impl StreamObserver for NoopObserver {}
