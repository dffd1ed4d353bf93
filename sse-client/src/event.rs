//! Shared data types for frames, dispatch metadata, and observable state.

use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, SystemTime};

/// Single authoritative connection state. Exactly one session is active
/// at a time; callers observe transitions through this enum rather than
/// a set of independent booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Retry budget exhausted. Requires `force_reconnect` or a network
    /// restore event to leave.
    Failed,
}

/// One self-contained SSE record, delimited by a blank line on the wire.
/// Transient: constructed per frame boundary and discarded after dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SseFrame {
    /// Event type from the `event:` field, `"message"` when absent.
    pub event_type: String,
    /// Identifier from the `id:` field, used to advance the resume cursor.
    pub id: Option<String>,
    /// Payload from one or more `data:` fields, newline-joined.
    pub data: String,
}

/// Metadata delivered alongside each application message payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageMeta {
    /// The routed type discriminator (payload `type` field when present,
    /// otherwise the frame's event type).
    pub event_type: String,
    pub id: Option<String>,
}

/// An already-dispatched application message retained in the bounded
/// in-memory buffer, most-recent-last.
#[derive(Debug, Clone, Serialize)]
pub struct BufferedEvent {
    pub data: Value,
    pub id: Option<String>,
    pub timestamp: SystemTime,
    pub event_type: String,
    pub size_bytes: usize,
}

/// Progress of a server-driven bulk replay phase, bounded by explicit
/// `replay_start` / `replay_end` control frames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayProgress {
    pub current: u64,
    pub total: u64,
    pub is_replaying: bool,
    /// Time since the `replay_start` frame was dispatched.
    pub elapsed: Duration,
    /// `(total - current) / rate`, `None` when the rate is zero or the
    /// estimate would be non-positive.
    pub estimated_remaining: Option<Duration>,
}

/// Process-wide connectivity snapshot, updated by the injected external
/// state provider and consulted by the reconnection policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkStatus {
    pub is_online: bool,
    pub last_online_at: Option<SystemTime>,
    /// Current outage duration while offline, or the length of the most
    /// recent outage once connectivity returns.
    pub downtime: Duration,
}
