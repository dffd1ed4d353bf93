//! Observational counters. Never consulted for correctness decisions.

use serde::Serialize;
use std::time::Duration;

/// Running counters kept by the dispatcher. Recording is skipped
/// entirely when metrics are disabled in the configuration.
#[derive(Debug, Default)]
pub(crate) struct Metrics {
    pub total_events: u64,
    pub total_reconnects: u64,
    pub total_errors: u64,
    /// Cumulative moving average of application payload size in bytes.
    pub avg_event_size: f64,
}

impl Metrics {
    pub fn record_event(&mut self, size_bytes: usize) {
        self.total_events += 1;
        let n = self.total_events as f64;
        self.avg_event_size += (size_bytes as f64 - self.avg_event_size) / n;
    }

    pub fn snapshot(&self, uptime: Option<Duration>) -> MetricsSnapshot {
        MetricsSnapshot {
            total_events: self.total_events,
            total_reconnects: self.total_reconnects,
            total_errors: self.total_errors,
            avg_event_size: self.avg_event_size,
            uptime,
        }
    }
}

/// Point-in-time copy of the counters, handed out to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total_events: u64,
    pub total_reconnects: u64,
    pub total_errors: u64,
    pub avg_event_size: f64,
    /// Time since the current session connected, `None` while down.
    pub uptime: Option<Duration>,
}
