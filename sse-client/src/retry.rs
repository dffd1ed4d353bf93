//! Error classification and backoff computation for the reconnection
//! policy. Pure functions; scheduling lives with the session.

use crate::config::BackoffTables;
use crate::error::{ErrorClass, ErrorKind};
use rand::Rng;
use std::time::Duration;

/// Uniform jitter added to online delays so a fleet of clients does not
/// retry in lockstep.
const JITTER_MS: u64 = 1000;

/// Map an error kind to its retry class. First match wins: being offline
/// overrides whatever the failure looked like.
pub(crate) fn classify(kind: ErrorKind, online: bool) -> ErrorClass {
    if !online {
        return ErrorClass::Network;
    }
    match kind {
        ErrorKind::Offline => ErrorClass::Network,
        ErrorKind::Http(401) | ErrorKind::Http(403) => ErrorClass::Auth,
        ErrorKind::Http(status) if status >= 500 => ErrorClass::Server,
        ErrorKind::Transport | ErrorKind::StreamEnded => ErrorClass::Network,
        ErrorKind::Http(_) | ErrorKind::ServerReported | ErrorKind::Config => ErrorClass::Default,
    }
}

/// Delay before retry `attempt` (1-based): exponential growth capped at
/// the class maximum, doubled while offline, jittered while online.
pub(crate) fn compute_delay(
    tables: &BackoffTables,
    class: ErrorClass,
    attempt: u32,
    offline: bool,
) -> Duration {
    let backoff = tables.for_class(class);
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    let raw = backoff.base.as_millis() as f64 * backoff.multiplier.powi(exponent);
    let mut ms = raw.min(backoff.max.as_millis() as f64) as u64;
    if offline {
        ms *= 2;
    } else {
        ms += rand::thread_rng().gen_range(0..JITTER_MS);
    }
    Duration::from_millis(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backoff;

    #[test]
    fn offline_overrides_every_other_class() {
        assert_eq!(classify(ErrorKind::Http(500), false), ErrorClass::Network);
        assert_eq!(classify(ErrorKind::Http(401), false), ErrorClass::Network);
    }

    #[test]
    fn classifies_http_statuses() {
        assert_eq!(classify(ErrorKind::Http(401), true), ErrorClass::Auth);
        assert_eq!(classify(ErrorKind::Http(403), true), ErrorClass::Auth);
        assert_eq!(classify(ErrorKind::Http(500), true), ErrorClass::Server);
        assert_eq!(classify(ErrorKind::Http(503), true), ErrorClass::Server);
        assert_eq!(classify(ErrorKind::Http(404), true), ErrorClass::Default);
    }

    #[test]
    fn transport_and_stream_end_are_network() {
        assert_eq!(classify(ErrorKind::Transport, true), ErrorClass::Network);
        assert_eq!(classify(ErrorKind::StreamEnded, true), ErrorClass::Network);
    }

    #[test]
    fn server_delay_lies_within_jitter_window() {
        let tables = BackoffTables::default();
        let base = tables.server.base.as_millis() as u64;
        let multiplier = tables.server.multiplier;

        for attempt in 1..=4u32 {
            let expected = (base as f64 * multiplier.powi(attempt as i32 - 1)) as u64;
            for _ in 0..50 {
                let delay =
                    compute_delay(&tables, ErrorClass::Server, attempt, false).as_millis() as u64;
                assert!(
                    (expected..expected + JITTER_MS).contains(&delay),
                    "attempt {attempt}: {delay} outside [{expected}, {})",
                    expected + JITTER_MS
                );
            }
        }
    }

    #[test]
    fn delay_is_capped_at_class_max() {
        let tables = BackoffTables {
            server: Backoff {
                base: Duration::from_millis(100),
                max: Duration::from_millis(400),
                multiplier: 2.0,
            },
            ..BackoffTables::default()
        };
        // Attempt 10 would be 51_200ms uncapped; offline avoids jitter.
        let delay = compute_delay(&tables, ErrorClass::Server, 10, true);
        assert_eq!(delay, Duration::from_millis(800));
    }

    #[test]
    fn offline_doubles_and_skips_jitter() {
        let tables = BackoffTables::default();
        let base = tables.network.base.as_millis() as u64;
        let delay = compute_delay(&tables, ErrorClass::Network, 1, true);
        assert_eq!(delay, Duration::from_millis(base * 2));
    }
}
