//! Network and tab-visibility monitoring.
//!
//! Connectivity and visibility are global browser/OS facts the core
//! cannot observe portably, so they arrive through an injected
//! [`ExternalStateProvider`]. Production embeds wire up the real
//! signals; tests use [`ManualStateProvider`] and flip them by hand.

use crate::session::Inner;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Settle delay after connectivity returns before reconnecting, so a
/// flapping link does not trigger a burst of attempts.
pub(crate) const NETWORK_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Debounce for visibility transitions, coalescing rapid tab toggles.
pub(crate) const VISIBILITY_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabVisibility {
    Visible,
    Hidden,
}

/// Source of connectivity and visibility signals. `is_online` answers
/// point-in-time queries; the `watch` channels deliver transitions.
pub trait ExternalStateProvider: Send + Sync {
    fn is_online(&self) -> bool;
    fn online_changes(&self) -> watch::Receiver<bool>;
    fn visibility_changes(&self) -> watch::Receiver<TabVisibility>;
}

/// Default provider: always online, always visible, never changes.
pub struct AlwaysOnline {
    online: watch::Sender<bool>,
    visibility: watch::Sender<TabVisibility>,
}

impl AlwaysOnline {
    pub fn new() -> Self {
        Self {
            online: watch::channel(true).0,
            visibility: watch::channel(TabVisibility::Visible).0,
        }
    }
}

impl Default for AlwaysOnline {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalStateProvider for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }

    fn online_changes(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    fn visibility_changes(&self) -> watch::Receiver<TabVisibility> {
        self.visibility.subscribe()
    }
}

/// Provider driven by explicit calls. Intended for tests and embeds that
/// forward platform events themselves.
pub struct ManualStateProvider {
    online: watch::Sender<bool>,
    visibility: watch::Sender<TabVisibility>,
}

impl ManualStateProvider {
    pub fn new(online: bool) -> Self {
        Self {
            online: watch::channel(online).0,
            visibility: watch::channel(TabVisibility::Visible).0,
        }
    }

    pub fn set_online(&self, online: bool) {
        let _ = self.online.send(online);
    }

    pub fn set_visibility(&self, visibility: TabVisibility) {
        let _ = self.visibility.send(visibility);
    }
}

impl ExternalStateProvider for ManualStateProvider {
    fn is_online(&self) -> bool {
        *self.online.borrow()
    }

    fn online_changes(&self) -> watch::Receiver<bool> {
        self.online.subscribe()
    }

    fn visibility_changes(&self) -> watch::Receiver<TabVisibility> {
        self.visibility.subscribe()
    }
}

/// Long-lived task watching provider transitions. Holds only a weak
/// reference to the client so it never keeps a dropped client alive.
///
/// Visibility changes arm a debounce deadline instead of sleeping in
/// place; connectivity edges keep being handled while the window is
/// open, and rapid toggles coalesce into whatever value holds when the
/// deadline fires.
pub(crate) async fn run_monitor(inner: Weak<Inner>, provider: Arc<dyn ExternalStateProvider>) {
    let mut online_rx = provider.online_changes();
    let mut visibility_rx = provider.visibility_changes();
    let mut visibility_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            changed = online_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let online = *online_rx.borrow_and_update();
                let Some(inner) = inner.upgrade() else { return };
                if online {
                    inner.handle_network_restore().await;
                } else {
                    inner.handle_network_lost();
                }
            }
            changed = visibility_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let _ = visibility_rx.borrow_and_update();
                visibility_deadline = Some(Instant::now() + VISIBILITY_DEBOUNCE);
            }
            _ = tokio::time::sleep_until(visibility_deadline.unwrap_or_else(Instant::now)),
                if visibility_deadline.is_some() =>
            {
                visibility_deadline = None;
                let visibility = *visibility_rx.borrow();
                let Some(inner) = inner.upgrade() else { return };
                inner.handle_visibility(visibility).await;
            }
        }
    }
}
