//! Connection session lifecycle and the public [`Client`] handle.
//!
//! One session at a time owns the streaming request and its read loop.
//! Presence of the session handle doubles as the mutual-exclusion flag:
//! `connect` is a no-op while one exists. Every background task (read
//! loop, retry timer, heartbeat watchdog, monitor) holds only a weak
//! reference to the client and re-validates the live session id before
//! touching shared state, so a fired timer can never act on a session
//! that has since been replaced or closed.

use crate::config::{ClientConfig, ConnectOptions, CredentialsMode};
use crate::dispatch::{Dispatch, Dispatcher};
use crate::error::{Error, ErrorClass};
use crate::event::{BufferedEvent, ConnectionState, NetworkStatus, ReplayProgress, SseFrame};
use crate::metrics::MetricsSnapshot;
use crate::monitor::{self, TabVisibility, NETWORK_SETTLE_DELAY};
use crate::parser::{ParserItem, SseParser};
use crate::retry::{classify, compute_delay};
use futures_util::StreamExt;
use log::*;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CACHE_CONTROL, CONNECTION};
use serde_json::Value;
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Pause between the teardown and reconnect halves of `force_reconnect`.
const FORCE_RECONNECT_DELAY: Duration = Duration::from_millis(250);

/// Reconnect delay after a missed-heartbeat recovery. This path does not
/// consume the error-driven retry budget.
const HEARTBEAT_RECOVERY_DELAY: Duration = Duration::from_millis(500);

/// One in-flight streaming request. Dropping the cancel sender (or
/// flipping it) ends the read loop on its next poll.
struct SessionHandle {
    id: Uuid,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

struct Shared {
    state: ConnectionState,
    session: Option<SessionHandle>,
    retry_timer: Option<JoinHandle<()>>,
    heartbeat_task: Option<JoinHandle<()>>,
    attempts: u32,
    last_error: Option<(ErrorClass, String)>,
    connected_at: Option<Instant>,
    retry_hint: Option<Duration>,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            session: None,
            retry_timer: None,
            heartbeat_task: None,
            attempts: 0,
            last_error: None,
            connected_at: None,
            retry_hint: None,
        }
    }
}

struct NetworkState {
    is_online: bool,
    last_online_at: Option<SystemTime>,
    offline_since: Option<Instant>,
    last_downtime: Duration,
}

pub(crate) struct Inner {
    config: RwLock<Arc<ClientConfig>>,
    http: reqwest::Client,
    dispatch: Dispatcher,
    shared: Mutex<Shared>,
    network: Mutex<NetworkState>,
    monitor_task: Mutex<Option<JoinHandle<()>>>,
}

/// Handle to one resumable SSE consumer. Cheap to clone; every clone
/// shares the same session, cursor, buffer, and configuration.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Create a client and start its network/visibility monitor task.
    /// Must be called from within a Tokio runtime. Fails when the
    /// underlying HTTP client cannot be built for the requested
    /// credentials mode.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let provider = config.provider.clone();
        let online = provider.is_online();
        let http = build_http(&config)?;
        let inner = Arc::new(Inner {
            config: RwLock::new(Arc::new(config)),
            http,
            dispatch: Dispatcher::new(),
            shared: Mutex::new(Shared::default()),
            network: Mutex::new(NetworkState {
                is_online: online,
                last_online_at: online.then(SystemTime::now),
                offline_since: (!online).then(Instant::now),
                last_downtime: Duration::ZERO,
            }),
            monitor_task: Mutex::new(None),
        });
        let monitor = tokio::spawn(monitor::run_monitor(Arc::downgrade(&inner), provider));
        *inner.monitor_task.lock().unwrap() = Some(monitor);
        Ok(Self { inner })
    }

    /// Open the stream. No-op (with an `on_duplicate_connection`
    /// notification) while a session is already live; rejected without a
    /// state change when offline or when no URL is configured.
    pub async fn connect(&self, options: Option<ConnectOptions>) -> Result<(), Error> {
        self.inner.do_connect(options, false).await
    }

    /// Abort the in-flight request and any pending timers, then notify
    /// `on_close("manual")`. Idempotent: a second call emits nothing.
    pub fn disconnect(&self) {
        self.inner.disconnect_with("manual");
    }

    /// Disconnect, reset the retry budget and error state, and reconnect
    /// after a short fixed delay. Recovers from conditions the automatic
    /// policy will not retry, such as a `Failed` state after a manual
    /// credential refresh.
    pub async fn force_reconnect(&self) -> Result<(), Error> {
        info!("force reconnect requested");
        self.inner.disconnect_with("manual");
        {
            let mut shared = self.inner.shared.lock().unwrap();
            shared.attempts = 0;
            shared.last_error = None;
        }
        tokio::time::sleep(FORCE_RECONNECT_DELAY).await;
        self.inner.do_connect(None, false).await
    }

    /// Replace the active configuration. Observer, backoff tables, and
    /// limits are read fresh on each use; the state provider stays the
    /// one given at construction.
    pub fn update_config(&self, config: Arc<ClientConfig>) {
        *self.inner.config.write().unwrap() = config;
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.shared.lock().unwrap().state
    }

    /// Id of the most recently dispatched frame that carried one. Sent
    /// back as `Last-Event-ID` on the next connect.
    pub fn cursor(&self) -> Option<String> {
        self.inner.dispatch.cursor()
    }

    pub fn latest_event(&self) -> Option<Value> {
        self.inner.dispatch.latest()
    }

    pub fn replay_progress(&self) -> Option<ReplayProgress> {
        self.inner.dispatch.replay_progress()
    }

    pub fn network_status(&self) -> NetworkStatus {
        self.inner.network_status()
    }

    pub fn last_error(&self) -> Option<(ErrorClass, String)> {
        self.inner.shared.lock().unwrap().last_error.clone()
    }

    pub fn event_buffer(&self) -> Vec<BufferedEvent> {
        self.inner.dispatch.buffer_snapshot()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        let uptime = self
            .inner
            .shared
            .lock()
            .unwrap()
            .connected_at
            .map(|t| t.elapsed());
        self.inner.dispatch.metrics_snapshot(uptime)
    }

    /// Most recent advisory `retry:` interval from the server, if any.
    pub fn retry_interval_hint(&self) -> Option<Duration> {
        self.inner.shared.lock().unwrap().retry_hint
    }
}

impl Inner {
    fn config(&self) -> Arc<ClientConfig> {
        self.config.read().unwrap().clone()
    }

    fn is_online(&self) -> bool {
        self.network.lock().unwrap().is_online
    }

    pub(crate) async fn do_connect(
        self: &Arc<Self>,
        options: Option<ConnectOptions>,
        reconnecting: bool,
    ) -> Result<(), Error> {
        let config = self.config();

        enum Reject {
            Duplicate,
            Offline(u32),
            NoUrl(u32),
        }

        let url = config.url.clone();
        let setup = {
            let mut shared = self.shared.lock().unwrap();
            if shared.session.is_some() {
                Err(Reject::Duplicate)
            } else if !self.is_online() {
                Err(Reject::Offline(shared.attempts))
            } else if let Some(url) = url {
                let (cancel_tx, cancel_rx) = watch::channel(false);
                let session_id = Uuid::new_v4();
                shared.session = Some(SessionHandle {
                    id: session_id,
                    cancel: cancel_tx,
                    task: None,
                });
                shared.state = if reconnecting {
                    ConnectionState::Reconnecting
                } else {
                    ConnectionState::Connecting
                };
                Ok((session_id, cancel_rx, url))
            } else {
                Err(Reject::NoUrl(shared.attempts))
            }
        };

        let (session_id, mut cancel_rx, url) = match setup {
            Ok(setup) => setup,
            Err(Reject::Duplicate) => {
                debug!("connect called while a session is live, ignoring");
                config.observer.on_duplicate_connection();
                return Ok(());
            }
            Err(Reject::Offline(attempts)) => {
                let err = Error::offline();
                config.observer.on_error(
                    &err,
                    ErrorClass::Network,
                    attempts,
                    config.max_reconnect_attempts,
                );
                return Err(err);
            }
            Err(Reject::NoUrl(attempts)) => {
                warn!("connect called without a configured stream URL");
                let err = Error::config();
                config.observer.on_error(
                    &err,
                    ErrorClass::Default,
                    attempts,
                    config.max_reconnect_attempts,
                );
                return Err(err);
            }
        };

        let cursor = self.dispatch.cursor();
        let resumed = cursor.is_some();
        let headers = build_headers(&config, options.as_ref(), cursor.as_deref());
        debug!("session {session_id}: opening stream to {url} (resume: {resumed})");

        // Disconnect during the handshake aborts the request, not just
        // the read loop that would have followed it.
        let sent = tokio::select! {
            changed = cancel_rx.changed() => {
                let _ = changed;
                debug!("session {session_id}: cancelled during handshake");
                return Ok(());
            }
            sent = self.http.get(&url).headers(headers).send() => sent,
        };
        let response = match sent {
            Ok(response) => response,
            Err(err) => {
                let err = Error::transport(err);
                self.fail_session(session_id, &err);
                return Err(err);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let err = Error::http(status.as_u16());
            self.fail_session(session_id, &err);
            return Err(err);
        }

        {
            let mut shared = self.shared.lock().unwrap();
            match &shared.session {
                Some(session) if session.id == session_id => {}
                _ => {
                    debug!("session {session_id}: cancelled while connecting");
                    return Ok(());
                }
            }
            shared.state = ConnectionState::Connected;
            shared.attempts = 0;
            shared.last_error = None;
            shared.connected_at = Some(Instant::now());
        }

        // Heartbeat baseline starts at the moment of connection.
        self.dispatch.note_open();

        let task = tokio::spawn(read_loop(
            Arc::downgrade(self),
            session_id,
            response,
            cancel_rx,
        ));
        {
            let mut shared = self.shared.lock().unwrap();
            match shared.session.as_mut() {
                Some(session) if session.id == session_id => session.task = Some(task),
                // Disconnected in the gap; the loop exits on its own too.
                _ => task.abort(),
            }

            if let Some(interval) = config.heartbeat_interval {
                let watchdog = tokio::spawn(heartbeat_watchdog(
                    Arc::downgrade(self),
                    session_id,
                    interval,
                ));
                if let Some(old) = shared.heartbeat_task.replace(watchdog) {
                    old.abort();
                }
            }
        }

        info!(
            "session {session_id}: connected{}",
            if resumed { " (resumed)" } else { "" }
        );
        config.observer.on_open(resumed);
        Ok(())
    }

    pub(crate) fn disconnect_with(&self, reason: &str) {
        let config = self.config();
        let uptime = {
            let mut shared = self.shared.lock().unwrap();
            let session = shared.session.take();
            let retry = shared.retry_timer.take();
            let watchdog = shared.heartbeat_task.take();
            if session.is_none()
                && retry.is_none()
                && watchdog.is_none()
                && shared.state == ConnectionState::Disconnected
            {
                return; // already disconnected, stay quiet
            }
            if let Some(session) = &session {
                let _ = session.cancel.send(true);
            }
            if let Some(retry) = retry {
                retry.abort();
            }
            if let Some(watchdog) = watchdog {
                watchdog.abort();
            }
            shared.state = ConnectionState::Disconnected;
            shared.connected_at.take().map(|t| t.elapsed()).unwrap_or_default()
        };
        self.dispatch.reset_replay();
        info!("disconnected ({reason}), uptime {uptime:?}");
        config.observer.on_close(reason, uptime);
    }

    /// Common exit for every involuntary session end: transport error,
    /// bad status, or an unexpected clean close. Notifies once and hands
    /// the failure to the retry policy.
    fn fail_session(self: &Arc<Self>, session_id: Uuid, err: &Error) {
        let config = self.config();
        let online = self.is_online();
        let class = classify(err.kind, online);

        enum Next {
            Retry { attempt: u32, delay: Duration },
            GaveUp { attempts: u32 },
            Idle,
        }

        let (attempt, next) = {
            let mut shared = self.shared.lock().unwrap();
            match &shared.session {
                Some(session) if session.id == session_id => {}
                // Stale task: this session was already replaced or closed.
                _ => return,
            }
            shared.session = None;
            if let Some(watchdog) = shared.heartbeat_task.take() {
                watchdog.abort();
            }
            shared.connected_at = None;
            shared.last_error = Some((class, err.to_string()));
            self.dispatch.record_error(config.metrics);

            let attempt = shared.attempts;
            let next = if config.reconnect {
                shared.attempts += 1;
                if shared.attempts > config.max_reconnect_attempts {
                    shared.state = ConnectionState::Failed;
                    Next::GaveUp {
                        attempts: shared.attempts - 1,
                    }
                } else {
                    shared.state = ConnectionState::Reconnecting;
                    let delay = compute_delay(&config.backoff, class, shared.attempts, !online);
                    self.dispatch.record_reconnect(config.metrics);
                    if let Some(old) = shared.retry_timer.take() {
                        old.abort();
                    }
                    shared.retry_timer =
                        Some(tokio::spawn(retry_after(Arc::downgrade(self), delay)));
                    Next::Retry {
                        attempt: shared.attempts,
                        delay,
                    }
                }
            } else {
                shared.state = ConnectionState::Disconnected;
                Next::Idle
            };
            (attempt, next)
        };

        warn!("session {session_id}: {err} ({class:?})");
        config
            .observer
            .on_error(err, class, attempt, config.max_reconnect_attempts);
        match next {
            Next::Retry { attempt, delay } => {
                info!(
                    "reconnect attempt {attempt}/{} in {delay:?}",
                    config.max_reconnect_attempts
                );
                config
                    .observer
                    .on_reconnect_attempt(attempt, config.max_reconnect_attempts, delay);
            }
            Next::GaveUp { attempts } => {
                warn!("giving up after {attempts} reconnect attempts");
                config.observer.on_reconnect_failed(attempts);
            }
            Next::Idle => {}
        }
    }

    fn handle_parser_item(&self, item: ParserItem) {
        match item {
            ParserItem::Frame(frame) => self.handle_frame(frame),
            ParserItem::RetryHint(ms) => {
                let interval = Duration::from_millis(ms);
                self.shared.lock().unwrap().retry_hint = Some(interval);
                debug!("server retry interval hint: {ms}ms");
                self.config().observer.on_retry_interval_update(interval);
            }
        }
    }

    fn handle_frame(&self, frame: SseFrame) {
        let config = self.config();
        let outcome = self.dispatch.dispatch_frame(frame, &config);

        if let Some((raw, err)) = &outcome.parse_error {
            debug!("frame payload is not JSON, delivering raw: {err}");
            config.observer.on_parse_error(raw, err);
        }

        let Some(event) = outcome.event else { return };
        match event {
            Dispatch::Message { payload, meta } => config.observer.on_message(&payload, &meta),
            Dispatch::Heartbeat => config.observer.on_heartbeat(),
            Dispatch::ReplayStart { total } => {
                info!("replay started, {total} events expected");
                config.observer.on_replay_start(total);
            }
            Dispatch::ReplayProgress(progress) => config.observer.on_replay_progress(&progress),
            Dispatch::ReplayEnd => {
                info!("replay finished");
                config.observer.on_replay_end();
            }
            Dispatch::ServerError { message } => {
                warn!("server-reported error: {message}");
                let attempt = self.shared.lock().unwrap().attempts;
                let err = Error::server_reported(message);
                config.observer.on_error(
                    &err,
                    ErrorClass::Default,
                    attempt,
                    config.max_reconnect_attempts,
                );
            }
        }
    }

    /// Quiet teardown plus quick reconnect after a missed heartbeat,
    /// outside the error-driven policy path.
    fn recover_stalled_session(self: &Arc<Self>, session_id: Uuid) {
        let mut shared = self.shared.lock().unwrap();
        match &shared.session {
            Some(session) if session.id == session_id => {}
            _ => return,
        }
        if let Some(session) = shared.session.take() {
            let _ = session.cancel.send(true);
        }
        shared.state = ConnectionState::Reconnecting;
        shared.connected_at = None;
        if let Some(old) = shared.retry_timer.take() {
            old.abort();
        }
        shared.retry_timer = Some(tokio::spawn(retry_after(
            Arc::downgrade(self),
            HEARTBEAT_RECOVERY_DELAY,
        )));
    }

    pub(crate) fn handle_network_lost(&self) {
        let config = self.config();
        {
            let mut network = self.network.lock().unwrap();
            if !network.is_online {
                return;
            }
            network.is_online = false;
            network.offline_since = Some(Instant::now());
        }
        warn!("network connectivity lost");
        config.observer.on_network_lost();
        // No abort here: an in-flight read fails on its own and takes
        // the normal error/retry path.
    }

    pub(crate) async fn handle_network_restore(self: &Arc<Self>) {
        let config = self.config();
        let downtime = {
            let mut network = self.network.lock().unwrap();
            if network.is_online {
                return;
            }
            network.is_online = true;
            network.last_online_at = Some(SystemTime::now());
            let downtime = network
                .offline_since
                .take()
                .map(|t| t.elapsed())
                .unwrap_or_default();
            network.last_downtime = downtime;
            downtime
        };
        info!("network connectivity restored after {downtime:?}");
        config.observer.on_network_restore(downtime);

        if !config.reconnect {
            return;
        }
        if self.shared.lock().unwrap().session.is_some() {
            return;
        }
        tokio::time::sleep(NETWORK_SETTLE_DELAY).await;
        {
            let mut shared = self.shared.lock().unwrap();
            if shared.session.is_some() {
                return;
            }
            // A restore releases a Failed client back into rotation.
            if shared.state == ConnectionState::Failed {
                shared.attempts = 0;
                shared.last_error = None;
            }
        }
        if let Err(err) = self.do_connect(None, true).await {
            debug!("reconnect after network restore failed: {err}");
        }
    }

    pub(crate) async fn handle_visibility(self: &Arc<Self>, visibility: TabVisibility) {
        let config = self.config();
        if !config.visibility_policy {
            return;
        }
        match visibility {
            TabVisibility::Hidden => {
                debug!("tab hidden, closing stream");
                self.disconnect_with("hidden");
            }
            TabVisibility::Visible => {
                let live = self.shared.lock().unwrap().session.is_some();
                if !live {
                    debug!("tab visible, reopening stream");
                    if let Err(err) = self.do_connect(None, true).await {
                        debug!("reconnect on visibility failed: {err}");
                    }
                }
            }
        }
    }

    pub(crate) fn network_status(&self) -> NetworkStatus {
        let network = self.network.lock().unwrap();
        NetworkStatus {
            is_online: network.is_online,
            last_online_at: network.last_online_at,
            downtime: network
                .offline_since
                .map(|t| t.elapsed())
                .unwrap_or(network.last_downtime),
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.lock() {
            if let Some(session) = shared.session.take() {
                let _ = session.cancel.send(true);
                if let Some(task) = session.task {
                    task.abort();
                }
            }
            if let Some(timer) = shared.retry_timer.take() {
                timer.abort();
            }
            if let Some(watchdog) = shared.heartbeat_task.take() {
                watchdog.abort();
            }
        }
        if let Ok(mut monitor) = self.monitor_task.lock() {
            if let Some(task) = monitor.take() {
                task.abort();
            }
        }
    }
}

fn build_http(config: &ClientConfig) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .cookie_store(config.credentials == CredentialsMode::Include)
        .build()
        .map_err(Error::http_client)
}

/// Assemble request headers: protocol defaults, the resume cursor,
/// advisory hints, then config headers, then per-call overrides. Later
/// entries replace earlier ones.
fn build_headers(
    config: &ClientConfig,
    options: Option<&ConnectOptions>,
    cursor: Option<&str>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    if let Some(cursor) = cursor {
        match HeaderValue::from_str(cursor) {
            Ok(value) => {
                headers.insert("Last-Event-ID", value);
            }
            Err(_) => warn!("cursor is not a valid header value, resuming without it"),
        }
    }
    if let Some(limit) = config.replay_page_size {
        headers.insert("X-Replay-Limit", HeaderValue::from(limit));
    }
    if let Some(interval) = config.heartbeat_interval {
        headers.insert("X-Heartbeat-Interval", HeaderValue::from(interval.as_secs()));
    }

    let custom = config
        .headers
        .iter()
        .chain(options.into_iter().flat_map(|o| o.headers.iter()));
    for (name, value) in custom {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!("skipping invalid header {name:?}"),
        }
    }
    headers
}

async fn read_loop(
    inner: Weak<Inner>,
    session_id: Uuid,
    response: reqwest::Response,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut parser = SseParser::new();
    let mut stream = response.bytes_stream();
    loop {
        tokio::select! {
            changed = cancel_rx.changed() => {
                // Flag flip and sender drop both mean deliberate teardown:
                // a quiet exit that never reaches the retry policy.
                let _ = changed;
                debug!("session {session_id}: read loop cancelled");
                return;
            }
            chunk = stream.next() => {
                let Some(inner) = inner.upgrade() else { return };
                match chunk {
                    Some(Ok(bytes)) => {
                        for item in parser.push_bytes(&bytes) {
                            inner.handle_parser_item(item);
                        }
                    }
                    Some(Err(err)) => {
                        inner.fail_session(session_id, &Error::transport(err));
                        return;
                    }
                    None => {
                        // A clean server close before an explicit disconnect
                        // is unexpected for this protocol; treat it like a
                        // dropped connection.
                        inner.fail_session(session_id, &Error::stream_ended());
                        return;
                    }
                }
            }
        }
    }
}

async fn retry_after(inner: Weak<Inner>, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(inner) = inner.upgrade() else { return };
    {
        // The world may have moved on while the timer slept.
        let shared = inner.shared.lock().unwrap();
        if shared.session.is_some() || shared.state != ConnectionState::Reconnecting {
            return;
        }
    }
    if let Err(err) = inner.do_connect(None, true).await {
        debug!("scheduled reconnect attempt failed: {err}");
    }
}

async fn heartbeat_watchdog(inner: Weak<Inner>, session_id: Uuid, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await; // first tick completes immediately
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else { return };
        {
            let shared = inner.shared.lock().unwrap();
            match &shared.session {
                Some(session) if session.id == session_id => {}
                _ => return,
            }
            if shared.state != ConnectionState::Connected {
                return;
            }
        }
        let gap = inner
            .dispatch
            .last_heartbeat()
            .map_or(Duration::MAX, |t| t.elapsed());
        if gap > interval * 2 {
            let config = inner.config();
            warn!("no heartbeat for {gap:?} (expected every {interval:?})");
            config.observer.on_heartbeat_missed(gap);
            if config.reconnect {
                inner.recover_stalled_session(session_id);
            }
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_headers_include_stream_directives() {
        let config = ClientConfig::default();
        let headers = build_headers(&config, None, None);
        assert_eq!(headers.get(ACCEPT).unwrap(), "text/event-stream");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(headers.get(CONNECTION).unwrap(), "keep-alive");
        assert!(headers.get("Last-Event-ID").is_none());
    }

    #[test]
    fn cursor_becomes_last_event_id_header() {
        let config = ClientConfig::default();
        let headers = build_headers(&config, None, Some("42"));
        assert_eq!(headers.get("Last-Event-ID").unwrap(), "42");
    }

    #[test]
    fn caller_headers_override_defaults() {
        let config = ClientConfig {
            headers: vec![("Cache-Control".to_owned(), "max-age=0".to_owned())],
            ..ClientConfig::default()
        };
        let options = ConnectOptions {
            headers: vec![("X-Custom".to_owned(), "yes".to_owned())],
        };
        let headers = build_headers(&config, Some(&options), None);
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "max-age=0");
        assert_eq!(headers.get("X-Custom").unwrap(), "yes");
        // No duplicate entries for the overridden name.
        assert_eq!(headers.get_all(CACHE_CONTROL).iter().count(), 1);
    }

    #[test]
    fn http_client_builds_for_both_credential_modes() {
        assert!(build_http(&ClientConfig::default()).is_ok());
        let include = ClientConfig {
            credentials: CredentialsMode::Include,
            ..ClientConfig::default()
        };
        assert!(build_http(&include).is_ok());
    }

    #[test]
    fn advisory_headers_follow_config() {
        let config = ClientConfig {
            replay_page_size: Some(250),
            heartbeat_interval: Some(Duration::from_secs(30)),
            ..ClientConfig::default()
        };
        let headers = build_headers(&config, None, None);
        assert_eq!(headers.get("X-Replay-Limit").unwrap(), "250");
        assert_eq!(headers.get("X-Heartbeat-Interval").unwrap(), "30");
    }
}
