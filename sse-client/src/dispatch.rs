//! Event dispatcher: classifies parsed frames, maintains the resume
//! cursor, the bounded event buffer, replay progress, and metrics.
//!
//! The dispatcher owns all stream-derived state and survives reconnects
//! within a client's lifetime; the parser and session do not. It returns
//! a [`DispatchOutcome`] instead of invoking callbacks itself, so
//! observer notifications never run under its lock.

use crate::config::ClientConfig;
use crate::event::{BufferedEvent, MessageMeta, ReplayProgress, SseFrame};
use crate::metrics::{Metrics, MetricsSnapshot};
use log::*;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

/// What a dispatched frame amounted to, for the session to notify about.
#[derive(Debug)]
pub(crate) enum Dispatch {
    Message { payload: Value, meta: MessageMeta },
    Heartbeat,
    ReplayStart { total: u64 },
    ReplayProgress(ReplayProgress),
    ReplayEnd,
    ServerError { message: String },
}

#[derive(Debug)]
pub(crate) struct DispatchOutcome {
    /// Raw payload and decode error when JSON parsing failed. The frame
    /// is still dispatched with the raw string as its payload.
    pub parse_error: Option<(String, serde_json::Error)>,
    pub event: Option<Dispatch>,
}

#[derive(Debug)]
struct ReplayState {
    current: u64,
    total: u64,
    started_at: Instant,
}

impl ReplayState {
    fn progress(&self) -> ReplayProgress {
        let elapsed = self.started_at.elapsed();
        let rate = if elapsed.as_secs_f64() > 0.0 {
            self.current as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        let estimated_remaining = if rate > 0.0 && self.total > self.current {
            Some(Duration::from_secs_f64(
                (self.total - self.current) as f64 / rate,
            ))
        } else {
            None
        };
        ReplayProgress {
            current: self.current,
            total: self.total,
            is_replaying: true,
            elapsed,
            estimated_remaining,
        }
    }
}

#[derive(Debug, Default)]
struct DispatchState {
    cursor: Option<String>,
    buffer: VecDeque<BufferedEvent>,
    latest: Option<Value>,
    replay: Option<ReplayState>,
    last_heartbeat: Option<Instant>,
    metrics: Metrics,
}

#[derive(Debug, Default)]
pub(crate) struct Dispatcher {
    state: Mutex<DispatchState>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route one frame. The cursor advances for any frame carrying an id,
    /// control or not, before the frame is classified.
    pub fn dispatch_frame(&self, frame: SseFrame, config: &ClientConfig) -> DispatchOutcome {
        let mut state = self.state.lock().unwrap();

        if let Some(id) = &frame.id {
            state.cursor = Some(id.clone());
        }

        let (payload, parse_error) = match serde_json::from_str::<Value>(&frame.data) {
            Ok(value) => (value, None),
            Err(err) => (
                Value::String(frame.data.clone()),
                Some((frame.data.clone(), err)),
            ),
        };

        // Type discriminator: payload field first, frame event type second.
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .unwrap_or_else(|| frame.event_type.clone());

        let event = match kind.as_str() {
            "replay_start" => {
                let total = payload
                    .get("totalEvents")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                let current = payload
                    .get("processedEvents")
                    .and_then(Value::as_u64)
                    .unwrap_or(0);
                state.replay = Some(ReplayState {
                    current,
                    total,
                    started_at: Instant::now(),
                });
                Some(Dispatch::ReplayStart { total })
            }
            "replay_progress" => match state.replay.as_mut() {
                Some(replay) => {
                    replay.current = payload
                        .get("processedEvents")
                        .and_then(Value::as_u64)
                        .unwrap_or(replay.current + 1);
                    Some(Dispatch::ReplayProgress(replay.progress()))
                }
                None => {
                    debug!("replay_progress frame outside a replay phase, ignoring");
                    None
                }
            },
            "replay_end" => {
                state.replay = None;
                Some(Dispatch::ReplayEnd)
            }
            "heartbeat" => {
                state.last_heartbeat = Some(Instant::now());
                Some(Dispatch::Heartbeat)
            }
            "error" => {
                let message = payload
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or(&frame.data)
                    .to_owned();
                Some(Dispatch::ServerError { message })
            }
            _ => {
                let size_bytes = frame.data.len();
                state.latest = Some(payload.clone());
                if config.metrics {
                    state.metrics.record_event(size_bytes);
                }
                if config.buffer_limit > 0 {
                    state.buffer.push_back(BufferedEvent {
                        data: payload.clone(),
                        id: frame.id.clone(),
                        timestamp: SystemTime::now(),
                        event_type: kind.clone(),
                        size_bytes,
                    });
                    Self::trim_buffer(&mut state.buffer, config.buffer_limit);
                }
                Some(Dispatch::Message {
                    payload,
                    meta: MessageMeta {
                        event_type: kind,
                        id: frame.id,
                    },
                })
            }
        };

        DispatchOutcome { parse_error, event }
    }

    /// Trim from the front back to ~80% of capacity, so a full buffer is
    /// not re-trimmed on every subsequent event.
    fn trim_buffer(buffer: &mut VecDeque<BufferedEvent>, max: usize) {
        if buffer.len() > max {
            let keep = max * 4 / 5 + 1;
            let excess = buffer.len() - keep;
            buffer.drain(..excess);
        }
    }

    /// Mark the stream open: the heartbeat clock starts at the moment of
    /// connection so the watchdog has a baseline before the first frame.
    pub fn note_open(&self) {
        self.state.lock().unwrap().last_heartbeat = Some(Instant::now());
    }

    pub fn reset_replay(&self) {
        self.state.lock().unwrap().replay = None;
    }

    pub fn record_error(&self, enabled: bool) {
        if enabled {
            self.state.lock().unwrap().metrics.total_errors += 1;
        }
    }

    pub fn record_reconnect(&self, enabled: bool) {
        if enabled {
            self.state.lock().unwrap().metrics.total_reconnects += 1;
        }
    }

    pub fn cursor(&self) -> Option<String> {
        self.state.lock().unwrap().cursor.clone()
    }

    pub fn latest(&self) -> Option<Value> {
        self.state.lock().unwrap().latest.clone()
    }

    pub fn last_heartbeat(&self) -> Option<Instant> {
        self.state.lock().unwrap().last_heartbeat
    }

    pub fn replay_progress(&self) -> Option<ReplayProgress> {
        self.state
            .lock()
            .unwrap()
            .replay
            .as_ref()
            .map(ReplayState::progress)
    }

    pub fn buffer_snapshot(&self) -> Vec<BufferedEvent> {
        self.state.lock().unwrap().buffer.iter().cloned().collect()
    }

    pub fn metrics_snapshot(&self, uptime: Option<Duration>) -> MetricsSnapshot {
        self.state.lock().unwrap().metrics.snapshot(uptime)
    }
}
