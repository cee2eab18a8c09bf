//! Lock-free counters shared between the ingest loop and the health server.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};

use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopState {
    Polling,
    Draining,
}

impl LoopState {
    fn as_u8(self) -> u8 {
        match self {
            LoopState::Polling => 0,
            LoopState::Draining => 1,
        }
    }

    fn from_u8(v: u8) -> Self {
        if v == 0 {
            LoopState::Polling
        } else {
            LoopState::Draining
        }
    }
}

#[derive(Debug, Default)]
pub struct PipelineStats {
    pub messages_received: AtomicU64,
    pub documents_created: AtomicU64,
    pub duplicates: AtomicU64,
    pub jobs_dispatched: AtomicU64,
    pub messages_failed: AtomicU64,
    pub dead_lettered: AtomicU64,
    last_poll_epoch_ms: AtomicU64,
    state: AtomicU8,
    stream_error: AtomicBool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub status: &'static str,
    pub state: LoopState,
    pub messages_received: u64,
    pub documents_created: u64,
    pub duplicates: u64,
    pub jobs_dispatched: u64,
    pub messages_failed: u64,
    pub dead_lettered: u64,
    pub last_poll_epoch_ms: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a completed poll. `ok` clears or sets the stream error flag.
    pub fn mark_poll(&self, ok: bool) {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
        self.last_poll_epoch_ms.store(now, Ordering::Relaxed);
        self.stream_error.store(!ok, Ordering::Relaxed);
    }

    pub fn set_state(&self, state: LoopState) {
        self.state.store(state.as_u8(), Ordering::Relaxed);
    }

    pub fn state(&self) -> LoopState {
        LoopState::from_u8(self.state.load(Ordering::Relaxed))
    }

    /// `draining` wins over `degraded`, which wins over `ok`.
    pub fn status(&self) -> &'static str {
        match self.state() {
            LoopState::Draining => "draining",
            LoopState::Polling if self.stream_error.load(Ordering::Relaxed) => "degraded",
            LoopState::Polling => "ok",
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            status: self.status(),
            state: self.state(),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            documents_created: self.documents_created.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            jobs_dispatched: self.jobs_dispatched.load(Ordering::Relaxed),
            messages_failed: self.messages_failed.load(Ordering::Relaxed),
            dead_lettered: self.dead_lettered.load(Ordering::Relaxed),
            last_poll_epoch_ms: self.last_poll_epoch_ms.load(Ordering::Relaxed),
        }
    }
}
