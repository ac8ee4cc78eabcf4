//! Loop status bookkeeping.
//!
//! Operators watching a plugin process need to know whether it is keeping up
//! and what last went wrong. The loop updates a shared [`LoopStatus`] as it
//! runs; anything holding the `Arc` can snapshot it.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use alerthub_agentlib::failure::{CapturedFailure, FailureKind};

/// Record of the most recent handler failure.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// Runtime kind of the raised payload.
    pub kind: FailureKind,
    /// Human-readable description (payload message, or a placeholder for
    /// non-message payloads).
    pub description: String,
    /// When the failure was captured.
    pub at: DateTime<Utc>,
}

/// Counters and last-failure record for one agent loop.
#[derive(Debug, Default)]
pub struct LoopStatus {
    messages_processed: AtomicU64,
    handler_failures: AtomicU64,
    restarts: AtomicU64,
    last_failure: Mutex<Option<FailureRecord>>,
}

impl LoopStatus {
    /// Create a zeroed status.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one processed message (successful or not).
    pub fn record_message(&self) {
        self.messages_processed.fetch_add(1, Ordering::SeqCst);
    }

    /// Count one handler failure and remember it.
    pub fn record_failure(&self, failure: &CapturedFailure) {
        self.handler_failures.fetch_add(1, Ordering::SeqCst);
        *self.last_failure.lock() = Some(FailureRecord {
            kind: failure.kind(),
            description: failure.to_string(),
            at: Utc::now(),
        });
    }

    /// Count one restart.
    pub fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }

    /// Messages processed since the loop started.
    pub fn messages_processed(&self) -> u64 {
        self.messages_processed.load(Ordering::SeqCst)
    }

    /// Handler failures observed since the loop started.
    pub fn handler_failures(&self) -> u64 {
        self.handler_failures.load(Ordering::SeqCst)
    }

    /// Restarts performed since the loop started.
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::SeqCst)
    }

    /// The most recent handler failure, if any.
    pub fn last_failure(&self) -> Option<FailureRecord> {
        self.last_failure.lock().clone()
    }
}
