//! Per-order delivery status tracking
//!
//! A [`StatusTracker`] holds the current [`OrderStatus`] together with the
//! time of the last transition. Both live behind one lock so readers never
//! see a status paired with a stale timestamp.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::clock::SharedClock;
use crate::types::OrderStatus;

/// Minimum time between two accepted status transitions
pub const DWELL_SECONDS: i64 = 30;

pub fn dwell_interval() -> Duration {
    Duration::seconds(DWELL_SECONDS)
}

/// Status and the moment it was entered, read as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSnapshot {
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

/// Time-gated status state machine owned by a single order
///
/// `advance` accepts whatever target the caller names once the dwell
/// interval has passed. Keeping progression forward-only is up to the caller,
/// see [`OrderStatus::can_advance_to`].
#[derive(Debug)]
pub struct StatusTracker {
    clock: SharedClock,
    state: Mutex<TrackingSnapshot>,
}

impl StatusTracker {
    /// New tracker in `Ordered`, stamped with the clock's current time
    pub fn new(clock: SharedClock) -> Self {
        let changed_at = clock.now();
        Self {
            clock,
            state: Mutex::new(TrackingSnapshot {
                status: OrderStatus::Ordered,
                changed_at,
            }),
        }
    }

    /// Move to `target` if at least [`DWELL_SECONDS`] have elapsed since the
    /// last transition. Returns `true` when the transition was applied.
    pub fn advance(&self, target: OrderStatus) -> bool {
        let mut state = self.lock();
        let now = self.clock.now();

        if now - state.changed_at < dwell_interval() {
            return false;
        }

        debug!(from = %state.status, to = %target, "Status transition applied");
        state.status = target;
        state.changed_at = now;
        true
    }

    /// Like [`StatusTracker::advance`], but only while the current status is
    /// still `expected`. Check and transition happen under one lock.
    pub fn advance_from(&self, expected: OrderStatus, target: OrderStatus) -> bool {
        let mut state = self.lock();
        let now = self.clock.now();

        if state.status != expected || now - state.changed_at < dwell_interval() {
            return false;
        }

        debug!(from = %state.status, to = %target, "Status transition applied");
        state.status = target;
        state.changed_at = now;
        true
    }

    pub fn status(&self) -> OrderStatus {
        self.lock().status
    }

    pub fn changed_at(&self) -> DateTime<Utc> {
        self.lock().changed_at
    }

    pub fn snapshot(&self) -> TrackingSnapshot {
        *self.lock()
    }

    /// Time elapsed since the last transition
    pub fn dwell_elapsed(&self) -> Duration {
        let changed_at = self.lock().changed_at;
        self.clock.now() - changed_at
    }

    fn lock(&self) -> MutexGuard<'_, TrackingSnapshot> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("Status tracker lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
