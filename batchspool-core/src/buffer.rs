//! Accumulation buffer for one release cycle.
//!
//! `BufferState` is owned exclusively by the engine actor; admission (`push`)
//! and release (`take_pending`) therefore never observe each other mid-flight.
//! The cycle configuration is snapshotted at `open_cycle` and frozen until the
//! cycle closes.

use crate::config::CycleConfig;
use std::time::Duration;
use tokio::time::Instant;

/// Buffered events plus the timing state of the open cycle.
pub struct BufferState<T> {
    pending: Vec<T>,
    last_activity: Option<Instant>,
    config: CycleConfig,
}

impl<T> BufferState<T> {
    pub fn new(config: CycleConfig) -> Self {
        Self {
            pending: Vec::new(),
            last_activity: None,
            config,
        }
    }

    /// Appends an event and stamps activity, rearming the debounce window.
    ///
    /// Returns the new pending count.
    pub fn push(&mut self, event: T, now: Instant) -> usize {
        self.pending.push(event);
        self.last_activity = Some(now);
        self.pending.len()
    }

    /// Takes all pending events, leaving the buffer empty.
    ///
    /// The caller is expected to follow up with [`open_cycle`](Self::open_cycle).
    pub fn take_pending(&mut self) -> Vec<T> {
        self.last_activity = None;
        std::mem::take(&mut self.pending)
    }

    /// Resets for a new accumulation cycle with a fresh config snapshot.
    pub fn open_cycle(&mut self, config: CycleConfig) {
        self.config = config;
        self.last_activity = None;
    }

    /// Frozen configuration of the open cycle.
    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// True once the pending count has reached the frozen threshold.
    pub fn count_threshold_reached(&self) -> bool {
        self.pending.len() >= self.config.count_threshold
    }

    /// Instant at which the inactivity timer of the open cycle expires.
    ///
    /// `None` while the buffer is empty: an empty cycle has no deadline and
    /// never releases on time alone.
    pub fn release_deadline(&self) -> Option<Instant> {
        self.last_activity
            .map(|at| at + self.config.inactivity_delay)
    }

    /// Best-effort time remaining until the inactivity release.
    ///
    /// Returns the full configured delay while the buffer is empty.
    pub fn time_until_release(&self, now: Instant) -> Duration {
        match self.release_deadline() {
            Some(deadline) => deadline.saturating_duration_since(now),
            None => self.config.inactivity_delay,
        }
    }
}
