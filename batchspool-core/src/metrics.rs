//! Engine bookkeeping counters.
//!
//! The tracker is mutated only by the engine task (single-writer); observers
//! read a cloned snapshot and never hold a live reference into engine state.

use serde::Serialize;
use std::sync::{Arc, RwLock};

/// Point-in-time view of the engine's counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Events handed off in released batches.
    pub total_events_processed: u64,
    /// Batches released (counted at handoff, independent of sink outcome).
    pub total_batches_sent: u64,
    pub running_average_batch_size: f64,
    pub is_processing_batch: bool,
}

/// Shared counter state; cheap to clone, snapshot reads never block the
/// engine's hot path beyond the brief lock.
#[derive(Clone, Debug, Default)]
pub struct MetricsTracker {
    shared: Arc<RwLock<MetricsSnapshot>>,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one released batch of `size` events.
    pub fn record_batch(&self, size: usize) {
        let mut m = self.shared.write().unwrap_or_else(|e| e.into_inner());
        m.total_batches_sent += 1;
        m.total_events_processed += size as u64;
        let n = m.total_batches_sent;
        if n == 1 {
            m.running_average_batch_size = size as f64;
        } else {
            m.running_average_batch_size =
                (m.running_average_batch_size * (n - 1) as f64 + size as f64) / n as f64;
        }
    }

    pub fn set_processing(&self, processing: bool) {
        let mut m = self.shared.write().unwrap_or_else(|e| e.into_inner());
        m.is_processing_batch = processing;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.shared.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
