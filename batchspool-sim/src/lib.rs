//! Simulated downstream collaborator for the batching engine.
//!
//! Models the backend receiver as an async sink with a latency distribution:
//! every submission sleeps for a sampled duration, optionally fails with a
//! configured probability, and records what it delivered so tests can assert
//! on the handoff.

use async_trait::async_trait;
use batchspool_core::{Batch, DispatchSink, SinkError};
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// Latency distribution for simulated submissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencyProfile {
    min: Duration,
    max: Duration,
}

impl LatencyProfile {
    /// Constant latency.
    pub fn fixed(latency: Duration) -> Self {
        Self {
            min: latency,
            max: latency,
        }
    }

    /// Uniform latency in `[min, max]`; bounds given in either order.
    pub fn uniform(a: Duration, b: Duration) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Zero latency.
    pub fn instant() -> Self {
        Self::fixed(Duration::ZERO)
    }

    fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }
}

/// Shared record of everything a [`SimulatedSink`] has delivered.
pub struct DeliveryLog<T> {
    inner: Arc<Mutex<Vec<Batch<T>>>>,
}

impl<T> Clone for DeliveryLog<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> DeliveryLog<T> {
    fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, batch: Batch<T>) {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).push(batch);
    }

    pub fn batch_count(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn event_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(Batch::len)
            .sum()
    }
}

impl<T: Clone> DeliveryLog<T> {
    /// Delivered batches in delivery order.
    pub fn batches(&self) -> Vec<Batch<T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// Async sink with a latency distribution and optional failure injection.
pub struct SimulatedSink<T> {
    latency: LatencyProfile,
    failure_rate: f64,
    log: DeliveryLog<T>,
}

impl<T> SimulatedSink<T> {
    pub fn new(latency: LatencyProfile) -> Self {
        Self {
            latency,
            failure_rate: 0.0,
            log: DeliveryLog::new(),
        }
    }

    /// Fraction of submissions that fail, clamped to `[0, 1]`.
    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Handle for inspecting deliveries after the sink is handed to an engine.
    pub fn delivery_log(&self) -> DeliveryLog<T> {
        self.log.clone()
    }
}

#[async_trait]
impl<T: Send + 'static> DispatchSink<T> for SimulatedSink<T> {
    async fn submit(&self, batch: Batch<T>) -> Result<(), SinkError> {
        // Sample up front; the RNG handle must not cross the await.
        let (latency, fail) = {
            let mut rng = rand::thread_rng();
            let fail = self.failure_rate > 0.0 && rng.gen_bool(self.failure_rate);
            (self.latency.sample(), fail)
        };

        tokio::time::sleep(latency).await;

        if fail {
            return Err(SinkError::Unavailable(format!(
                "simulated outage for batch {}",
                batch.seq
            )));
        }
        debug!(seq = batch.seq, len = batch.len(), "simulated delivery");
        self.log.record(batch);
        Ok(())
    }
}
