//! Downstream sink contract and the dispatcher task that feeds it.
//!
//! The engine's contract ends at handoff: a released batch is passed to the
//! dispatcher, which drives the [`DispatchSink`] on its own task so that slow
//! or failing submissions never block the release path. Failures are surfaced
//! on a channel and logged; the engine keeps no copy and does not retry.

use crate::engine::Batch;
use crate::error::SinkError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Receiver a released batch is finally handed to.
///
/// Submissions are asynchronous and may overlap with the engine producing the
/// next batch. Timeout and retry policy belong to the implementation.
#[async_trait]
pub trait DispatchSink<T: Send + 'static>: Send + Sync {
    async fn submit(&self, batch: Batch<T>) -> Result<(), SinkError>;
}

/// How the dispatcher handles a new batch while a submission is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmitPolicy {
    /// Submit batches sequentially in release order; nothing handed off is
    /// dropped. Unbounded queue if the sink is slower than the producer.
    #[default]
    Queue,
    /// Cancel the in-flight submission when a newer batch is ready
    /// (latest-wins). Bounded concurrency, weaker delivery guarantee.
    Supersede,
}

/// Failure report for one submitted batch.
#[derive(Debug)]
pub struct SinkFailure {
    pub seq: u64,
    pub len: usize,
    pub error: SinkError,
}

/// Drives the sink from its own task, decoupled from the engine loop.
pub(crate) struct SinkDispatcher<T: Send + 'static> {
    sink: Arc<dyn DispatchSink<T>>,
    policy: SubmitPolicy,
    batch_rx: mpsc::UnboundedReceiver<Batch<T>>,
    failure_tx: mpsc::UnboundedSender<SinkFailure>,
}

impl<T: Send + 'static> SinkDispatcher<T> {
    pub(crate) fn new(
        sink: Arc<dyn DispatchSink<T>>,
        policy: SubmitPolicy,
        batch_rx: mpsc::UnboundedReceiver<Batch<T>>,
        failure_tx: mpsc::UnboundedSender<SinkFailure>,
    ) -> Self {
        Self {
            sink,
            policy,
            batch_rx,
            failure_tx,
        }
    }

    pub(crate) async fn run(mut self) {
        match self.policy {
            SubmitPolicy::Queue => self.run_queued().await,
            SubmitPolicy::Supersede => self.run_superseding().await,
        }
        debug!("sink dispatcher stopped");
    }

    async fn run_queued(&mut self) {
        while let Some(batch) = self.batch_rx.recv().await {
            let seq = batch.seq;
            let len = batch.len();
            let result = self.sink.submit(batch).await;
            self.report(seq, len, result);
        }
    }

    async fn run_superseding(&mut self) {
        let mut pending = self.batch_rx.recv().await;
        while let Some(batch) = pending {
            pending = None;
            let seq = batch.seq;
            let len = batch.len();
            let submit = self.sink.submit(batch);
            tokio::pin!(submit);
            tokio::select! {
                result = &mut submit => {
                    self.report(seq, len, result);
                    pending = self.batch_rx.recv().await;
                }
                newer = self.batch_rx.recv() => match newer {
                    Some(newer) => {
                        warn!(superseded = seq, newest = newer.seq,
                            "cancelling in-flight submission for newer batch");
                        pending = Some(newer);
                    }
                    None => {
                        // Engine gone; let the in-flight submission finish.
                        let result = submit.await;
                        self.report(seq, len, result);
                    }
                },
            }
        }
    }

    fn report(&self, seq: u64, len: usize, result: Result<(), SinkError>) {
        match result {
            Ok(()) => debug!(seq, len, "batch submitted to sink"),
            Err(error) => {
                warn!(seq, len, "sink submission failed: {error}");
                let _ = self.failure_tx.send(SinkFailure { seq, len, error });
            }
        }
    }
}

/// Sink that accepts and discards every batch.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

#[async_trait]
impl<T: Send + 'static> DispatchSink<T> for NullSink {
    async fn submit(&self, _batch: Batch<T>) -> Result<(), SinkError> {
        Ok(())
    }
}
