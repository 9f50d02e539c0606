//! Buffer engine actor.
//!
//! One task owns the accumulation buffer, the trigger arbiter, and the
//! metrics tracker; producers talk to it through a cloneable [`EngineHandle`].
//! Every accumulation cycle races three release conditions:
//! - inactivity timeout, a debounce rearmed by every admitted event
//! - count threshold, checked synchronously on admission
//! - manual flush
//!
//! Whichever fires first detaches the pending events as a [`Batch`], fans the
//! batch out to subscribers and the sink dispatcher, and opens a new cycle
//! with the configuration staged at that moment.

use crate::arbiter::{ReleaseTrigger, TriggerArbiter};
use crate::buffer::BufferState;
use crate::config::{ConfigUpdate, CycleConfig};
use crate::error::{ConfigError, EngineError, EngineResult};
use crate::metrics::{MetricsSnapshot, MetricsTracker};
use crate::sink::{DispatchSink, SinkDispatcher, SinkFailure, SubmitPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Subscribers slower than this many undelivered batches start losing the
/// oldest ones (reported through [`BatchSubscription::recv`] logging).
const SUBSCRIBER_BUFFER: usize = 1024;

/// One released cycle's events, in arrival order. Never empty.
#[derive(Clone, Debug)]
pub struct Batch<T> {
    /// Monotonic release sequence number, starting at 1.
    pub seq: u64,
    /// Condition that closed the cycle.
    pub trigger: ReleaseTrigger,
    /// Events in arrival order.
    pub events: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

enum Command<T> {
    Send(T),
    Flush,
    Configure(ConfigUpdate),
    QueryEta(oneshot::Sender<Duration>),
    Shutdown(oneshot::Sender<Vec<T>>),
}

/// Handle for driving a running [`BufferEngine`].
pub struct EngineHandle<T> {
    command_tx: mpsc::UnboundedSender<Command<T>>,
    batch_tx: broadcast::Sender<Batch<T>>,
    metrics: MetricsTracker,
}

impl<T> Clone for EngineHandle<T> {
    fn clone(&self) -> Self {
        Self {
            command_tx: self.command_tx.clone(),
            batch_tx: self.batch_tx.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<T> EngineHandle<T> {
    /// Admits an event into the current cycle.
    ///
    /// Never blocks and never rejects (admission is unbounded). An event sent
    /// after shutdown is dropped with a warning; that teardown window is the
    /// caller's to close.
    pub fn send(&self, event: T) {
        if self.command_tx.send(Command::Send(event)).is_err() {
            warn!("send after engine shutdown, event dropped");
        }
    }

    /// Forces release of the current cycle. No-op on an empty buffer.
    pub fn flush(&self) {
        let _ = self.command_tx.send(Command::Flush);
    }

    /// Stages a partial reconfiguration for the next cycle.
    ///
    /// Invalid updates are rejected here, synchronously, and the previous
    /// configuration stays in effect. Lowering the count threshold to or below
    /// the current pending count releases the open cycle immediately.
    pub fn configure(&self, update: ConfigUpdate) -> EngineResult<()> {
        if update.count_threshold == Some(0) {
            return Err(ConfigError::ZeroCountThreshold.into());
        }
        let _ = self.command_tx.send(Command::Configure(update));
        Ok(())
    }

    /// Subscribes to released batches, in emission order.
    pub fn subscribe_batches(&self) -> BatchSubscription<T> {
        BatchSubscription {
            rx: self.batch_tx.subscribe(),
        }
    }

    /// Point-in-time view of the engine counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Best-effort time until the inactivity release of the open cycle.
    ///
    /// Returns the full configured delay while the buffer is empty.
    pub async fn time_until_next_release(&self) -> EngineResult<Duration> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::QueryEta(reply_tx))
            .map_err(|_| EngineError::NotRunning)?;
        reply_rx.await.map_err(|_| EngineError::NotRunning)
    }

    /// Stops the engine, returning any events still pending, in arrival order.
    ///
    /// Drained events were never released; handing them somewhere is the
    /// caller's decision.
    pub async fn shutdown(&self) -> EngineResult<Vec<T>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(Command::Shutdown(reply_tx))
            .map_err(|_| EngineError::NotRunning)?;
        reply_rx.await.map_err(|_| EngineError::NotRunning)
    }
}

/// One subscriber's view of the batch stream. Drop to unsubscribe.
pub struct BatchSubscription<T> {
    rx: broadcast::Receiver<Batch<T>>,
}

impl<T: Clone> BatchSubscription<T> {
    /// Next batch in emission order; `None` once the engine has stopped and
    /// every buffered batch has been observed.
    pub async fn recv(&mut self) -> Option<Batch<T>> {
        loop {
            match self.rx.recv().await {
                Ok(batch) => return Some(batch),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "batch subscriber lagged, oldest batches lost");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Creates an engine, its command handle, and the sink-failure channel.
///
/// The caller spawns `engine.run()`; the handle and failure receiver stay on
/// the caller's side. Mirrors the usual construction:
///
/// ```no_run
/// use batchspool_core::{CycleConfig, NullSink, SubmitPolicy, create_engine};
/// use std::sync::Arc;
///
/// # async fn demo() {
/// let (handle, _failures, engine) =
///     create_engine::<u32>(CycleConfig::default(), Arc::new(NullSink), SubmitPolicy::Queue);
/// tokio::spawn(engine.run());
/// handle.send(7);
/// # }
/// ```
pub fn create_engine<T>(
    config: CycleConfig,
    sink: Arc<dyn DispatchSink<T>>,
    policy: SubmitPolicy,
) -> (
    EngineHandle<T>,
    mpsc::UnboundedReceiver<SinkFailure>,
    BufferEngine<T>,
)
where
    T: Clone + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (batch_tx, _) = broadcast::channel(SUBSCRIBER_BUFFER);
    let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
    let (failure_tx, failure_rx) = mpsc::unbounded_channel();

    let metrics = MetricsTracker::new();
    let dispatcher = SinkDispatcher::new(sink, policy, dispatch_rx, failure_tx);

    let handle = EngineHandle {
        command_tx,
        batch_tx: batch_tx.clone(),
        metrics: metrics.clone(),
    };

    let engine = BufferEngine {
        buffer: BufferState::new(config.clone()),
        next_config: config,
        arbiter: TriggerArbiter::new(),
        metrics,
        command_rx,
        batch_tx,
        dispatch_tx,
        dispatcher: Some(dispatcher),
        seq: 0,
    };

    (handle, failure_rx, engine)
}

/// The engine actor. Owns all buffer state; see [`create_engine`].
pub struct BufferEngine<T: Send + 'static> {
    buffer: BufferState<T>,
    /// Configuration the *next* cycle will snapshot.
    next_config: CycleConfig,
    arbiter: TriggerArbiter,
    metrics: MetricsTracker,
    command_rx: mpsc::UnboundedReceiver<Command<T>>,
    batch_tx: broadcast::Sender<Batch<T>>,
    dispatch_tx: mpsc::UnboundedSender<Batch<T>>,
    dispatcher: Option<SinkDispatcher<T>>,
    seq: u64,
}

impl<T: Clone + Send + 'static> BufferEngine<T> {
    /// Runs the engine event loop until shutdown.
    pub async fn run(mut self) {
        if let Some(dispatcher) = self.dispatcher.take() {
            tokio::spawn(dispatcher.run());
        }
        info!("buffer engine started");

        loop {
            // Recomputed every turn, so each admitted event rearms the
            // debounce from scratch. No deadline while the buffer is empty.
            let deadline = self.buffer.release_deadline();

            tokio::select! {
                // Commands first: the synchronous conditions (flush, count)
                // win an exact tie against the timer.
                biased;

                cmd = self.command_rx.recv() => match cmd {
                    Some(Command::Send(event)) => self.on_send(event),
                    Some(Command::Flush) => self.on_flush(),
                    Some(Command::Configure(update)) => self.on_configure(update),
                    Some(Command::QueryEta(reply)) => {
                        let _ = reply.send(self.buffer.time_until_release(Instant::now()));
                    }
                    Some(Command::Shutdown(reply)) => {
                        let drained = self.buffer.take_pending();
                        if !drained.is_empty() {
                            info!(drained = drained.len(), "shutdown drained pending events");
                        }
                        let _ = reply.send(drained);
                        break;
                    }
                    None => {
                        let pending = self.buffer.pending_count();
                        if pending > 0 {
                            warn!(pending, "command channel closed with events still pending");
                        }
                        break;
                    }
                },

                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_timer();
                }
            }
        }

        info!("buffer engine stopped");
    }

    fn on_send(&mut self, event: T) {
        let pending = self.buffer.push(event, Instant::now());
        debug!(pending, "event admitted");
        if self.buffer.count_threshold_reached() {
            self.release(ReleaseTrigger::CountThreshold);
        }
    }

    fn on_flush(&mut self) {
        if self.buffer.is_empty() {
            debug!("flush on empty buffer, nothing to release");
            return;
        }
        self.release(ReleaseTrigger::ManualFlush);
    }

    fn on_configure(&mut self, update: ConfigUpdate) {
        match self.next_config.merged(&update) {
            Ok(merged) => {
                debug!(?merged, "configuration staged for next cycle");
                self.next_config = merged;
                if self.buffer.is_empty() {
                    // No cycle underway; the snapshot can move up immediately.
                    self.buffer.open_cycle(self.next_config.clone());
                } else if self.buffer.pending_count() >= self.next_config.count_threshold {
                    // A threshold lowered to or below the current backlog
                    // counts as already reached; release now rather than
                    // waiting for the next event.
                    self.release(ReleaseTrigger::CountThreshold);
                }
            }
            Err(e) => warn!("rejected reconfiguration: {e}"),
        }
    }

    fn on_timer(&mut self) {
        // A timer racing an already-drained buffer emits nothing.
        if self.buffer.is_empty() {
            return;
        }
        self.release(ReleaseTrigger::InactivityTimeout);
    }

    /// The release transition: detach pending events, emit, open a new cycle.
    fn release(&mut self, trigger: ReleaseTrigger) {
        if !self.arbiter.observe(trigger) {
            debug!(?trigger, "cycle already released, trigger ignored");
            return;
        }
        self.metrics.set_processing(true);

        let events = self.buffer.take_pending();
        self.seq += 1;
        let batch = Batch {
            seq: self.seq,
            trigger,
            events,
        };
        self.metrics.record_batch(batch.len());
        debug!(seq = batch.seq, size = batch.len(), ?trigger, "cycle released");

        // Subscribers observe batches in release order; a send with no
        // subscribers is fine.
        let _ = self.batch_tx.send(batch.clone());
        if self.dispatch_tx.send(batch).is_err() {
            warn!("sink dispatcher gone, batch dropped at handoff");
        }

        self.arbiter.reset();
        self.buffer.open_cycle(self.next_config.clone());
        self.metrics.set_processing(false);
    }
}
