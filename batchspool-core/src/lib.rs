//! Event-batching engine.
//!
//! Buffers a high-frequency stream of events and releases them as ordered
//! batches, trading per-event latency for reduced downstream call volume:
//! - Three release conditions per cycle: inactivity debounce, count
//!   threshold, manual flush — first one wins, arbitrated single-fire
//! - Actor-owned buffer state; producers use a cloneable non-blocking handle
//! - Broadcast of released batches to subscribers, async handoff to a
//!   [`DispatchSink`] with an explicit in-flight policy
//! - Snapshot metrics and a drain-on-shutdown guarantee (no silent loss)

pub mod arbiter;
pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod sink;

pub use arbiter::{ReleaseTrigger, TriggerArbiter};
pub use config::{ConfigUpdate, CycleConfig};
pub use engine::{Batch, BatchSubscription, BufferEngine, EngineHandle, create_engine};
pub use error::{ConfigError, EngineError, EngineResult, SinkError};
pub use metrics::{MetricsSnapshot, MetricsTracker};
pub use sink::{DispatchSink, NullSink, SinkFailure, SubmitPolicy};
