//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors rejected synchronously when validating a cycle configuration.
///
/// A rejected reconfiguration leaves the previous configuration in effect.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("count threshold must be positive")]
    ZeroCountThreshold,
}

/// Errors reported by a [`DispatchSink`](crate::sink::DispatchSink) for a
/// submitted batch.
///
/// The engine does not retry a failed submission; it surfaces the failure on
/// the failure channel and moves on. Retry and backoff belong to the sink.
#[derive(Debug, Error, Clone)]
pub enum SinkError {
    #[error("sink rejected batch: {0}")]
    Rejected(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}

/// Errors that can occur when driving the engine through its handle.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("engine not running")]
    NotRunning,
}
