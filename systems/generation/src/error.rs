use std::io;

use snake_hazards_core::TuningError;
use thiserror::Error;

/// Failures reported by the batch generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The pool was shut down before the request was submitted.
    #[error("generator pool has been shut down")]
    PoolStopped,
    /// The job was dropped before it produced a result.
    #[error("generation job was dropped before completing")]
    Disconnected,
    /// The result was not ready within the requested timeout.
    #[error("generation result not ready before the timeout")]
    Timeout,
    /// A worker thread could not be created.
    #[error("failed to spawn generator worker thread")]
    Spawn(#[from] io::Error),
    /// The request carried invalid tuning values.
    #[error("invalid generation request: {0}")]
    InvalidConfig(#[from] TuningError),
}
