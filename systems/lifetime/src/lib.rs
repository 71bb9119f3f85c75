#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Concurrent obstacle management with background lifetime decay.
//!
//! [`ConcurrentObstacleManager`] wraps the obstacle population in a
//! reader-writer lock and owns one optional worker thread. The worker wakes
//! on a condition variable every decay interval, decays every lifetime under
//! the shared lock and periodically launches a [`SweepTask`] that removes
//! expired obstacles once it wins the exclusive lock. A sweep that cannot get
//! the lock within its timeout is deferred to the next cycle, so the
//! simulation thread is never stalled by cleanup.

mod config;
mod manager;
mod metrics;
mod sweep;
mod worker;

pub use config::LifetimeWorkerConfig;
pub use manager::{ConcurrentObstacleManager, WorkerError};
pub use metrics::{LifetimeStats, READ_WAIT_WARN, WRITE_WAIT_WARN};
pub use sweep::SweepTask;
