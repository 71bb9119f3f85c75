#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Asynchronous obstacle batch generation.
//!
//! [`AsyncBatchGenerator`] owns a small pool of worker threads fed from a
//! mutex-guarded queue. Each request is placed with its own seeded generator
//! derived from the generator's base seed, so a run is reproducible for a
//! given submission order. Results come back through [`Pending`] handles or
//! callbacks that run on a pool worker.

mod config;
mod error;
mod generator;
mod pending;
mod placement;
mod pool;
mod stats;

pub use config::{
    GenerationConfig, DEFAULT_MAX_LIFETIME_SECS, DEFAULT_MAX_RETRIES, DEFAULT_MIN_LIFETIME_SECS,
};
pub use error::GenerationError;
pub use generator::{AsyncBatchGenerator, DEFAULT_POOL_SIZE};
pub use pending::Pending;
pub use placement::{
    validate_placement, PlayerFootprint, DEFAULT_SAFETY_MARGIN, POSITION_ATTEMPTS_PER_CELL,
};
pub use stats::GenerationStats;
