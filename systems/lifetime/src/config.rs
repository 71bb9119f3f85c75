use std::time::Duration;

use snake_hazards_core::TuningError;

/// Cadence of the background lifetime worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifetimeWorkerConfig {
    decay_interval: Duration,
    sweep_interval: Duration,
    sweep_lock_timeout: Duration,
}

impl LifetimeWorkerConfig {
    /// Creates a validated worker configuration.
    ///
    /// `decay_interval` and `sweep_interval` must be non-zero. A zero
    /// `sweep_lock_timeout` makes every sweep a single non-blocking attempt.
    pub fn new(
        decay_interval: Duration,
        sweep_interval: Duration,
        sweep_lock_timeout: Duration,
    ) -> Result<Self, TuningError> {
        if decay_interval.is_zero() {
            return Err(TuningError::Zero {
                field: "decay_interval",
            });
        }
        if sweep_interval.is_zero() {
            return Err(TuningError::Zero {
                field: "sweep_interval",
            });
        }
        Ok(Self {
            decay_interval,
            sweep_interval,
            sweep_lock_timeout,
        })
    }

    /// Time the worker sleeps between decay passes.
    #[must_use]
    pub const fn decay_interval(&self) -> Duration {
        self.decay_interval
    }

    /// Worker time accumulated between asynchronous sweeps.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Longest a sweep keeps retrying the exclusive lock before deferring.
    #[must_use]
    pub const fn sweep_lock_timeout(&self) -> Duration {
        self.sweep_lock_timeout
    }
}

impl Default for LifetimeWorkerConfig {
    fn default() -> Self {
        Self {
            decay_interval: Duration::from_millis(100),
            sweep_interval: Duration::from_secs(5),
            sweep_lock_timeout: Duration::from_millis(20),
        }
    }
}
