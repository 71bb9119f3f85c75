use std::{
    sync::{Arc, RwLock, TryLockError},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use snake_hazards_world::Population;

use crate::metrics::LockMetrics;

const RETRY_BACKOFF: Duration = Duration::from_millis(1);

/// Handle to an asynchronous removal of expired obstacles.
///
/// Dropping the handle waits for the sweep to finish, so no sweep thread
/// outlives its handle.
#[derive(Debug)]
pub struct SweepTask {
    handle: Option<JoinHandle<usize>>,
}

impl SweepTask {
    pub(crate) fn spawn(
        population: Arc<RwLock<Population>>,
        lock_timeout: Duration,
        metrics: Arc<LockMetrics>,
    ) -> Self {
        let spawned = thread::Builder::new()
            .name("obstacle-sweep".into())
            .spawn(move || sweep_with_timeout(&population, lock_timeout, &metrics));
        match spawned {
            Ok(handle) => Self {
                handle: Some(handle),
            },
            Err(error) => {
                log::warn!("failed to spawn sweep thread, deferring cleanup: {error}");
                Self { handle: None }
            }
        }
    }

    /// Reports whether the sweep has finished running.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Blocks until the sweep finishes and returns the number of obstacles removed.
    ///
    /// A deferred sweep removes nothing and reports zero.
    pub fn wait(mut self) -> usize {
        self.join()
    }

    fn join(&mut self) -> usize {
        let Some(handle) = self.handle.take() else {
            return 0;
        };
        match handle.join() {
            Ok(removed) => removed,
            Err(_) => {
                log::error!("obstacle sweep thread panicked");
                0
            }
        }
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        let _ = self.join();
    }
}

/// Retries the exclusive lock until `lock_timeout` elapses, then defers.
pub(crate) fn sweep_with_timeout(
    population: &RwLock<Population>,
    lock_timeout: Duration,
    metrics: &LockMetrics,
) -> usize {
    let started = Instant::now();
    loop {
        let mut guard = match population.try_write() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                if started.elapsed() >= lock_timeout {
                    metrics.record_deferred_sweep();
                    log::debug!(
                        "sweep deferred: population busy for {}ms",
                        lock_timeout.as_millis()
                    );
                    return 0;
                }
                thread::sleep(RETRY_BACKOFF);
                continue;
            }
        };

        metrics.record_write_wait("sweep", started.elapsed());
        let removed = guard.sweep_expired();
        drop(guard);
        metrics.record_sweep(removed);
        if removed > 0 {
            log::debug!("sweep removed {removed} expired obstacles");
        }
        return removed;
    }
}
