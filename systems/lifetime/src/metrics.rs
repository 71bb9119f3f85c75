use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

/// Shared-lock waits at or above this threshold are logged as warnings.
pub const READ_WAIT_WARN: Duration = Duration::from_micros(300);

/// Exclusive-lock waits at or above this threshold are logged as warnings.
pub const WRITE_WAIT_WARN: Duration = Duration::from_micros(500);

const REPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Point-in-time copy of the lifetime worker and lock counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LifetimeStats {
    /// Decay passes completed by the worker.
    pub decay_cycles: u64,
    /// Sweeps that acquired the exclusive lock.
    pub sweeps_completed: u64,
    /// Sweeps that gave up waiting for the exclusive lock.
    pub sweeps_deferred: u64,
    /// Obstacles removed by sweeps.
    pub obstacles_swept: u64,
    /// Shared-lock acquisitions measured.
    pub read_wait_samples: u64,
    /// Mean shared-lock wait.
    pub read_wait_avg: Duration,
    /// Exclusive-lock acquisitions measured.
    pub write_wait_samples: u64,
    /// Mean exclusive-lock wait.
    pub write_wait_avg: Duration,
}

#[derive(Debug)]
pub(crate) struct LockMetrics {
    created: Instant,
    last_report_ms: AtomicU64,
    read_wait_total_ns: AtomicU64,
    read_wait_samples: AtomicU64,
    write_wait_total_ns: AtomicU64,
    write_wait_samples: AtomicU64,
    decay_cycles: AtomicU64,
    sweeps_completed: AtomicU64,
    sweeps_deferred: AtomicU64,
    obstacles_swept: AtomicU64,
}

impl LockMetrics {
    pub(crate) fn new() -> Self {
        Self {
            created: Instant::now(),
            last_report_ms: AtomicU64::new(0),
            read_wait_total_ns: AtomicU64::new(0),
            read_wait_samples: AtomicU64::new(0),
            write_wait_total_ns: AtomicU64::new(0),
            write_wait_samples: AtomicU64::new(0),
            decay_cycles: AtomicU64::new(0),
            sweeps_completed: AtomicU64::new(0),
            sweeps_deferred: AtomicU64::new(0),
            obstacles_swept: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_read_wait(&self, context: &str, wait: Duration) {
        let _ = self
            .read_wait_total_ns
            .fetch_add(as_nanos_u64(wait), Ordering::Relaxed);
        let _ = self.read_wait_samples.fetch_add(1, Ordering::Relaxed);
        if wait >= READ_WAIT_WARN {
            log::warn!(
                "population read wait high: {}us (threshold={}us, context={context})",
                wait.as_micros(),
                READ_WAIT_WARN.as_micros()
            );
        }
        self.maybe_report();
    }

    pub(crate) fn record_write_wait(&self, context: &str, wait: Duration) {
        let _ = self
            .write_wait_total_ns
            .fetch_add(as_nanos_u64(wait), Ordering::Relaxed);
        let _ = self.write_wait_samples.fetch_add(1, Ordering::Relaxed);
        if wait >= WRITE_WAIT_WARN {
            log::warn!(
                "population write wait high: {}us (threshold={}us, context={context})",
                wait.as_micros(),
                WRITE_WAIT_WARN.as_micros()
            );
        }
        self.maybe_report();
    }

    pub(crate) fn record_decay(&self) {
        let _ = self.decay_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self, removed: usize) {
        let _ = self.sweeps_completed.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .obstacles_swept
            .fetch_add(removed as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_deferred_sweep(&self) {
        let _ = self.sweeps_deferred.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LifetimeStats {
        let read_wait_samples = self.read_wait_samples.load(Ordering::Relaxed);
        let write_wait_samples = self.write_wait_samples.load(Ordering::Relaxed);
        LifetimeStats {
            decay_cycles: self.decay_cycles.load(Ordering::Relaxed),
            sweeps_completed: self.sweeps_completed.load(Ordering::Relaxed),
            sweeps_deferred: self.sweeps_deferred.load(Ordering::Relaxed),
            obstacles_swept: self.obstacles_swept.load(Ordering::Relaxed),
            read_wait_samples,
            read_wait_avg: average(
                self.read_wait_total_ns.load(Ordering::Relaxed),
                read_wait_samples,
            ),
            write_wait_samples,
            write_wait_avg: average(
                self.write_wait_total_ns.load(Ordering::Relaxed),
                write_wait_samples,
            ),
        }
    }

    fn maybe_report(&self) {
        let now = as_millis_u64(self.created.elapsed());
        let last = self.last_report_ms.load(Ordering::Relaxed);
        if now.saturating_sub(last) < as_millis_u64(REPORT_INTERVAL) {
            return;
        }
        if self
            .last_report_ms
            .compare_exchange(last, now, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        let stats = self.snapshot();
        log::info!(
            "[LOCK] avg_wait_us(read={}, write={}) samples(read={}, write={}) sweeps(done={}, deferred={}, removed={})",
            stats.read_wait_avg.as_micros(),
            stats.write_wait_avg.as_micros(),
            stats.read_wait_samples,
            stats.write_wait_samples,
            stats.sweeps_completed,
            stats.sweeps_deferred,
            stats.obstacles_swept
        );
    }
}

fn as_nanos_u64(duration: Duration) -> u64 {
    duration.as_nanos().min(u128::from(u64::MAX)) as u64
}

fn as_millis_u64(duration: Duration) -> u64 {
    duration.as_millis().min(u128::from(u64::MAX)) as u64
}

fn average(total_ns: u64, samples: u64) -> Duration {
    if samples == 0 {
        return Duration::ZERO;
    }
    Duration::from_nanos(total_ns / samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_waits_per_sample() {
        let metrics = LockMetrics::new();
        metrics.record_read_wait("test", Duration::from_micros(10));
        metrics.record_read_wait("test", Duration::from_micros(30));
        metrics.record_write_wait("test", Duration::from_micros(7));
        let stats = metrics.snapshot();
        assert_eq!(stats.read_wait_samples, 2);
        assert_eq!(stats.read_wait_avg, Duration::from_micros(20));
        assert_eq!(stats.write_wait_samples, 1);
        assert_eq!(stats.write_wait_avg, Duration::from_micros(7));
    }

    #[test]
    fn counts_sweeps_and_deferrals() {
        let metrics = LockMetrics::new();
        metrics.record_sweep(3);
        metrics.record_sweep(0);
        metrics.record_deferred_sweep();
        metrics.record_decay();
        let stats = metrics.snapshot();
        assert_eq!(stats.sweeps_completed, 2);
        assert_eq!(stats.obstacles_swept, 3);
        assert_eq!(stats.sweeps_deferred, 1);
        assert_eq!(stats.decay_cycles, 1);
    }

    #[test]
    fn empty_metrics_report_zero_averages() {
        let stats = LockMetrics::new().snapshot();
        assert_eq!(stats, LifetimeStats::default());
    }
}
