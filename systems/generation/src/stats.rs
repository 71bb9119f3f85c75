use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

/// Point-in-time view of the generator's throughput counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationStats {
    /// Batches completed by the pool.
    pub batches: u64,
    /// Obstacles produced across every batch.
    pub total_generated: u64,
    /// Mean time spent per generated obstacle.
    pub average_generation_time: Duration,
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    batches: AtomicU64,
    generated: AtomicU64,
    elapsed_ns: AtomicU64,
}

impl StatsRecorder {
    pub(crate) fn record(&self, generated: usize, elapsed: Duration) {
        let _ = self.batches.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .generated
            .fetch_add(generated as u64, Ordering::Relaxed);
        let elapsed_ns = elapsed.as_nanos().min(u128::from(u64::MAX)) as u64;
        let _ = self.elapsed_ns.fetch_add(elapsed_ns, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> GenerationStats {
        let total_generated = self.generated.load(Ordering::Relaxed);
        let elapsed_ns = self.elapsed_ns.load(Ordering::Relaxed);
        let average_generation_time = if total_generated == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(elapsed_ns / total_generated)
        };
        GenerationStats {
            batches: self.batches.load(Ordering::Relaxed),
            total_generated,
            average_generation_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_time_per_obstacle() {
        let recorder = StatsRecorder::default();
        recorder.record(4, Duration::from_micros(40));
        recorder.record(6, Duration::from_micros(60));
        let stats = recorder.snapshot();
        assert_eq!(stats.batches, 2);
        assert_eq!(stats.total_generated, 10);
        assert_eq!(stats.average_generation_time, Duration::from_micros(10));
    }

    #[test]
    fn empty_batches_do_not_divide_by_zero() {
        let recorder = StatsRecorder::default();
        recorder.record(0, Duration::from_micros(5));
        assert_eq!(recorder.snapshot().average_generation_time, Duration::ZERO);
    }
}
