use std::{
    fmt,
    sync::atomic::{AtomicU32, Ordering},
    time::Duration,
};

/// Remaining lifetime at or below which an obstacle counts as expired.
pub const EXPIRY_EPSILON: f32 = f32::EPSILON;

/// Lock-free countdown of the seconds an obstacle has left to live.
///
/// The value is stored as the bit pattern of an `f32` so that readers and the
/// lifetime worker never contend on a lock. It only ever decreases and never
/// drops below zero.
pub struct Lifetime {
    bits: AtomicU32,
}

impl Lifetime {
    /// Creates a lifetime holding the provided number of seconds.
    ///
    /// Negative and NaN inputs start out expired.
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        let seconds = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
        Self {
            bits: AtomicU32::new(seconds.to_bits()),
        }
    }

    /// Seconds left before the obstacle expires.
    #[must_use]
    pub fn remaining(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Reports whether the remaining lifetime reached the expiry threshold.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining() <= EXPIRY_EPSILON
    }

    /// Subtracts the elapsed time, flooring the result at zero.
    pub fn decrement(&self, elapsed: Duration) {
        let seconds = elapsed.as_secs_f32();
        if seconds <= 0.0 {
            return;
        }

        let _ = self
            .bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let current = f32::from_bits(bits);
                let next = (current - seconds).max(0.0);
                (next < current).then(|| next.to_bits())
            });
    }
}

impl fmt::Debug for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Lifetime").field(&self.remaining()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn decrement_floors_at_zero() {
        let lifetime = Lifetime::new(1.0);
        lifetime.decrement(Duration::from_millis(400));
        assert!((lifetime.remaining() - 0.6).abs() < 1e-6);
        lifetime.decrement(Duration::from_secs(5));
        assert_eq!(lifetime.remaining(), 0.0);
        assert!(lifetime.is_expired());
    }

    #[test]
    fn expiry_threshold_is_inclusive() {
        assert!(Lifetime::new(EXPIRY_EPSILON).is_expired());
        assert!(!Lifetime::new(EXPIRY_EPSILON * 4.0).is_expired());
        assert!(Lifetime::new(0.0).is_expired());
    }

    #[test]
    fn invalid_initial_values_start_expired() {
        assert!(Lifetime::new(-3.0).is_expired());
        assert!(Lifetime::new(f32::NAN).is_expired());
    }

    #[test]
    fn zero_elapsed_leaves_value_untouched() {
        let lifetime = Lifetime::new(2.5);
        lifetime.decrement(Duration::ZERO);
        assert_eq!(lifetime.remaining(), 2.5);
    }

    #[test]
    fn concurrent_decrements_never_underflow() {
        let lifetime = Arc::new(Lifetime::new(1.0));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifetime = Arc::clone(&lifetime);
                thread::spawn(move || {
                    let mut previous = lifetime.remaining();
                    for _ in 0..1_000 {
                        lifetime.decrement(Duration::from_millis(1));
                        let current = lifetime.remaining();
                        assert!(current <= previous);
                        assert!(current >= 0.0);
                        previous = current;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("decrementing thread panicked");
        }
        assert_eq!(lifetime.remaining(), 0.0);
    }
}
