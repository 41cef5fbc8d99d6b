//! Time source shared by floating-text spawns and the shader time uniform.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Monotonic seconds on one timeline.
pub trait HudClock: Send + Sync {
    fn now(&self) -> f32;
}

/// Seconds since construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl HudClock for MonotonicClock {
    fn now(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same reading, so a test can keep one handle and give the
/// other to the HUD.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU32>,
}

impl ManualClock {
    pub fn new(start: f32) -> Self {
        Self {
            bits: Arc::new(AtomicU32::new(start.to_bits())),
        }
    }

    pub fn set(&self, seconds: f32) {
        self.bits.store(seconds.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, seconds: f32) {
        self.set(self.now() + seconds);
    }
}

impl HudClock for ManualClock {
    fn now(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new(1.0);
        let handle = clock.clone();

        handle.advance(0.5);
        assert_eq!(clock.now(), 1.5);

        clock.set(10.0);
        assert_eq!(handle.now(), 10.0);
    }

    #[test]
    fn test_manual_clock_default_is_zero() {
        assert_eq!(ManualClock::default().now(), 0.0);
    }

    #[test]
    fn test_monotonic_clock_never_goes_back() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}
