//! Playback time sources.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Monotonic time since the clock was created.
///
/// # Implementations
///
/// - **Interactive**: [`SystemClock`] - wraps `Instant`
/// - **Headless/tests**: [`ManualClock`] - advanced explicitly
pub trait PlaybackClock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Virtual clock that only moves when told to.
///
/// Clones share the same time, so a frame loop can advance the clock it
/// handed to its consumers.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed_ns: Arc<Mutex<u64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        let mut time = self.elapsed_ns.lock().unwrap_or_else(PoisonError::into_inner);
        *time = time.saturating_add(duration.as_nanos() as u64);
    }

    pub fn set(&self, elapsed: Duration) {
        let mut time = self.elapsed_ns.lock().unwrap_or_else(PoisonError::into_inner);
        *time = elapsed.as_nanos() as u64;
    }
}

impl PlaybackClock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(*self.elapsed_ns.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(Duration::from_millis(100));
        assert_eq!(clock.now(), Duration::from_millis(100));

        clock.set(Duration::from_secs(3));
        assert_eq!(clock.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let shared = clock.clone();
        clock.advance(Duration::from_secs(2));
        assert_eq!(shared.now(), Duration::from_secs(2));
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
