//! Sleeper trait for deterministic timing in tests.
//!
//! The terminator's grace intervals go through this seam so tests can assert
//! the escalation timing without actually waiting.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

/// Trait for abstracting sleep operations.
pub trait Sleeper: Send + Sync {
    /// Sleep for the specified duration.
    fn sleep(&self, duration: Duration);
}

/// Production sleeper that uses `thread::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealSleeper;

impl Sleeper for RealSleeper {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Mock sleeper that records requested durations without sleeping.
#[derive(Debug, Default)]
pub struct MockSleeper {
    durations: Mutex<Vec<Duration>>,
}

impl MockSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every duration passed to [`Sleeper::sleep`], in call order.
    pub fn durations(&self) -> Vec<Duration> {
        self.durations.lock().unwrap().clone()
    }
}

impl Sleeper for MockSleeper {
    fn sleep(&self, duration: Duration) {
        self.durations.lock().unwrap().push(duration);
    }
}
