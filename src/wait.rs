use std::{cell::Cell, time::Duration};

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};

/// Fixed pause between consecutive requests. The first request goes out immediately.
#[derive(Clone, Debug)]
pub struct Waiter {
    duration: Duration,
    should_wait: Cell<bool>,
}

impl Waiter {
    pub fn new(duration: Duration) -> Self {
        Waiter {
            duration,
            should_wait: Cell::new(false),
        }
    }

    pub fn wait(&self) {
        if self.should_wait.replace(true) && !self.duration.is_zero() {
            std::thread::sleep(self.duration);
        }
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Waiter::new(Duration::from_millis(250))
    }
}

/// Longest single pause between fallback attempts.
const MAX_DELAY: Duration = Duration::from_secs(3600);

/// Exponential backoff: retry `n` waits `base^n` seconds.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    base: f64,
}

impl Backoff {
    pub fn new(base: f64) -> Self {
        Backoff { base }
    }

    /// Pauses before each of `retries` retries. A base that isn't a positive number never waits;
    /// a base below one waits that long every time.
    pub fn delays(&self, retries: usize) -> ExponentialBackoff {
        let builder = if self.base.is_finite() && self.base > 0.0 {
            let base = self.base.min(MAX_DELAY.as_secs_f64());
            ExponentialBuilder::default()
                .with_min_delay(Duration::from_secs_f64(base))
                .with_factor(base.max(1.0) as f32)
                .with_max_delay(MAX_DELAY)
        } else {
            ExponentialBuilder::default()
                .with_min_delay(Duration::ZERO)
                .with_factor(1.0)
        };
        builder.with_max_times(retries).build()
    }
}
