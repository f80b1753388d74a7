//! Connection rate limiting
//!
//! Projectors lock up when connections arrive back to back, so physical
//! connect attempts are spaced by a fixed floor.

use std::thread;
use std::time::{Duration, Instant};

/// Enforces a minimum spacing between connect attempts
#[derive(Debug)]
pub struct RateLimiter {
    min_spacing: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_spacing: Duration) -> Self {
        Self {
            min_spacing,
            last: None,
        }
    }

    /// Sleep until `min_spacing` has passed since the previous call, then
    /// record this call as the latest attempt
    pub fn wait(&mut self) {
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < self.min_spacing {
                let remaining = self.min_spacing - elapsed;
                tracing::debug!("Rate limiting connect for {:?}", remaining);
                thread::sleep(remaining);
            }
        }
        self.last = Some(Instant::now());
    }

    /// Time of the most recent attempt
    pub fn last_attempt(&self) -> Option<Instant> {
        self.last
    }
}
