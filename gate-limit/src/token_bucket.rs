use std::sync::Arc;

use parking_lot::Mutex;

use crate::Limiter;
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::{ConfigError, validate_rates};

/// A token bucket limiter.
///
/// Allows a burst of requests up to `capacity`, then refills tokens
/// continuously at `rate` per second. The bucket starts full, so the first
/// `capacity` requests succeed before any refill contributes.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    rate: f64,
    state: Mutex<BucketState>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct BucketState {
    /// Stored tokens, kept within `[0, capacity]`.
    tokens: f64,
    last_refill_at: Timestamp,
}

impl TokenBucket {
    /// Creates a new token bucket. `capacity` is the maximum burst size,
    /// `rate` is tokens added per second.
    pub fn new(capacity: u32, rate: u32) -> Self {
        Self::with_clock(capacity, rate, Arc::new(SystemClock::new()))
    }

    /// Creates a new token bucket with a custom clock.
    pub fn with_clock(capacity: u32, rate: u32, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(f64::from(capacity), f64::from(rate), clock)
    }

    /// Creates a token bucket from float-valued capacity and rate, for
    /// callers that need fractional refill rates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either value is negative, NaN, or
    /// infinite. Zero values are legal: zero capacity always denies, zero
    /// rate freezes the bucket after its initial fill.
    pub fn try_from_rates(
        capacity: f64,
        rate: f64,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        validate_rates(capacity, rate)?;
        Ok(Self::from_parts(capacity, rate, clock))
    }

    fn from_parts(capacity: f64, rate: f64, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();

        Self {
            capacity,
            rate,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill_at: now,
            }),
            clock,
        }
    }

    fn refill(&self, state: &mut BucketState) {
        let t = self.clock.now();
        // A backward clock step skips the update entirely, leaving both
        // the tokens and the timestamp untouched.
        if t < state.last_refill_at {
            return;
        }

        let elapsed = t.duration_since(state.last_refill_at).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        state.last_refill_at = t;
    }
}

impl Limiter for TokenBucket {
    fn allow(&self) -> bool {
        let mut state = self.state.lock();

        self.refill(&mut state);

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;

            return true;
        }

        false
    }
}
