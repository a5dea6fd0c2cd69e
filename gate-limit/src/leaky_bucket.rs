use std::sync::Arc;

use parking_lot::Mutex;

use crate::Limiter;
use crate::clock::{Clock, SystemClock, Timestamp};
use crate::error::{ConfigError, validate_rates};

/// A leaky bucket limiter.
///
/// Requests fill the bucket, which drains at a constant `rate` per second;
/// a request is rejected when the bucket is full. Unlike [`TokenBucket`],
/// the bucket starts *empty* and fills up with admissions, which yields a
/// smooth output rate rather than a burst-then-refill pattern.
///
/// [`TokenBucket`]: crate::TokenBucket
#[derive(Debug)]
pub struct LeakyBucket {
    capacity: f64,
    rate: f64,
    state: Mutex<BucketState>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct BucketState {
    /// Queued units, kept within `[0, capacity]`.
    level: f64,
    last_update_at: Timestamp,
}

impl LeakyBucket {
    /// Creates a new leaky bucket. `capacity` is the maximum bucket size,
    /// `rate` is how many queued units drain per second.
    pub fn new(capacity: u32, rate: u32) -> Self {
        Self::with_clock(capacity, rate, Arc::new(SystemClock::new()))
    }

    /// Creates a new leaky bucket with a custom clock.
    pub fn with_clock(capacity: u32, rate: u32, clock: Arc<dyn Clock>) -> Self {
        Self::from_parts(f64::from(capacity), f64::from(rate), clock)
    }

    /// Creates a leaky bucket from float-valued capacity and rate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if either value is negative, NaN, or
    /// infinite.
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
                level: 0.0,
                last_update_at: now,
            }),
            clock,
        }
    }

    fn drain(&self, state: &mut BucketState) {
        let t = self.clock.now();
        // A backward clock step skips the update entirely.
        if t < state.last_update_at {
            return;
        }

        let elapsed = t.duration_since(state.last_update_at).as_secs_f64();
        state.level = (state.level - elapsed * self.rate).max(0.0);
        state.last_update_at = t;
    }
}

impl Limiter for LeakyBucket {
    fn allow(&self) -> bool {
        let mut state = self.state.lock();

        self.drain(&mut state);

        if state.level + 1.0 <= self.capacity {
            state.level += 1.0;

            return true;
        }

        false
    }
}
