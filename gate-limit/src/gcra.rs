use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Limiter;
use crate::clock::{Clock, SystemClock, Timestamp};

/// Generic Cell Rate Algorithm.
///
/// Tracks a single instant, the Theoretical Arrival Time: when the next
/// request "should" arrive under perfect pacing at `rate`. A request is
/// admitted if it does not run more than `burst` emission intervals ahead
/// of that schedule. Idle time accumulates as burst credit, capped at
/// `burst`. Originally designed for ATM networks; one timestamp encodes
/// both the steady-state rate and the burst budget.
#[derive(Debug)]
pub struct Gcra {
    /// Steady-state spacing between admitted requests, `1 / rate`.
    emission: Duration,
    /// How far ahead of schedule a request may run, `emission * burst`.
    burst_tolerance: Duration,
    /// Theoretical Arrival Time. Starts at the epoch so the first burst
    /// always succeeds.
    tat: Mutex<Timestamp>,
    clock: Arc<dyn Clock>,
}

impl Gcra {
    /// Creates a new GCRA limiter. `rate` is requests per second, `burst`
    /// is how many requests can be made instantly.
    ///
    /// A non-positive or non-finite `rate` is treated as 1, as is a zero
    /// `burst`.
    pub fn new(rate: f64, burst: u32) -> Self {
        Self::with_clock(rate, burst, Arc::new(SystemClock::new()))
    }

    /// Creates a new GCRA limiter with a custom clock.
    pub fn with_clock(rate: f64, burst: u32, clock: Arc<dyn Clock>) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 {
            rate
        } else {
            1.0
        };
        let burst = burst.max(1);

        let emission = Duration::from_secs_f64(1.0 / rate);

        Self {
            emission,
            burst_tolerance: emission * burst,
            tat: Mutex::new(Timestamp::EPOCH),
            clock,
        }
    }
}

impl Limiter for Gcra {
    fn allow(&self) -> bool {
        let mut tat = self.tat.lock();

        let now = self.clock.now();
        let new_tat = (*tat).max(now) + self.emission;

        // Too far ahead of schedule; reject without advancing the TAT.
        let allow_at = new_tat - self.burst_tolerance;
        if allow_at > now {
            return false;
        }

        *tat = new_tat;

        true
    }
}
