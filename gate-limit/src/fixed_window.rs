use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Limiter;
use crate::clock::{Clock, SystemClock, Timestamp};

/// A fixed window limiter.
///
/// Divides time into windows aligned to epoch-multiples of `window` and
/// counts admissions per window. Cheapest of the strategies, but
/// susceptible to boundary bursts: up to double the limit can pass in a
/// short span straddling two windows.
///
/// Windows are aligned to the Unix epoch, not to construction time, so
/// two limiters with the same `window` agree on window boundaries.
///
/// A backward clock step into a prior window resets the counter, briefly
/// loosening the limit by at most one window's worth. This is tolerated
/// rather than defended against.
#[derive(Debug)]
pub struct FixedWindow {
    limit: u32,
    window: Duration,
    state: Mutex<WindowState>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct WindowState {
    /// Admissions in the current window, kept within `[0, limit]`.
    count: u32,
    /// Epoch-aligned start of the current window.
    start: Timestamp,
}

impl FixedWindow {
    /// Creates a new fixed window limiter allowing `limit` requests per
    /// `window`. A zero `window` defaults to one second.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock::new()))
    }

    /// Creates a new fixed window limiter with a custom clock.
    pub fn with_clock(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let window = if window.is_zero() {
            Duration::from_secs(1)
        } else {
            window
        };

        let start = clock.now().align_down(window);

        Self {
            limit,
            window,
            state: Mutex::new(WindowState { count: 0, start }),
            clock,
        }
    }
}

impl Limiter for FixedWindow {
    fn allow(&self) -> bool {
        let mut state = self.state.lock();

        let ws = self.clock.now().align_down(self.window);
        if ws != state.start {
            state.start = ws;
            state.count = 0;
        }

        if state.count < self.limit {
            state.count += 1;

            return true;
        }

        false
    }
}
