use std::fmt;
use std::ops::{Add, Sub};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;

/// A point in time, measured in whole nanoseconds since the Unix epoch.
///
/// Epoch-based instants (rather than process-relative ones) let two
/// independently constructed [`FixedWindow`](crate::FixedWindow) limiters
/// agree on window boundaries.
///
/// Arithmetic saturates: subtracting past the epoch yields
/// [`Timestamp::EPOCH`], and `duration_since` an instant in the future
/// yields a zero duration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The zero instant, infinitely far in the past for rate limiting
    /// purposes.
    pub const EPOCH: Timestamp = Timestamp(0);

    pub const fn from_nanos(nanos: u64) -> Self {
        Timestamp(nanos)
    }

    pub const fn as_nanos(self) -> u64 {
        self.0
    }

    /// Elapsed time from `earlier` to `self`, or zero if `earlier` is later.
    pub fn duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_nanos(self.0.saturating_sub(earlier.0))
    }

    /// Rounds down to the nearest multiple of `window`, measured from the
    /// epoch. `window` must be non-zero.
    pub(crate) fn align_down(self, window: Duration) -> Timestamp {
        let w = window.as_nanos() as u64;
        Timestamp((self.0 / w) * w)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs.as_nanos() as u64))
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Timestamp;

    fn sub(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_sub(rhs.as_nanos() as u64))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}ns)", self.0)
    }
}

/// A time source.
///
/// Every limiter takes its clock at construction; production code uses
/// [`SystemClock`], tests inject a [`ManualClock`] to drive time
/// deterministically. Limiters read the clock while holding their state
/// lock, so decisions are linearizable with respect to the mutation.
pub trait Clock: fmt::Debug + Send + Sync {
    fn now(&self) -> Timestamp;
}

/// The production clock.
///
/// Reads come from a [`quanta::Clock`] calibrated once against
/// [`SystemTime`] at construction, so `now` is a cheap monotonic read that
/// still yields epoch-anchored values.
#[derive(Debug, Clone)]
pub struct SystemClock {
    inner: quanta::Clock,
    anchor: quanta::Instant,
    /// Wall-clock offset from the Unix epoch at `anchor`.
    epoch_offset: Duration,
}

impl SystemClock {
    pub fn new() -> Self {
        let inner = quanta::Clock::new();
        let anchor = inner.now();
        let epoch_offset = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);

        Self {
            inner,
            anchor,
            epoch_offset,
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let elapsed = self.inner.now().duration_since(self.anchor);
        Timestamp::EPOCH + (self.epoch_offset + elapsed)
    }
}

/// A hand-driven clock for tests.
///
/// Unlike a paused tokio runtime, this also moves *backward*
/// ([`ManualClock::retreat`]), which the bucket limiters must tolerate.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now + by;
    }

    pub fn retreat(&self, by: Duration) {
        let mut now = self.now.lock();
        *now = *now - by;
    }

    pub fn set(&self, to: Timestamp) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}
