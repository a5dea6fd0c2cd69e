use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::Limiter;
use crate::clock::{Clock, SystemClock, Timestamp};

/// A sliding window limiter.
///
/// Records the timestamp of every admission and allows a request only if
/// fewer than `limit` admissions happened in the trailing `window`. Exact
/// where [`FixedWindow`] is approximate: entries expire individually, one
/// `window` after they were admitted, so there are no boundary bursts.
///
/// Memory is O(limit): expired entries are first skipped via a head index
/// and physically compacted once they make up half the log.
///
/// A backward clock step is not defended against; expiry is computed
/// relative to `now`, so time moving backward can only lengthen the
/// effective window and tighten the limit, never loosen it.
///
/// [`FixedWindow`]: crate::FixedWindow
#[derive(Debug)]
pub struct SlidingWindow {
    limit: u32,
    window: Duration,
    state: Mutex<Log>,
    clock: Arc<dyn Clock>,
}

#[derive(Debug)]
struct Log {
    /// Admission timestamps in arrival order.
    entries: Vec<Timestamp>,
    /// Index of the first entry not yet expired.
    head: usize,
}

impl SlidingWindow {
    /// Creates a new sliding window limiter allowing `limit` requests per
    /// trailing `window`. A zero `window` defaults to one second.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock::new()))
    }

    /// Creates a new sliding window limiter with a custom clock.
    pub fn with_clock(limit: u32, window: Duration, clock: Arc<dyn Clock>) -> Self {
        let window = if window.is_zero() {
            Duration::from_secs(1)
        } else {
            window
        };

        Self {
            limit,
            window,
            state: Mutex::new(Log {
                entries: Vec::new(),
                head: 0,
            }),
            clock,
        }
    }
}

impl Limiter for SlidingWindow {
    fn allow(&self) -> bool {
        let mut log = self.state.lock();

        let now = self.clock.now();
        let cutoff = now - self.window;

        // An entry admitted exactly `window` ago has just expired; live
        // entries are strictly newer than the cutoff.
        while log.head < log.entries.len() && log.entries[log.head] <= cutoff {
            log.head += 1;
        }

        // Compact once expired entries are at least half the log. This
        // keeps each admission amortized O(1).
        if log.head > 0 && log.head * 2 >= log.entries.len() {
            let head = log.head;
            log.entries.drain(..head);
            log.head = 0;
        }

        if log.entries.len() - log.head + 1 > self.limit as usize {
            return false;
        }

        log.entries.push(now);

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::ManualClock;

    fn manual_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Timestamp::from_nanos(
            1_000_000 * 1_000_000_000,
        )))
    }

    #[test]
    fn it_enforces_limits_over_the_trailing_window() {
        let clock = manual_clock();
        let limiter = SlidingWindow::with_clock(2, Duration::from_secs(60), clock.clone());

        assert!(limiter.allow());

        clock.advance(Duration::from_secs(30));
        assert!(limiter.allow());
        assert!(!limiter.allow());

        // At t=65s the entry from t=0 has expired, but t=30s has not.
        clock.advance(Duration::from_secs(35));
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn entries_expire_exactly_one_window_after_admission() {
        let clock = manual_clock();
        let limiter = SlidingWindow::with_clock(1, Duration::from_secs(60), clock.clone());

        assert!(limiter.allow());

        // One nanosecond before expiry the entry is still live.
        clock.advance(Duration::from_secs(60) - Duration::from_nanos(1));
        assert!(!limiter.allow());

        // At exactly admission + window it is gone.
        clock.advance(Duration::from_nanos(1));
        assert!(limiter.allow());
    }

    #[test]
    fn zero_limit_always_denies() {
        let clock = manual_clock();
        let limiter = SlidingWindow::with_clock(0, Duration::from_secs(1), clock.clone());

        assert!(!limiter.allow());
        clock.advance(Duration::from_secs(10));
        assert!(!limiter.allow());
    }

    #[test]
    fn zero_window_defaults_to_one_second() {
        let clock = manual_clock();
        let limiter = SlidingWindow::with_clock(1, Duration::ZERO, clock.clone());

        assert!(limiter.allow());
        assert!(!limiter.allow());

        clock.advance(Duration::from_secs(1));
        assert!(limiter.allow());
    }

    #[test]
    fn denial_does_not_consume_budget() {
        let clock = manual_clock();
        let limiter = SlidingWindow::with_clock(2, Duration::from_secs(60), clock.clone());

        assert!(limiter.allow());
        assert!(limiter.allow());

        // Hammering a full limiter records nothing, so the original
        // entries still expire on their own schedule.
        for _ in 0..100 {
            assert!(!limiter.allow());
        }

        clock.advance(Duration::from_secs(60));
        assert!(limiter.allow());
        assert!(limiter.allow());
        assert!(!limiter.allow());
    }

    #[test]
    fn log_stays_bounded_under_churn() {
        let clock = manual_clock();
        let limiter = SlidingWindow::with_clock(10, Duration::from_secs(1), clock.clone());

        // Admit for many windows' worth of traffic.
        for _ in 0..100 {
            let admitted = (0..20).filter(|_| limiter.allow()).count();
            assert_eq!(admitted, 10);
            clock.advance(Duration::from_secs(1));
        }

        let log = limiter.state.lock();
        // Compaction keeps the log within a small multiple of the limit.
        assert!(
            log.entries.len() <= 40,
            "log grew to {} entries",
            log.entries.len()
        );
    }

    #[test]
    fn backward_clock_only_tightens() {
        let clock = manual_clock();
        let limiter = SlidingWindow::with_clock(1, Duration::from_secs(60), clock.clone());

        assert!(limiter.allow());
        clock.advance(Duration::from_secs(61));
        assert!(limiter.allow());

        // Stepping back revives nothing and admits nothing extra; the
        // newest entry is simply further inside the window again.
        clock.retreat(Duration::from_secs(30));
        assert!(!limiter.allow());
    }

    #[test]
    fn concurrent_burst_admits_exactly_limit() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::thread;

        let clock = manual_clock();
        let limiter = Arc::new(SlidingWindow::with_clock(
            100,
            Duration::from_secs(3_600),
            clock,
        ));
        let admitted = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..200 {
            let limiter = Arc::clone(&limiter);
            let admitted = Arc::clone(&admitted);
            handles.push(thread::spawn(move || {
                if limiter.allow() {
                    admitted.fetch_add(1, Ordering::SeqCst);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 100);
    }
}
