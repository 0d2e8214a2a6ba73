use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::time::Duration;

use parking_lot::Mutex;
use quanta::Clock;
use quanta::Instant;
use tracing::debug;
use tracing::trace;

use crate::Reason;
use crate::Strategy;
use crate::error::ConfigError;
use crate::quota::Quota;

/// Large limits grow the log on demand rather than reserving it up front.
const INITIAL_LOG_CAPACITY: u64 = 1024;

/// A sliding log limiter.
///
/// Remembers the time of the last `limit` grants. A request is allowed when
/// fewer than `limit` grants happened within the trailing `interval`, so unlike
/// [`FixedWindow`](crate::FixedWindow) there are no boundary bursts: any span of
/// `interval` contains at most `limit` grants.
///
/// The log is protected by a `Mutex`, which makes this the simpler (but
/// contended) alternative to the lock-free fixed window.
#[derive(Debug)]
pub struct SlidingLog {
    quota: Quota,
    interval: Duration,
    /// Grant times, oldest first. Never longer than the limit.
    log: Mutex<VecDeque<Instant>>,
    clock: Clock,
}

impl Strategy for SlidingLog {
    fn try_acquire(&self) -> ControlFlow<Reason> {
        let limit = self.quota.limit();
        if limit == 0 {
            return ControlFlow::Break(Reason::Overloaded {
                retry_after: self.interval,
            });
        }

        let mut log = self.log.lock();
        let now = self.clock.now();

        if log.len() as u64 >= limit
            && let Some(&oldest) = log.front()
        {
            let age = now.duration_since(oldest);
            if age < self.interval {
                let retry_after = self.interval - age;
                trace!(?retry_after, "sliding log full");
                return ControlFlow::Break(Reason::Overloaded { retry_after });
            }
            log.pop_front();
        }

        log.push_back(now);
        ControlFlow::Continue(())
    }
}

impl SlidingLog {
    /// Creates a new `SlidingLog` strategy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `interval` is zero or too long.
    pub fn new(limit: u64, interval: Duration) -> Result<Self, ConfigError> {
        Ok(Self::from_quota(Quota::new(limit, interval)?))
    }

    pub fn from_quota(quota: Quota) -> Self {
        Self::with_clock(quota, Clock::new())
    }

    pub fn with_clock(quota: Quota, clock: Clock) -> Self {
        debug!(
            limit = quota.limit(),
            interval = ?quota.interval(),
            "created sliding log limiter"
        );
        Self {
            quota,
            interval: quota.interval(),
            log: Mutex::new(VecDeque::with_capacity(
                quota.limit().min(INITIAL_LOG_CAPACITY) as usize,
            )),
            clock,
        }
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn mocked(limit: u64, interval: Duration) -> (SlidingLog, Arc<quanta::Mock>) {
        let (clock, mock) = Clock::mock();
        let quota = Quota::new(limit, interval).unwrap();
        (SlidingLog::with_clock(quota, clock), mock)
    }

    #[test]
    fn it_enforces_limits_without_sleep() {
        let rl = SlidingLog::new(100, Duration::from_secs(10)).unwrap();

        let mut count = 0;
        for _i in 0..500 {
            if rl.try_acquire().is_continue() {
                count += 1;
            }
        }
        assert_eq!(count, 100);
    }

    #[test]
    fn it_reports_age_of_oldest_grant() {
        let (rl, mock) = mocked(2, Duration::from_secs(1));

        let _ = rl.try_acquire(); // t = 0
        mock.increment(Duration::from_millis(300));
        let _ = rl.try_acquire(); // t = 300ms
        mock.increment(Duration::from_millis(100));

        assert_eq!(
            rl.try_acquire(),
            ControlFlow::Break(Reason::Overloaded {
                retry_after: Duration::from_millis(600)
            })
        );
    }

    #[test]
    fn it_slides_instead_of_resetting() {
        let (rl, mock) = mocked(2, Duration::from_secs(1));

        let _ = rl.try_acquire(); // t = 0
        mock.increment(Duration::from_millis(500));
        let _ = rl.try_acquire(); // t = 500ms

        // The first grant has aged out, the second has not
        mock.increment(Duration::from_millis(500));
        assert!(rl.try_acquire().is_continue());
        assert!(rl.try_acquire().is_break());

        mock.increment(Duration::from_millis(500));
        assert!(rl.try_acquire().is_continue());
        assert!(rl.try_acquire().is_break());
    }

    #[test]
    fn test_prevents_double_burst() {
        let (rl, mock) = mocked(100, Duration::from_millis(100));

        for _ in 0..100 {
            let _ = rl.try_acquire();
        }

        // Well into what a fixed window would call the next window
        mock.increment(Duration::from_millis(99));
        assert!(rl.try_acquire().is_break());
    }

    #[test]
    fn it_accepts_huge_limits() {
        let (rl, _mock) = mocked(u64::MAX, Duration::from_secs(1));

        for _ in 0..2000 {
            assert!(rl.try_acquire().is_continue());
        }
        assert_eq!(rl.log.lock().len(), 2000);
    }

    #[test]
    fn it_denies_everything_with_zero_limit() {
        let rl = SlidingLog::new(0, Duration::from_millis(20)).unwrap();

        assert_eq!(
            rl.try_acquire(),
            ControlFlow::Break(Reason::Overloaded {
                retry_after: Duration::from_millis(20)
            })
        );
    }

    #[test]
    fn test_sliding_log_concurrency() {
        use std::thread;

        let capacity = 100;
        let rl = Arc::new(SlidingLog::new(capacity, Duration::from_secs(60)).unwrap());

        let mut handles = vec![];
        for _ in 0..capacity * 2 {
            let rl_clone = Arc::clone(&rl);
            handles.push(thread::spawn(move || rl_clone.try_acquire()));
        }

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let success_count = results.iter().filter(|r| r.is_continue()).count();

        assert_eq!(success_count as u64, capacity);
        assert_eq!(rl.log.lock().len() as u64, capacity);
    }
}
