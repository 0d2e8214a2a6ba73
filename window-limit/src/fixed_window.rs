use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use quanta::Clock;
use quanta::Instant;
use tracing::debug;
use tracing::trace;

use crate::Reason;
use crate::Strategy;
use crate::error::ConfigError;
use crate::error::InsufficientCapacity;
use crate::quota::Quota;

/// An immutable snapshot of the limiter. Replaced wholesale, never mutated.
#[derive(Debug)]
struct WindowState {
    /// The window index `permissions` is valid for.
    cycle: u64,
    permissions: u64,
}

/// A lock-free fixed window limiter.
///
/// Time is divided into non-overlapping windows of `interval`, counted from the
/// moment the limiter is created. Each window holds `limit` permissions. Unused
/// permissions do not carry over: however many windows pass while idle, the
/// next window starts with exactly `limit`.
///
/// The whole state is a single `{cycle, permissions}` snapshot published through
/// an atomic pointer swap. Callers race to replace the snapshot they observed,
/// and a permission is granted only to the caller whose compare-and-swap wins,
/// so no permission is ever handed out twice.
///
/// Like any fixed window, a burst of up to `2 * limit` can pass in a short
/// period spanning a window boundary.
#[derive(Debug)]
pub struct FixedWindow {
    quota: Quota,
    limit: u64,
    interval_ns: u64,
    state: ArcSwap<WindowState>,
    clock: Clock,
    anchor: Instant,
}

impl Strategy for FixedWindow {
    #[inline]
    fn try_acquire(&self) -> ControlFlow<Reason> {
        self.acquire(1)
    }
}

impl FixedWindow {
    /// Creates a new `FixedWindow` strategy.
    ///
    /// # Arguments
    ///
    /// * `limit` - The maximum number of permissions granted within a single window.
    /// * `interval` - The duration of the fixed time window.
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

    /// Creates a `FixedWindow` which reads time from `clock`.
    ///
    /// The first window starts at the current time of `clock`.
    pub fn with_clock(quota: Quota, clock: Clock) -> Self {
        let anchor = clock.now();
        debug!(
            limit = quota.limit(),
            interval = ?quota.interval(),
            "created fixed window limiter"
        );
        Self {
            quota,
            limit: quota.limit(),
            interval_ns: quota.interval_ns(),
            state: ArcSwap::from_pointee(WindowState {
                cycle: 0,
                permissions: quota.limit(),
            }),
            clock,
            anchor,
        }
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Attempts to acquire `n` permissions at once.
    ///
    /// Either all `n` permissions are granted or none are. Acquiring zero
    /// permissions always succeeds and leaves the limiter untouched.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientCapacity`] if `n` exceeds the limit, since such a
    /// request could never be granted.
    pub fn try_acquire_n(&self, n: u64) -> Result<ControlFlow<Reason>, InsufficientCapacity> {
        if n > self.limit {
            return Err(InsufficientCapacity {
                requested: n,
                limit: self.limit,
            });
        }
        if n == 0 {
            return Ok(ControlFlow::Continue(()));
        }
        Ok(self.acquire(n))
    }

    /// Blocks the current thread until `n` permissions have been acquired.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientCapacity`] if `n` exceeds the limit.
    pub fn wait_n(&self, n: u64) -> Result<(), InsufficientCapacity> {
        while let ControlFlow::Break(Reason::Overloaded { retry_after }) =
            self.try_acquire_n(n)?
        {
            std::thread::sleep(retry_after);
        }
        Ok(())
    }

    fn acquire(&self, n: u64) -> ControlFlow<Reason> {
        let mut previous = self.state.load();
        let mut attempt: u32 = 0;

        loop {
            let now = self.clock.now().duration_since(self.anchor).as_nanos() as u64;
            // Never step back into a window another caller has already left.
            let cycle = (now / self.interval_ns).max(previous.cycle);

            let elapsed = cycle - previous.cycle;
            let refilled = if elapsed > 0 {
                previous
                    .permissions
                    .saturating_add(elapsed.saturating_mul(self.limit))
                    .min(self.limit)
            } else {
                previous.permissions
            };

            if refilled < n {
                // The next window always starts with the full limit, and n never
                // exceeds the limit, so the next boundary is the earliest retry.
                let next_cycle_start = cycle.saturating_add(1).saturating_mul(self.interval_ns);
                let retry_after = Duration::from_nanos(next_cycle_start.saturating_sub(now));
                trace!(
                    cycle,
                    permissions = refilled,
                    requested = n,
                    ?retry_after,
                    "window exhausted"
                );
                return ControlFlow::Break(Reason::Overloaded { retry_after });
            }

            let candidate = Arc::new(WindowState {
                cycle,
                permissions: refilled - n,
            });
            let current = self.state.compare_and_swap(&*previous, candidate);
            if Arc::ptr_eq(&*previous, &*current) {
                return ControlFlow::Continue(());
            }

            attempt += 1;
            trace!(attempt, "lost race publishing window state, retrying");
            previous = current;
        }
    }
}
