use std::time::Duration;

use crate::error::ConfigError;

/// How many permissions a limiter grants per interval.
///
/// A `Quota` is validated once at construction, so limiters built from it
/// never need to re-check their parameters on the hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quota {
    limit: u64,
    interval: Duration,
}

impl Quota {
    /// The longest supported interval (`u64::MAX` nanoseconds, roughly 584 years).
    pub const MAX_INTERVAL: Duration = Duration::from_nanos(u64::MAX);

    /// Creates a new `Quota`.
    ///
    /// # Arguments
    ///
    /// * `limit` - The maximum number of permissions granted per interval. A limit
    ///   of zero is valid and produces a limiter which denies every request.
    /// * `interval` - The window length.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `interval` is zero or longer than
    /// [`Quota::MAX_INTERVAL`].
    pub fn new(limit: u64, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if interval > Self::MAX_INTERVAL {
            return Err(ConfigError::IntervalTooLong {
                interval,
                max: Self::MAX_INTERVAL,
            });
        }
        Ok(Self { limit, interval })
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub(crate) fn interval_ns(&self) -> u64 {
        // Bounded by MAX_INTERVAL in new()
        self.interval.as_nanos() as u64
    }
}
