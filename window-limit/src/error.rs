use std::time::Duration;

/// Errors produced when building a limiter from invalid parameters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The window length was zero.
    ///
    /// Cycle indices are computed as `elapsed / interval`, so a zero interval
    /// has no meaning.
    #[error("interval must be greater than zero")]
    ZeroInterval,

    /// The window length does not fit in a `u64` count of nanoseconds.
    #[error("interval {interval:?} is too long; the maximum is {max:?}")]
    IntervalTooLong {
        /// The rejected interval.
        interval: Duration,
        /// The longest interval a limiter can represent.
        max: Duration,
    },
}

/// A multi-permission request that can never be satisfied.
///
/// A single window never holds more than `limit` permissions, so asking for
/// more than that would wait forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("requested {requested} permissions but a window only holds {limit}")]
pub struct InsufficientCapacity {
    pub requested: u64,
    pub limit: u64,
}
