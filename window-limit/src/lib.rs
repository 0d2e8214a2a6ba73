//! # window-limit
//!
//! `window-limit` provides in-memory rate limiters that cap the number of
//! permissions granted to `limit` per `interval`.
//!
//! ## Core Philosophy
//!
//! Most rate limiters rely on a `Mutex` to protect internal state, which creates a bottleneck
//! under high thread contention. [`FixedWindow`] keeps its whole state in one immutable
//! snapshot and publishes replacements with a single atomic Compare-And-Swap (CAS), so callers
//! never block each other and no permission is ever granted twice.
//!
//! ## Key Concepts
//!
//! * **Lock-Free**: No `Mutex` or `RwLock` in the [`FixedWindow`] hot path.
//! * **Lazy Evaluation**: Windows are recalculated at the moment of the request,
//!   eliminating the need for background worker threads or timers.
//! * **Strategy Trait**: A unified interface for different limiting algorithms. [`SlidingLog`]
//!   is a mutex-protected alternative with sliding, rather than fixed, windows.
//! * **No Smoothing**: Neither strategy spreads permissions across a window or ramps up
//!   gradually. A full window's worth may be consumed in a single burst.
//!
//! Time is read from a monotonic [`quanta::Clock`], so wall clock adjustments do not affect
//! window boundaries. State lives only in memory and is never shared between processes.
//!
//! ## Example
//!
//! ```rust
//! use window_limit::FixedWindow;
//! use window_limit::Strategy;
//! use std::time::Duration;
//!
//! let limiter = FixedWindow::new(100, Duration::from_secs(60)).unwrap();
//!
//! if limiter.try_acquire().is_continue() {
//!     // Request allowed
//! }
//!
//! // Block until a permission is available
//! limiter.wait();
//! ```
//!
//! ## Feature Flags
//!
//! - `tokio` (default): Enables [`until_ready`], an async wait built on the tokio timer.

use std::fmt::Debug;
use std::ops::ControlFlow;
use std::time::Duration;

mod error;
mod fixed_window;
mod quota;
mod sliding_log;
#[cfg(feature = "tokio")]
mod until_ready;


pub use error::ConfigError;
pub use error::InsufficientCapacity;
pub use fixed_window::FixedWindow;
pub use quota::Quota;
pub use sliding_log::SlidingLog;
#[cfg(feature = "tokio")]
pub use until_ready::until_ready;

/// Reasons why a request might be rejected by a strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// No permission is available now.
    ///
    /// `retry_after` is the time until one may become available.
    Overloaded { retry_after: Duration },
}

/// The core trait for all rate-limiting algorithms.
///
/// Strategies must be `Send` and `Sync` to allow sharing across thread boundaries
/// via `Arc`.
pub trait Strategy: Debug {
    /// Attempts to acquire a single permission.
    ///
    /// This method never blocks or sleeps.
    ///
    /// # Errors
    ///
    /// Returns `Reason` if the rate limit has been reached.
    fn try_acquire(&self) -> ControlFlow<Reason>;

    /// Blocks the current thread until a permission has been acquired.
    ///
    /// Waiters are not served in any particular order. After each denial the
    /// thread sleeps for the reported `retry_after` and tries again; whichever
    /// caller wins the next attempt gets the permission.
    fn wait(&self) {
        while let ControlFlow::Break(Reason::Overloaded { retry_after }) = self.try_acquire() {
            std::thread::sleep(retry_after);
        }
    }
}
