use std::ops::ControlFlow;

use tokio::time::sleep;
use tracing::trace;

use crate::Reason;
use crate::Strategy;

/// Waits asynchronously until `strategy` grants a permission.
///
/// This is the async counterpart of [`Strategy::wait`]: it retries after the
/// `retry_after` reported by each denial, sleeping on the tokio timer instead
/// of blocking the thread. Dropping the future abandons the wait, so it can be
/// bounded with `tokio::time::timeout` or raced in `tokio::select!`.
pub async fn until_ready<S>(strategy: &S)
where
    S: Strategy + ?Sized,
{
    while let ControlFlow::Break(Reason::Overloaded { retry_after }) = strategy.try_acquire() {
        trace!(?retry_after, "waiting for permission");
        sleep(retry_after).await;
    }
}
