use std::time::Duration;

use futures::future::BoxFuture;

/// Source of time for deferred work.
///
/// Delays are the only suspension point of a notifier, so swapping the timer swaps the
/// notion of time for everything scheduled on it.
pub trait Timer: Send + Sync + Clone + 'static {
    /// Monotonic time elapsed since the timer was created
    fn now(&self) -> Duration;
    /// A future resolving no earlier than `duration` after this call
    fn delay(&self, duration: Duration) -> BoxFuture<'static, ()>;
}
