use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
};

use settle_traits::{Settlement, SettlementState};
use tracing::trace;

type Callback<T, E> = Box<dyn FnOnce(Result<T, E>) + Send>;

/// A single-assignment container for the eventual outcome of an asynchronous operation.
///
/// Clones observe the same outcome. Only the paired [`Resolver`] can settle it, and only the
/// first settlement sticks. Awaiting it yields a clone of the outcome.
pub struct DeferredResult<T, E> {
    shared: Arc<Mutex<Shared<T, E>>>,
}

/// The write side of a [`DeferredResult`]
pub struct Resolver<T, E> {
    shared: Arc<Mutex<Shared<T, E>>>,
}

struct Shared<T, E> {
    settlement: Settlement<T, E>,
    wakers: Vec<Waker>,
    callbacks: Vec<Callback<T, E>>,
}

impl<T, E> DeferredResult<T, E> {
    /// Create a pending result and the only handle able to settle it
    pub fn pending() -> (Self, Resolver<T, E>) {
        let shared = Arc::new(Mutex::new(Shared {
            settlement: Settlement::Pending,
            wakers: vec![],
            callbacks: vec![],
        }));
        (
            Self {
                shared: shared.clone(),
            },
            Resolver { shared },
        )
    }

    pub fn fulfilled(value: T) -> Self {
        Self::settled(Settlement::Fulfilled(value))
    }

    pub fn rejected(error: E) -> Self {
        Self::settled(Settlement::Rejected(error))
    }

    fn settled(settlement: Settlement<T, E>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                settlement,
                wakers: vec![],
                callbacks: vec![],
            })),
        }
    }

    pub fn state(&self) -> SettlementState {
        lock(&self.shared).settlement.state()
    }

    pub fn is_pending(&self) -> bool {
        self.state() == SettlementState::Pending
    }
}

impl<T: Clone, E: Clone> DeferredResult<T, E> {
    /// Snapshot of the current settlement
    pub fn settlement(&self) -> Settlement<T, E> {
        lock(&self.shared).settlement.clone()
    }

    /// The outcome, or None while pending
    pub fn outcome(&self) -> Option<Result<T, E>> {
        self.settlement().into_result()
    }

    /// Invoke `callback` exactly once with the outcome. Runs immediately when already settled,
    /// otherwise on the resolver's call stack at settlement time.
    pub fn on_settled<F>(&self, callback: F)
    where
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let mut shared = lock(&self.shared);
        if shared.settlement.is_pending() {
            shared.callbacks.push(Box::new(callback));
            return;
        }
        let outcome = shared.settlement.clone().into_result();
        drop(shared);
        if let Some(outcome) = outcome {
            callback(outcome);
        }
    }

    /// Chain a transformation of the fulfilled value. Rejections pass through untouched.
    ///
    /// Takes `self` by value so it is picked over `FutureExt::then` when the futures prelude
    /// is in scope. Clone first to keep a handle on this result.
    pub fn then<U, F>(self, f: F) -> DeferredResult<U, E>
    where
        U: Clone + Send + 'static,
        E: Send + 'static,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        let (next, resolver) = DeferredResult::pending();
        self.on_settled(move |outcome| {
            resolver.settle(outcome.and_then(f));
        });
        next
    }

    /// Recover from a rejection. Fulfilled values pass through untouched.
    pub fn catch<E2, F>(self, f: F) -> DeferredResult<T, E2>
    where
        T: Send + 'static,
        E2: Clone + Send + 'static,
        F: FnOnce(E) -> Result<T, E2> + Send + 'static,
    {
        let (next, resolver) = DeferredResult::pending();
        self.on_settled(move |outcome| {
            resolver.settle(outcome.or_else(f));
        });
        next
    }

    /// Run `f` once this result settles either way, then pass the outcome on unchanged
    pub fn finally<F>(self, f: F) -> DeferredResult<T, E>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: FnOnce() + Send + 'static,
    {
        let (next, resolver) = DeferredResult::pending();
        self.on_settled(move |outcome| {
            f();
            resolver.settle(outcome);
        });
        next
    }
}

impl<T, E> Clone for DeferredResult<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> fmt::Debug for DeferredResult<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredResult")
            .field("state", &self.state())
            .finish()
    }
}

impl<T: Clone, E: Clone> Future for DeferredResult<T, E> {
    type Output = Result<T, E>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let mut shared = lock(&self.shared);
        if let Some(outcome) = shared.settlement.as_result() {
            return Poll::Ready(outcome.map(T::clone).map_err(E::clone));
        }
        if !shared.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            shared.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T: Clone, E: Clone> Resolver<T, E> {
    /// Fulfil the result. Returns false if it was already settled.
    pub fn resolve(&self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Reject the result. Returns false if it was already settled.
    pub fn reject(&self, error: E) -> bool {
        self.settle(Err(error))
    }

    /// Settle with an outcome. Only the first call has an effect.
    pub fn settle(&self, outcome: Result<T, E>) -> bool {
        let mut shared = lock(&self.shared);
        if !shared.settlement.is_pending() {
            trace!(state = ?shared.settlement.state(), "ignoring repeated settlement");
            return false;
        }
        shared.settlement = outcome.clone().into();
        trace!(state = ?shared.settlement.state(), "settled");
        let wakers = std::mem::take(&mut shared.wakers);
        let callbacks = std::mem::take(&mut shared.callbacks);
        drop(shared);
        wakers.into_iter().for_each(Waker::wake);
        for callback in callbacks {
            callback(outcome.clone());
        }
        true
    }
}

impl<T, E> Resolver<T, E> {
    pub fn is_settled(&self) -> bool {
        !lock(&self.shared).settlement.is_pending()
    }

    /// A second handle on the same single write, for joining several sources into one result.
    /// Whichever handle settles first wins.
    pub(crate) fn share(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("settled", &self.is_settled())
            .finish()
    }
}

fn lock<T, E>(shared: &Mutex<Shared<T, E>>) -> MutexGuard<'_, Shared<T, E>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::{FutureExt, TryFutureExt};

    use super::*;

    #[test]
    fn settles_exactly_once() {
        let (deferred, resolver) = DeferredResult::<&str, &str>::pending();
        assert!(deferred.is_pending());
        assert!(deferred.outcome().is_none());
        assert!(resolver.resolve("done"));
        assert!(!resolver.reject("late"));
        assert!(!resolver.resolve("again"));
        assert_eq!(deferred.state(), SettlementState::Fulfilled);
        assert_eq!(deferred.outcome(), Some(Ok("done")));
    }

    #[test]
    fn rejection_is_terminal() {
        let (deferred, resolver) = DeferredResult::<u8, String>::pending();
        assert!(resolver.reject("boom".to_owned()));
        assert!(!resolver.resolve(1));
        assert!(resolver.is_settled());
        assert_eq!(
            deferred.settlement(),
            Settlement::Rejected("boom".to_owned())
        );
    }

    #[test]
    fn callbacks_run_once_on_settlement() {
        let (deferred, resolver) = DeferredResult::<u8, ()>::pending();
        let seen = Arc::new(Mutex::new(vec![]));
        for tag in ["first", "second"] {
            let seen = seen.clone();
            deferred.on_settled(move |outcome| seen.lock().unwrap().push((tag, outcome)));
        }
        assert!(seen.lock().unwrap().is_empty());
        resolver.resolve(7);
        resolver.resolve(8);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", Ok(7)), ("second", Ok(7))]
        );
    }

    #[test]
    fn late_callbacks_run_immediately() {
        let deferred = DeferredResult::<u8, &str>::rejected("nope");
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        deferred.on_settled(move |outcome| *sink.lock().unwrap() = Some(outcome));
        assert_eq!(*seen.lock().unwrap(), Some(Err("nope")));
    }

    #[test]
    fn then_maps_values_and_forwards_errors() {
        let check = |v: u32| {
            if v > 10 {
                Err(format!("{v} too large"))
            } else {
                Ok(v)
            }
        };
        let (deferred, resolver) = DeferredResult::<u32, String>::pending();
        let doubled = deferred.then(|v| Ok(v * 2));
        let checked = doubled.clone().then(check);
        resolver.resolve(4);
        assert_eq!(doubled.outcome(), Some(Ok(8)));
        assert_eq!(checked.outcome(), Some(Ok(8)));

        let (deferred, resolver) = DeferredResult::<u32, String>::pending();
        let rejected = deferred.then(|v| Ok(v * 2)).then(check);
        resolver.resolve(6);
        assert_eq!(rejected.outcome(), Some(Err("12 too large".to_owned())));

        let failed = DeferredResult::<u32, String>::rejected("upstream".to_owned());
        let mapped = failed.then(|v| Ok(v + 1));
        assert_eq!(mapped.outcome(), Some(Err("upstream".to_owned())));
    }

    #[test]
    fn catch_recovers_and_passes_values_through() {
        let recovered = DeferredResult::<u32, String>::rejected("Failed to fetch".to_owned())
            .catch(|e| Ok::<_, ()>(e.len() as u32));
        assert_eq!(recovered.outcome(), Some(Ok(15)));

        let still_failing = DeferredResult::<u32, String>::rejected("offline".to_owned())
            .catch(|e| Err::<u32, _>(format!("retry failed: {e}")));
        assert_eq!(
            still_failing.outcome(),
            Some(Err("retry failed: offline".to_owned()))
        );

        let (deferred, resolver) = DeferredResult::<u32, String>::pending();
        let untouched = deferred.catch(|_| Ok::<_, ()>(0));
        resolver.resolve(9);
        assert_eq!(untouched.outcome(), Some(Ok(9)));
    }

    #[test]
    fn finally_runs_on_either_outcome() {
        let runs = Arc::new(Mutex::new(0));
        let (ok, resolve_ok) = DeferredResult::<&str, &str>::pending();
        let (bad, resolve_bad) = DeferredResult::<&str, &str>::pending();
        let chained: Vec<_> = [ok, bad]
            .into_iter()
            .map(|deferred| {
                let runs = runs.clone();
                deferred.finally(move || *runs.lock().unwrap() += 1)
            })
            .collect();
        assert_eq!(*runs.lock().unwrap(), 0);
        resolve_ok.resolve("Operation successful");
        resolve_bad.reject("Operation failed");
        assert_eq!(*runs.lock().unwrap(), 2);
        assert_eq!(chained[0].outcome(), Some(Ok("Operation successful")));
        assert_eq!(chained[1].outcome(), Some(Err("Operation failed")));
    }

    #[test]
    fn chaining_ignores_the_futures_prelude() {
        // FutureExt and TryFutureExt are both in scope here
        let chained = DeferredResult::<u32, String>::fulfilled(2)
            .then(|v| Ok(v + 1))
            .catch(|_| Ok::<_, String>(0))
            .finally(|| {});
        assert_eq!(chained.outcome(), Some(Ok(3)));
    }

    #[test]
    fn pending_future_does_not_resolve() {
        let (deferred, _resolver) = DeferredResult::<u8, ()>::pending();
        assert!(deferred.now_or_never().is_none());
    }

    #[tokio::test]
    async fn awaiting_yields_the_outcome() {
        let (deferred, resolver) = DeferredResult::<String, ()>::pending();
        let waiter = deferred.clone();
        let settle = async move {
            tokio::task::yield_now().await;
            resolver.resolve("Data fetched".to_owned());
        };
        let (outcome, _) = futures::join!(waiter, settle);
        assert_eq!(outcome, Ok("Data fetched".to_owned()));
        assert_eq!(deferred.await, Ok("Data fetched".to_owned()));
    }
}
