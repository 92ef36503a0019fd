use std::{
    collections::BTreeMap,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll, Waker},
    time::Duration,
};

use futures::future::BoxFuture;
use settle_traits::Timer;

/// A virtual clock. Nothing ever sleeps for real.
///
/// When the earliest outstanding delay is polled the clock jumps to its deadline, so delays
/// complete in deadline order at the speed of the executor. Every delay yields once before it
/// may advance the clock, which lets delays created in the same poll round register first.
#[derive(Clone, Default)]
pub struct MockTimer {
    inner: Arc<Mutex<Clock>>,
}

type SleeperKey = (Duration, u64);

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    sleepers: BTreeMap<SleeperKey, Option<Waker>>,
}

struct MockDelay {
    timer: MockTimer,
    duration: Duration,
    key: Option<SleeperKey>,
}

impl MockTimer {
    pub fn new() -> Self {
        Default::default()
    }

    /// Move the clock forward by hand, releasing every delay that falls due
    pub fn advance(&self, by: Duration) {
        let wakers: Vec<Waker> = {
            let clock = &mut *self.lock();
            clock.now += by;
            let now = clock.now;
            clock
                .sleepers
                .iter_mut()
                .take_while(|((deadline, _), _)| *deadline <= now)
                .filter_map(|(_, waker)| waker.take())
                .collect()
        };
        wakers.into_iter().for_each(Waker::wake);
    }

    /// Number of delays that have been polled but not yet completed
    pub fn sleeping(&self) -> usize {
        self.lock().sleepers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Timer for MockTimer {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn delay(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(MockDelay {
            timer: self.clone(),
            duration,
            key: None,
        })
    }
}

impl Clock {
    /// Remove a sleeper and hand back the waker of whoever is now earliest
    fn release(&mut self, key: &SleeperKey) -> Option<Waker> {
        self.sleepers.remove(key);
        self.sleepers
            .iter_mut()
            .next()
            .and_then(|(_, waker)| waker.take())
    }
}

impl Future for MockDelay {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let timer = self.timer.clone();
        let mut clock = timer.lock();
        let key = match self.key {
            Some(key) => key,
            None => {
                if self.duration.is_zero() {
                    return Poll::Ready(());
                }
                let key = (clock.now + self.duration, clock.next_id);
                clock.next_id += 1;
                clock.sleepers.insert(key, None);
                self.key = Some(key);
                drop(clock);
                cx.waker().wake_by_ref();
                return Poll::Pending;
            }
        };
        let earliest = clock.sleepers.keys().next() == Some(&key);
        if clock.now >= key.0 || earliest {
            if clock.now < key.0 {
                clock.now = key.0;
            }
            let next = clock.release(&key);
            drop(clock);
            self.key = None;
            self.duration = Duration::ZERO;
            if let Some(waker) = next {
                waker.wake();
            }
            return Poll::Ready(());
        }
        clock.sleepers.insert(key, Some(cx.waker().clone()));
        Poll::Pending
    }
}

impl Drop for MockDelay {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            let next = self.timer.lock().release(&key);
            if let Some(waker) = next {
                waker.wake();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::task::Poll;

    use futures::{future::poll_fn, FutureExt};

    use super::*;

    #[test]
    fn manual_advance_releases_due_delays() {
        let timer = MockTimer::new();
        let mut first = timer.delay(Duration::from_secs(1));
        let mut second = timer.delay(Duration::from_secs(3));
        futures::executor::block_on(poll_fn(|cx| {
            assert!(first.poll_unpin(cx).is_pending());
            assert!(second.poll_unpin(cx).is_pending());
            Poll::Ready(())
        }));
        assert_eq!(timer.sleeping(), 2);
        timer.advance(Duration::from_secs(2));
        assert_eq!(timer.now(), Duration::from_secs(2));
        assert!(first.now_or_never().is_some());
        assert_eq!(timer.sleeping(), 1);
    }

    #[test]
    fn dropped_delays_stop_holding_the_clock() {
        let timer = MockTimer::new();
        let mut delay = timer.delay(Duration::from_secs(5));
        assert!(delay.as_mut().now_or_never().is_none());
        assert_eq!(timer.sleeping(), 1);
        drop(delay);
        assert_eq!(timer.sleeping(), 0);
        assert_eq!(timer.now(), Duration::ZERO);
    }

    #[tokio::test]
    async fn jumps_to_the_deadline() {
        let timer = MockTimer::new();
        timer.delay(Duration::from_millis(1000)).await;
        assert_eq!(timer.now(), Duration::from_millis(1000));
    }
}

#[cfg(test)]
use settle_traits::test_timer;
#[cfg(test)]
test_timer!(MockTimer::new());
