use std::time::{Duration, Instant};

use futures::{future::BoxFuture, FutureExt};
use futures_timer::Delay;
use settle_traits::Timer;

/// Wall-clock timer backed by `futures-timer`
#[derive(Clone, Debug)]
pub struct SystemTimer {
    epoch: Instant,
}

impl SystemTimer {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn delay(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Delay::new(duration).boxed()
    }
}

#[cfg(test)]
use settle_traits::test_timer;
#[cfg(test)]
test_timer!(SystemTimer::new());
