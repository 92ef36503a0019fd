use std::{cell::Cell, convert::Infallible, fmt, future::Future, pin::Pin, rc::Rc, time::Duration};

use futures::{
    executor::{LocalPool, LocalSpawner},
    task::LocalSpawnExt,
    Stream,
};
use settle_traits::{Argument, SettlementState, Task, Timer};
use tracing::{debug, debug_span, trace, Instrument};
use uuid::Uuid;

use crate::{
    deferred::DeferredResult,
    event::{Events, JobId, NotifierEvent},
    pipeline::{Pipeline, PipelineError},
};

mod config;
mod error;

pub use config::NotifierConfig;
pub use error::NotifierError;

/// Runs a unit of work and then signals a dependent one, either right away or after a delay.
///
/// Deferred jobs live on a single-threaded pool owned by the notifier and only make progress
/// while [`AsyncNotifier::run`] or [`AsyncNotifier::run_until_stalled`] drives them. A job
/// cannot be withdrawn once scheduled; dropping the returned result does not cancel it.
pub struct AsyncNotifier<TTimer: Timer> {
    config: NotifierConfig,
    timer: TTimer,
    pool: LocalPool,
    spawner: LocalSpawner,
    outstanding: Rc<Cell<usize>>,
    events: Events,
}

impl<TTimer: Timer> AsyncNotifier<TTimer> {
    pub fn new(timer: TTimer, config: NotifierConfig) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        let events = Events::new(
            config
                .event_capacity
                .unwrap_or(config::DEFAULT_EVENT_CAPACITY),
        );
        Self {
            config,
            timer,
            pool,
            spawner,
            outstanding: Default::default(),
            events,
        }
    }

    /// Run `primary` now, then `on_complete` once it has returned.
    ///
    /// A failing primary hands its error straight back and `on_complete` is never called.
    pub fn run_with_callback<P, C>(&self, primary: P, on_complete: C) -> Result<(), P::Error>
    where
        P: Task,
        C: FnOnce(),
    {
        let name = primary.name().to_owned();
        if let Err(e) = primary.run() {
            debug!(task = %name, "primary task failed, completion skipped");
            return Err(e);
        }
        trace!(task = %name, "primary task returned");
        on_complete();
        Ok(())
    }

    /// After `delay`, counted from this call, fulfil the returned result with `payload` and hand it to `on_settled`.
    pub fn run_deferred<T, F>(
        &self,
        delay: Duration,
        payload: T,
        on_settled: F,
    ) -> Result<DeferredResult<T, Infallible>, NotifierError>
    where
        T: Clone + Send + 'static,
        F: FnOnce(Result<T, Infallible>) + Send + 'static,
    {
        self.run_deferred_with(delay, move || Ok(payload), on_settled)
    }

    /// After `delay`, settle the returned result with whatever `produce` yields. An `Err`
    /// rejects it and `on_settled` receives the failure payload.
    pub fn run_deferred_with<T, E, P, F>(
        &self,
        delay: Duration,
        produce: P,
        on_settled: F,
    ) -> Result<DeferredResult<T, E>, NotifierError>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        P: FnOnce() -> Result<T, E> + 'static,
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        let timer = self.timer.clone();
        let events = self.events.clone();
        let scheduled_at = self.timer.now();
        let deadline = scheduled_at + delay;
        self.schedule(
            move |id| async move {
                timer.delay(deadline.saturating_sub(timer.now())).await;
                trace!(waited = ?timer.now().saturating_sub(scheduled_at), "delay elapsed");
                events.publish(NotifierEvent::Fired(id));
                produce()
            },
            on_settled,
        )
    }

    /// Run `pipeline` on `input` as a job of this notifier
    pub fn run_pipeline<I, O, F>(
        &self,
        pipeline: Pipeline,
        input: I,
        on_settled: F,
    ) -> Result<DeferredResult<O, PipelineError>, NotifierError>
    where
        I: Argument,
        O: Argument + Clone,
        F: FnOnce(Result<O, PipelineError>) + Send + 'static,
    {
        self.schedule(
            move |_| async move { pipeline.run(input).await },
            on_settled,
        )
    }

    /// Drive every scheduled job to completion
    pub fn run(&mut self) {
        self.pool.run();
    }

    /// Drive scheduled jobs until none of them can make progress without waiting
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Number of scheduled jobs that have not settled yet
    pub fn pending(&self) -> usize {
        self.outstanding.get()
    }

    pub fn timer(&self) -> &TTimer {
        &self.timer
    }

    /// Lifecycle events published from now on, optionally narrowed to one job
    pub fn subscribe(
        &self,
        id: Option<JobId>,
    ) -> Pin<Box<dyn Stream<Item = NotifierEvent> + Send>> {
        self.events.subscribe(id)
    }

    fn schedule<T, E, J, Fut, F>(
        &self,
        job: J,
        on_settled: F,
    ) -> Result<DeferredResult<T, E>, NotifierError>
    where
        T: Clone + Send + 'static,
        E: Clone + Send + 'static,
        J: FnOnce(JobId) -> Fut,
        Fut: Future<Output = Result<T, E>> + 'static,
        F: FnOnce(Result<T, E>) + Send + 'static,
    {
        if let Some(max) = self.config.max_pending {
            if self.outstanding.get() >= max {
                return Err(NotifierError::Saturated(max));
            }
        }
        let id: JobId = Uuid::new_v4().to_string();
        let (deferred, resolver) = DeferredResult::pending();
        deferred.on_settled(on_settled);
        let job = job(id.clone());
        let events = self.events.clone();
        let outstanding = self.outstanding.clone();
        let job_id = id.clone();
        self.spawner.spawn_local(
            async move {
                let outcome = job.await;
                let state = match outcome {
                    Ok(_) => SettlementState::Fulfilled,
                    Err(_) => SettlementState::Rejected,
                };
                resolver.settle(outcome);
                outstanding.set(outstanding.get().saturating_sub(1));
                debug!(?state, "job settled");
                events.publish(NotifierEvent::Settled(job_id, state));
            }
            .instrument(debug_span!("job", id = %id)),
        )?;
        self.outstanding.set(self.outstanding.get() + 1);
        debug!(id = %id, pending = self.outstanding.get(), "job scheduled");
        self.events.publish(NotifierEvent::Scheduled(id));
        Ok(deferred)
    }
}

impl<TTimer: Timer + fmt::Debug> fmt::Debug for AsyncNotifier<TTimer> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncNotifier")
            .field("config", &self.config)
            .field("timer", &self.timer)
            .field("pending", &self.pending())
            .finish()
    }
}
