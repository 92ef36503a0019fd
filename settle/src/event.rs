use std::pin::Pin;

use async_broadcast::{broadcast, InactiveReceiver, Sender, TrySendError};
use futures::{Stream, StreamExt};
use settle_traits::SettlementState;
use tracing::warn;

pub type JobId = String;

/// Lifecycle of a job scheduled on a notifier
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NotifierEvent {
    /// The job has been handed to the notifier
    Scheduled(JobId),
    /// The job's delay has elapsed
    Fired(JobId),
    /// The job's result has left the pending state
    Settled(JobId, SettlementState),
}

impl NotifierEvent {
    pub fn get_job_id(&self) -> &JobId {
        match self {
            NotifierEvent::Scheduled(id) => id,
            NotifierEvent::Fired(id) => id,
            NotifierEvent::Settled(id, _) => id,
        }
    }
}

/// Fan-out of notifier events. Slow subscribers lose the oldest events instead of blocking the
/// notifier.
#[derive(Clone)]
pub(crate) struct Events {
    sender: Sender<NotifierEvent>,
    receiver: InactiveReceiver<NotifierEvent>,
}

impl Events {
    pub fn new(capacity: usize) -> Self {
        let (mut sender, receiver) = broadcast(capacity.max(1));
        sender.set_overflow(true);
        Self {
            sender,
            receiver: receiver.deactivate(),
        }
    }

    pub fn publish(&self, event: NotifierEvent) {
        match self.sender.try_broadcast(event) {
            Ok(_) | Err(TrySendError::Inactive(_)) => {}
            Err(e) => warn!(error = %e, "dropping notifier event"),
        }
    }

    /// Events published from now on, optionally narrowed to one job
    pub fn subscribe(
        &self,
        id: Option<JobId>,
    ) -> Pin<Box<dyn Stream<Item = NotifierEvent> + Send>> {
        Box::pin(self.receiver.activate_cloned().filter(move |event| {
            let keep = match id.as_ref() {
                Some(id) => id == event.get_job_id(),
                None => true,
            };
            futures::future::ready(keep)
        }))
    }
}
