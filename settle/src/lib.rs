pub mod combinator;
pub mod deferred;
pub mod event;
pub mod notifier;
pub mod pipeline;
pub mod timer;

pub use settle_traits::*;

pub mod prelude {
    pub use crate::{
        deferred::{DeferredResult, Resolver},
        event::NotifierEvent,
        notifier::{AsyncNotifier, NotifierConfig, NotifierError},
        pipeline::{Pipeline, PipelineError},
        timer::SystemTimer,
    };
    pub use settle_traits::{Settlement, SettlementState, Stage, Task, TaskExt, Timer};
}
