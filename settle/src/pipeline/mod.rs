use std::{fmt, sync::Arc};

use settle_traits::{Argument, Stage};
use tracing::{debug, warn};

use self::stage::{Erased, ErasedStage};

mod error;
mod stage;

pub use error::PipelineError;
pub use stage::{from_fn, FnStage};

/// An ordered list of stages run one after another by a single loop.
///
/// Each stage receives the previous stage's output. The first failing stage ends the run and
/// no later stage is invoked.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn ErasedStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a stage
    pub fn stage<S: Stage>(mut self, stage: S) -> Self {
        self.stages.push(Box::new(Erased(stage)));
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|stage| stage.name())
    }

    /// Feed `input` through every stage in order
    pub async fn run<I: Argument, O: Argument>(&self, input: I) -> Result<O, PipelineError> {
        let mut value =
            serde_json::to_value(input).map_err(|e| PipelineError::Encode(Arc::new(e)))?;
        for (index, stage) in self.stages.iter().enumerate() {
            debug!(index, stage = stage.name(), "running stage");
            value = match stage.run(value).await {
                Ok(value) => value,
                Err(failure) => {
                    let e = failure.at(index, stage.name());
                    warn!(error = %e, "pipeline stopped");
                    return Err(e);
                }
            };
        }
        serde_json::from_value(value).map_err(|e| PipelineError::Decode(Arc::new(e)))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}
