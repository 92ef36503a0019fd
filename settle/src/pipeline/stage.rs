use std::{future::Future, marker::PhantomData, sync::Arc};

use async_trait::async_trait;
use serde_json::Value;
use settle_traits::{Argument, Stage, StageError};

use super::error::PipelineError;

/// A stage built from an async closure. See [`from_fn`].
pub struct FnStage<F, I, O, E> {
    name: String,
    f: F,
    marker: PhantomData<fn(I) -> Result<O, E>>,
}

/// Turn an async closure into a named [`Stage`]
pub fn from_fn<F, Fut, I, O, E>(name: impl Into<String>, f: F) -> FnStage<F, I, O, E>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    I: Argument,
    O: Argument,
    E: StageError,
{
    FnStage {
        name: name.into(),
        f,
        marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, I, O, E> Stage for FnStage<F, I, O, E>
where
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
    I: Argument,
    O: Argument,
    E: StageError,
{
    type Input = I;
    type Output = O;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: I) -> Result<O, E> {
        (self.f)(input).await
    }
}

/// Failure of one erased stage before its position is known
pub(super) enum StageFailure {
    Value(serde_json::Error),
    Stage(Arc<dyn std::error::Error + Send + Sync>),
}

impl StageFailure {
    pub fn at(self, index: usize, stage: &str) -> PipelineError {
        let stage = stage.to_owned();
        match self {
            StageFailure::Value(e) => PipelineError::Value {
                index,
                stage,
                source: Arc::new(e),
            },
            StageFailure::Stage(source) => PipelineError::Stage {
                index,
                stage,
                source,
            },
        }
    }
}

/// A stage whose input and output travel as json values
#[async_trait]
pub(super) trait ErasedStage: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, input: Value) -> Result<Value, StageFailure>;
}

pub(super) struct Erased<S>(pub S);

#[async_trait]
impl<S: Stage> ErasedStage for Erased<S> {
    fn name(&self) -> &str {
        self.0.name()
    }

    async fn run(&self, input: Value) -> Result<Value, StageFailure> {
        let input: S::Input = serde_json::from_value(input).map_err(StageFailure::Value)?;
        let output = self
            .0
            .run(input)
            .await
            .map_err(|e| StageFailure::Stage(Arc::new(e)))?;
        serde_json::to_value(output).map_err(StageFailure::Value)
    }
}
