use async_trait::async_trait;

use crate::argument::Argument;

pub trait StageError: std::error::Error + Send + Sync + 'static {}

impl<T: std::error::Error + Send + Sync + 'static> StageError for T {}

/// One step of a pipeline. Receives the previous step's output and either produces the input
/// of the next step or fails the whole run.
#[async_trait]
pub trait Stage: Send + Sync + 'static {
    type Input: Argument;
    type Output: Argument;
    type Error: StageError;

    fn name(&self) -> &str;

    async fn run(&self, input: Self::Input) -> Result<Self::Output, Self::Error>;
}
