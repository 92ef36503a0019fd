use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("pipeline input could not be encoded: {0}")]
    Encode(#[source] Arc<serde_json::Error>),
    #[error("pipeline output could not be decoded: {0}")]
    Decode(#[source] Arc<serde_json::Error>),
    #[error("stage {index} ({stage}) cannot read its input: {source}")]
    Value {
        index: usize,
        stage: String,
        #[source]
        source: Arc<serde_json::Error>,
    },
    #[error("stage {index} ({stage}) failed: {source}")]
    Stage {
        index: usize,
        stage: String,
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl PipelineError {
    /// Position of the stage that stopped the run, if a stage did
    pub fn stage_index(&self) -> Option<usize> {
        match self {
            PipelineError::Value { index, .. } | PipelineError::Stage { index, .. } => Some(*index),
            PipelineError::Encode(_) | PipelineError::Decode(_) => None,
        }
    }
}
