//! Pipeline error types.

/// Errors that can occur while assembling or running the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("stage '{0}' not found in pipeline")]
    UnknownStage(String),

    #[error("stage '{stage}' must run after '{requires}'")]
    Order {
        stage: &'static str,
        requires: &'static str,
    },
}
