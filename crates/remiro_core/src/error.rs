//! Error types for the core module.

use thiserror::Error;

use crate::stage::StageId;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while running a turn.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Stage not found: {0}")]
    StageNotFound(StageId),

    #[error("Invalid turn state: {0}")]
    InvalidState(String),

    #[error("Stage execution failed: {stage} - {message}")]
    StageExecutionFailed { stage: StageId, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CoreError {
    /// Create a stage failure from any displayable error.
    pub fn stage_failed(stage: StageId, message: impl std::fmt::Display) -> Self {
        Self::StageExecutionFailed {
            stage,
            message: message.to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
