//! Error types for the agents module.

use thiserror::Error;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur while generating or routing.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Invalid route identifier: {0}")]
    InvalidRoute(String),

    #[error("Malformed structured output for {shape}: {message}")]
    MalformedOutput { shape: String, message: String },
}

impl AgentError {
    /// Create a malformed output error.
    pub fn malformed(shape: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedOutput {
            shape: shape.into(),
            message: message.into(),
        }
    }
}
