//! Error types for the chat layer.

use thiserror::Error;

use remiro_core::CoreError;

/// Chat layer errors
#[derive(Error, Debug)]
pub enum ChatError {
    /// No backend credential in settings or environment
    #[error("LLM not configured. Set OPENAI_API_KEY or ANTHROPIC_API_KEY")]
    LlmNotConfigured,

    #[error("Message is empty")]
    EmptyInput,

    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    /// Profile changed since it was loaded
    #[error("Profile for {user_id} was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        user_id: String,
        expected: u64,
        found: u64,
    },

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("An account already exists for {0}")]
    EmailTaken(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    /// A stage failed while running the turn
    #[error("Turn failed: {0}")]
    Turn(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ChatError {
    /// Missing or unusable configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::LlmNotConfigured | Self::Settings(_))
    }

    /// Sign-up or sign-in rejected.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail(_)
                | Self::WeakPassword { .. }
                | Self::EmailTaken(_)
                | Self::InvalidCredentials
        )
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<CoreError> for ChatError {
    fn from(err: CoreError) -> Self {
        Self::Turn(err.to_string())
    }
}

/// Result type for chat operations
pub type ChatResult<T> = Result<T, ChatError>;
