//! Durable store seams and row types.
//!
//! Rows keep the message role as a plain string. [`StoredMessage`] is the
//! only place that maps it to and from [`MessageRole`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use remiro_core::{Message, MessageRole, Profile};

use crate::error::{ChatError, ChatResult};

/// Stored profile with its optimistic-concurrency version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub data: Profile,
    /// Incremented on every successful save
    pub version: u64,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl ProfileRecord {
    pub fn empty() -> Self {
        Self {
            data: Profile::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }
}

/// A user-owned conversation container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(user_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            created_at: Utc::now(),
        }
    }
}

/// Message row as written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<&Message> for StoredMessage {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            role: message.role.as_str().to_string(),
            content: message.content.clone(),
            created_at: message.created_at,
        }
    }
}

impl From<StoredMessage> for Message {
    fn from(row: StoredMessage) -> Self {
        Message {
            id: row.id,
            role: MessageRole::from_stored(&row.role),
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Profiles, sessions and messages.
pub trait ChatStore: Send + Sync {
    /// Load a user's profile, creating an empty one on first use.
    fn load_profile(&self, user_id: &str) -> ChatResult<ProfileRecord>;

    /// Save a profile if the stored version still equals `expected_version`.
    ///
    /// Returns the new version, or [`ChatError::Conflict`].
    fn save_profile(&self, user_id: &str, data: &Profile, expected_version: u64) -> ChatResult<u64>;

    fn create_session(&self, user_id: &str, title: &str) -> ChatResult<SessionRecord>;

    /// Fails with [`ChatError::SessionNotFound`] for unknown ids.
    fn get_session(&self, session_id: &str) -> ChatResult<SessionRecord>;

    /// A user's sessions, newest first.
    fn list_sessions(&self, user_id: &str) -> ChatResult<Vec<SessionRecord>>;

    /// A session's messages, oldest first.
    fn load_messages(&self, session_id: &str) -> ChatResult<Vec<Message>>;

    fn append_messages(&self, session_id: &str, messages: &[Message]) -> ChatResult<()>;
}

/// Local email/password principals.
pub trait AuthStore: Send + Sync {
    /// Register a principal and return its user id.
    fn sign_up(&self, email: &str, password: &str) -> ChatResult<String>;

    /// Check credentials and return the user id.
    fn sign_in(&self, email: &str, password: &str) -> ChatResult<String>;
}

/// Reject ids that could escape a store directory.
pub fn validate_id(id: &str) -> ChatResult<()> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ChatError::InvalidId(id.to_string()))
    }
}

/// Sort sessions newest first.
pub(crate) fn sort_newest_first(sessions: &mut [SessionRecord]) {
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
