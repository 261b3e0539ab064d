//! Transcript messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    Assistant,
    User,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::Assistant => "assistant",
            MessageRole::User => "user",
        }
    }

    /// Map a stored role column onto a role.
    ///
    /// Anything that is not `user` or `system` (summaries, legacy `ai` rows)
    /// is treated as assistant output.
    pub fn from_stored(role: &str) -> Self {
        match role.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => MessageRole::User,
            "system" => MessageRole::System,
            _ => MessageRole::Assistant,
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single transcript entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique message ID (UUID)
    pub id: String,
    /// Role of the message sender
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// When the message was created
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    /// Render as a `[role] text` line for summarisation prompts.
    pub fn transcript_line(&self) -> String {
        format!("[{}] {}", self.role, self.content)
    }
}

/// Render messages as newline-separated `[role] text` lines.
pub fn transcript_text(messages: &[Message]) -> String {
    messages
        .iter()
        .map(Message::transcript_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The last `n` messages of a transcript (all of them when shorter).
pub fn recent_window(messages: &[Message], n: usize) -> &[Message] {
    let start = messages.len().saturating_sub(n);
    &messages[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.content, "Hello");

        let msg = Message::assistant("Hi there!");
        assert_eq!(msg.role, MessageRole::Assistant);

        let msg = Message::system("Stay on topic.");
        assert_eq!(msg.role, MessageRole::System);
    }

    #[test]
    fn test_stored_role_mapping() {
        assert_eq!(MessageRole::from_stored("user"), MessageRole::User);
        assert_eq!(MessageRole::from_stored("system"), MessageRole::System);
        assert_eq!(MessageRole::from_stored("assistant"), MessageRole::Assistant);
        assert_eq!(MessageRole::from_stored("summary"), MessageRole::Assistant);
        assert_eq!(MessageRole::from_stored(""), MessageRole::Assistant);
    }

    #[test]
    fn test_transcript_text() {
        let messages = vec![Message::user("I want to learn Rust"), Message::assistant("Great choice")];
        assert_eq!(
            transcript_text(&messages),
            "[user] I want to learn Rust\n[assistant] Great choice"
        );
    }

    #[test]
    fn test_recent_window() {
        let messages: Vec<Message> = (0..10).map(|i| Message::user(i.to_string())).collect();
        let window = recent_window(&messages, 6);
        assert_eq!(window.len(), 6);
        assert_eq!(window[0].content, "4");

        let short = recent_window(&messages[..3], 6);
        assert_eq!(short.len(), 3);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
