//! In-memory store, for tests and ephemeral runs.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::RwLock;

use remiro_core::{Message, Profile};

use crate::auth::PrincipalTable;
use crate::error::{ChatError, ChatResult};
use crate::store::{
    sort_newest_first, AuthStore, ChatStore, ProfileRecord, SessionRecord, StoredMessage,
};

#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<String, ProfileRecord>>,
    sessions: RwLock<HashMap<String, SessionRecord>>,
    messages: RwLock<HashMap<String, Vec<StoredMessage>>>,
    principals: RwLock<PrincipalTable>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total stored messages across sessions.
    pub fn message_count(&self) -> usize {
        self.messages.read().values().map(Vec::len).sum()
    }
}

impl ChatStore for MemoryStore {
    fn load_profile(&self, user_id: &str) -> ChatResult<ProfileRecord> {
        Ok(self
            .profiles
            .write()
            .entry(user_id.to_string())
            .or_insert_with(ProfileRecord::empty)
            .clone())
    }

    fn save_profile(&self, user_id: &str, data: &Profile, expected_version: u64) -> ChatResult<u64> {
        let mut profiles = self.profiles.write();
        let found = profiles.get(user_id).map(|r| r.version).unwrap_or(0);
        if found != expected_version {
            return Err(ChatError::Conflict {
                user_id: user_id.to_string(),
                expected: expected_version,
                found,
            });
        }
        let record = ProfileRecord {
            data: data.clone(),
            version: found + 1,
            updated_at: Utc::now(),
        };
        let version = record.version;
        profiles.insert(user_id.to_string(), record);
        Ok(version)
    }

    fn create_session(&self, user_id: &str, title: &str) -> ChatResult<SessionRecord> {
        let session = SessionRecord::new(user_id, title);
        self.sessions
            .write()
            .insert(session.id.clone(), session.clone());
        self.messages.write().insert(session.id.clone(), Vec::new());
        Ok(session)
    }

    fn get_session(&self, session_id: &str) -> ChatResult<SessionRecord> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))
    }

    fn list_sessions(&self, user_id: &str) -> ChatResult<Vec<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    fn load_messages(&self, session_id: &str) -> ChatResult<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .messages
            .read()
            .get(session_id)
            .map(|rows| rows.iter().cloned().map(Message::from).collect())
            .unwrap_or_default();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    fn append_messages(&self, session_id: &str, messages: &[Message]) -> ChatResult<()> {
        let mut all = self.messages.write();
        let rows = all
            .get_mut(session_id)
            .ok_or_else(|| ChatError::SessionNotFound(session_id.to_string()))?;
        rows.extend(messages.iter().map(StoredMessage::from));
        Ok(())
    }
}

impl AuthStore for MemoryStore {
    fn sign_up(&self, email: &str, password: &str) -> ChatResult<String> {
        self.principals.write().register(email, password)
    }

    fn sign_in(&self, email: &str, password: &str) -> ChatResult<String> {
        self.principals.read().authenticate(email, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_profile_conflict() {
        let store = MemoryStore::new();
        let record = store.load_profile("u1").unwrap();
        let mut profile = Profile::new();
        profile.insert("remote", json!(true));

        store.save_profile("u1", &profile, record.version).unwrap();
        assert!(matches!(
            store.save_profile("u1", &profile, record.version),
            Err(ChatError::Conflict { .. })
        ));
        assert_eq!(store.load_profile("u1").unwrap().data, profile);
    }

    #[test]
    fn test_messages_require_session() {
        let store = MemoryStore::new();
        assert!(store.append_messages("nope", &[Message::user("x")]).is_err());

        let session = store.create_session("u1", "t").unwrap();
        store
            .append_messages(&session.id, &[Message::user("a"), Message::assistant("b")])
            .unwrap();
        assert_eq!(store.load_messages(&session.id).unwrap().len(), 2);
        assert_eq!(store.message_count(), 2);
    }

    #[test]
    fn test_auth() {
        let store = MemoryStore::new();
        let id = store.sign_up("x@example.org", "secret1").unwrap();
        assert_eq!(store.sign_in("x@example.org", "secret1").unwrap(), id);
        assert!(store.sign_in("x@example.org", "secret2").is_err());
    }
}
