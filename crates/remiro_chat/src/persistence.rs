//! Filesystem store.
//!
//! Everything lives under one data directory:
//! ```text
//! <data_dir>/
//! ├── profiles/<userId>.json        # Profile record (data + version)
//! ├── sessions/<sessionId>/
//! │   ├── session.json              # Owner, title, timestamps
//! │   └── messages.jsonl            # Append-only message log
//! └── auth/principals.json          # Email/password principals
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use remiro_core::{Message, Profile};

use crate::auth::PrincipalTable;
use crate::error::{ChatError, ChatResult};
use crate::store::{
    sort_newest_first, validate_id, AuthStore, ChatStore, ProfileRecord, SessionRecord,
    StoredMessage,
};

/// Store backed by JSON files.
#[derive(Clone)]
pub struct FileStore {
    root: PathBuf,
    /// Serialises read-check-write sequences within this process
    write_lock: Arc<Mutex<()>>,
}

impl FileStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn profile_path(&self, user_id: &str) -> ChatResult<PathBuf> {
        validate_id(user_id)?;
        Ok(self.root.join("profiles").join(format!("{}.json", user_id)))
    }

    fn sessions_dir(&self) -> PathBuf {
        self.root.join("sessions")
    }

    fn session_dir(&self, session_id: &str) -> ChatResult<PathBuf> {
        validate_id(session_id).map_err(|_| ChatError::SessionNotFound(session_id.to_string()))?;
        Ok(self.sessions_dir().join(session_id))
    }

    fn principals_path(&self) -> PathBuf {
        self.root.join("auth").join("principals.json")
    }

    fn write_profile(&self, path: &Path, record: &ProfileRecord) -> ChatResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(record)?)?;
        Ok(())
    }

    fn read_principals(&self) -> ChatResult<PrincipalTable> {
        let path = self.principals_path();
        if !path.exists() {
            return Ok(PrincipalTable::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn write_principals(&self, table: &PrincipalTable) -> ChatResult<()> {
        let path = self.principals_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(table)?)?;
        Ok(())
    }
}

impl ChatStore for FileStore {
    fn load_profile(&self, user_id: &str) -> ChatResult<ProfileRecord> {
        let path = self.profile_path(user_id)?;
        if !path.exists() {
            let _guard = self.write_lock.lock();
            if !path.exists() {
                debug!("Creating empty profile for {}", user_id);
                let record = ProfileRecord::empty();
                self.write_profile(&path, &record)?;
                return Ok(record);
            }
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save_profile(&self, user_id: &str, data: &Profile, expected_version: u64) -> ChatResult<u64> {
        let path = self.profile_path(user_id)?;
        let _guard = self.write_lock.lock();

        let found = if path.exists() {
            let stored: ProfileRecord = serde_json::from_str(&fs::read_to_string(&path)?)?;
            stored.version
        } else {
            0
        };
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
        self.write_profile(&path, &record)?;
        debug!("Saved profile for {} at version {}", user_id, record.version);
        Ok(record.version)
    }

    fn create_session(&self, user_id: &str, title: &str) -> ChatResult<SessionRecord> {
        validate_id(user_id)?;
        let session = SessionRecord::new(user_id, title);

        let session_dir = self.session_dir(&session.id)?;
        fs::create_dir_all(&session_dir)?;
        fs::write(
            session_dir.join("session.json"),
            serde_json::to_string_pretty(&session)?,
        )?;
        File::create(session_dir.join("messages.jsonl"))?;

        debug!("Created session {} for {}", session.id, user_id);
        Ok(session)
    }

    fn get_session(&self, session_id: &str) -> ChatResult<SessionRecord> {
        let path = self.session_dir(session_id)?.join("session.json");
        if !path.exists() {
            return Err(ChatError::SessionNotFound(session_id.to_string()));
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn list_sessions(&self, user_id: &str) -> ChatResult<Vec<SessionRecord>> {
        let dir = self.sessions_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut sessions = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path().join("session.json");
            if !path.exists() {
                continue;
            }
            let session: SessionRecord = serde_json::from_str(&fs::read_to_string(path)?)?;
            if session.user_id == user_id {
                sessions.push(session);
            }
        }

        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    fn load_messages(&self, session_id: &str) -> ChatResult<Vec<Message>> {
        let messages_path = self.session_dir(session_id)?.join("messages.jsonl");
        if !messages_path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(messages_path)?);
        let mut messages = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                let row: StoredMessage = serde_json::from_str(&line)?;
                messages.push(Message::from(row));
            }
        }

        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    fn append_messages(&self, session_id: &str, messages: &[Message]) -> ChatResult<()> {
        let session_dir = self.session_dir(session_id)?;
        if !session_dir.exists() {
            return Err(ChatError::SessionNotFound(session_id.to_string()));
        }

        let _guard = self.write_lock.lock();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(session_dir.join("messages.jsonl"))?;
        for message in messages {
            writeln!(file, "{}", serde_json::to_string(&StoredMessage::from(message))?)?;
        }
        Ok(())
    }
}

impl AuthStore for FileStore {
    fn sign_up(&self, email: &str, password: &str) -> ChatResult<String> {
        let _guard = self.write_lock.lock();
        let mut table = self.read_principals()?;
        let user_id = table.register(email, password)?;
        self.write_principals(&table)?;
        Ok(user_id)
    }

    fn sign_in(&self, email: &str, password: &str) -> ChatResult<String> {
        self.read_principals()?.authenticate(email, password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_profile_created_lazily() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());

        let record = store.load_profile("user-1").unwrap();
        assert!(record.data.is_empty());
        assert_eq!(record.version, 0);
        assert!(temp.path().join("profiles").join("user-1.json").exists());
    }

    #[test]
    fn test_profile_versioning() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let record = store.load_profile("user-1").unwrap();

        let mut profile = record.data.clone();
        profile.insert("city", json!("Lyon"));
        assert_eq!(store.save_profile("user-1", &profile, record.version).unwrap(), 1);

        let err = store.save_profile("user-1", &profile, record.version).unwrap_err();
        assert!(matches!(err, ChatError::Conflict { expected: 0, found: 1, .. }));

        let reloaded = store.load_profile("user-1").unwrap();
        assert_eq!(reloaded.version, 1);
        assert_eq!(reloaded.data.get("city"), Some(&json!("Lyon")));
    }

    #[test]
    fn test_session_and_messages() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let session = store.create_session("user-1", "Career change").unwrap();

        store
            .append_messages(&session.id, &[Message::user("Hello"), Message::assistant("Hi there!")])
            .unwrap();
        store
            .append_messages(&session.id, &[Message::user("Next")])
            .unwrap();

        let messages = store.load_messages(&session.id).unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["Hello", "Hi there!", "Next"]);

        assert_eq!(store.get_session(&session.id).unwrap(), session);
    }

    #[test]
    fn test_list_sessions_filters_and_orders() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let first = store.create_session("user-1", "first").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = store.create_session("user-1", "second").unwrap();
        store.create_session("user-2", "other").unwrap();

        let sessions = store.list_sessions("user-1").unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);
    }

    #[test]
    fn test_unknown_session() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        assert!(matches!(
            store.get_session("missing"),
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(matches!(
            store.get_session("../escape"),
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(store.append_messages("missing", &[Message::user("x")]).is_err());
        assert!(store.list_sessions("user-1").unwrap().is_empty());
    }

    #[test]
    fn test_auth_persists() {
        let temp = tempdir().unwrap();
        let store = FileStore::new(temp.path());
        let id = store.sign_up("ada@example.com", "hunter22").unwrap();

        let reopened = FileStore::new(temp.path());
        assert_eq!(reopened.sign_in("ADA@example.com", "hunter22").unwrap(), id);
        assert!(reopened.sign_up("ada@example.com", "hunter22").is_err());
    }
}
