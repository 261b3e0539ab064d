//! Long-lived user profile.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Durable key/value facts about a user.
///
/// Keys are kept sorted so the serialized form is stable across turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(BTreeMap<String, Value>);

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// Shallow merge: each incoming key replaces the same key, others are untouched.
    ///
    /// Returns the number of keys written.
    pub fn merge(&mut self, updates: impl IntoIterator<Item = (String, Value)>) -> usize {
        let mut written = 0;
        for (key, value) in updates {
            self.0.insert(key, value);
            written += 1;
        }
        written
    }

    /// Compact JSON rendering used as prompt context.
    pub fn render(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<BTreeMap<String, Value>> for Profile {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl From<serde_json::Map<String, Value>> for Profile {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self(map.into_iter().collect())
    }
}
