//! Scripted generation backend for testing.
//!
//! Replies are chosen by the first matching rule; every request is captured
//! so tests can assert on exactly what each stage sent.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;

use crate::backend::{Generation, GenerationBackend, GenerationRequest};
use crate::error::{AgentError, AgentResult};

/// Predefined reply for a matched request.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Json(Value),
    Error(String),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn json(value: Value) -> Self {
        Self::Json(value)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Instructions(String),
    LastMessage(String),
}

impl Matcher {
    fn matches(&self, request: &GenerationRequest) -> bool {
        match self {
            Matcher::Instructions(needle) => request.instructions.contains(needle.as_str()),
            Matcher::LastMessage(needle) => request
                .last_message()
                .map(|m| m.contains(needle.as_str()))
                .unwrap_or(false),
        }
    }
}

/// Mock backend for testing.
#[derive(Clone)]
pub struct MockBackend {
    rules: Arc<RwLock<Vec<(Matcher, MockReply)>>>,
    fallback: Arc<RwLock<MockReply>>,
    captured: Arc<RwLock<Vec<GenerationRequest>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a backend that answers everything with `"ok"`.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            fallback: Arc::new(RwLock::new(MockReply::text("ok"))),
            captured: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Reply when the instructions contain `needle`.
    pub fn on_instructions(self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules
            .write()
            .push((Matcher::Instructions(needle.into()), reply));
        self
    }

    /// Reply when the last message contains `needle`.
    pub fn on_message(self, needle: impl Into<String>, reply: MockReply) -> Self {
        self.rules
            .write()
            .push((Matcher::LastMessage(needle.into()), reply));
        self
    }

    /// Reply used when no rule matches.
    pub fn with_fallback(self, reply: MockReply) -> Self {
        *self.fallback.write() = reply;
        self
    }

    /// All requests seen so far, in order.
    pub fn captured(&self) -> Vec<GenerationRequest> {
        self.captured.read().clone()
    }

    /// Requests whose instructions contain `needle`.
    pub fn calls_with_instructions(&self, needle: &str) -> Vec<GenerationRequest> {
        self.captured
            .read()
            .iter()
            .filter(|r| r.instructions.contains(needle))
            .cloned()
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.captured.read().len()
    }
}

#[async_trait]
impl GenerationBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: GenerationRequest) -> AgentResult<Generation> {
        let reply = self
            .rules
            .read()
            .iter()
            .find(|(matcher, _)| matcher.matches(&request))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.read().clone());

        self.captured.write().push(request);

        match reply {
            MockReply::Text(text) => Ok(Generation::Text(text)),
            MockReply::Json(value) => Ok(Generation::Structured(value)),
            MockReply::Error(message) => Err(AgentError::Llm(message)),
        }
    }
}
