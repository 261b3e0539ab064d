//! Generation backend seam.
//!
//! Every stage that needs text goes through [`GenerationBackend`]. The
//! backend is opaque: instructions plus messages in, text or a JSON object
//! out. Structured requests carry a schema; the backend may honour it
//! natively or just return text, in which case [`generate_structured`]
//! extracts the JSON object itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use remiro_core::Message;

use crate::error::{AgentError, AgentResult};

/// Sampling profile for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Specialists and the synthesizer
    Standard,
    /// Router, enrichment summary, profile distiller, compaction
    Utility,
}

impl ModelTier {
    pub fn temperature(&self) -> f32 {
        match self {
            ModelTier::Standard => 0.7,
            ModelTier::Utility => 0.5,
        }
    }

    pub fn max_tokens(&self) -> u32 {
        match self {
            ModelTier::Standard => 512,
            ModelTier::Utility => 256,
        }
    }
}

/// Requested output shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseShape {
    Text,
    Structured { name: String, schema: Value },
}

/// One generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// System-level instructions
    pub instructions: String,
    /// Conversation messages, oldest first
    pub messages: Vec<Message>,
    pub shape: ResponseShape,
    pub tier: ModelTier,
}

impl GenerationRequest {
    /// Plain-text request on the standard tier.
    pub fn text(instructions: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            instructions: instructions.into(),
            messages,
            shape: ResponseShape::Text,
            tier: ModelTier::Standard,
        }
    }

    /// Structured request on the utility tier.
    pub fn structured(
        instructions: impl Into<String>,
        messages: Vec<Message>,
        name: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            instructions: instructions.into(),
            messages,
            shape: ResponseShape::Structured {
                name: name.into(),
                schema,
            },
            tier: ModelTier::Utility,
        }
    }

    pub fn with_tier(mut self, tier: ModelTier) -> Self {
        self.tier = tier;
        self
    }

    /// Content of the last message, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

/// Backend output.
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    Text(String),
    Structured(Value),
}

impl Generation {
    /// Text form of the output; structured output is rendered as JSON.
    pub fn into_text(self) -> String {
        match self {
            Generation::Text(text) => text,
            Generation::Structured(value) => value.to_string(),
        }
    }
}

/// Trait for generation backends.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Run one generation call.
    async fn generate(&self, request: GenerationRequest) -> AgentResult<Generation>;
}

/// Run a text request.
pub async fn generate_text(
    backend: &dyn GenerationBackend,
    request: GenerationRequest,
) -> AgentResult<String> {
    Ok(backend.generate(request).await?.into_text())
}

/// Run a structured request and return the JSON object.
///
/// Text that does not contain a JSON object is reported as
/// [`AgentError::MalformedOutput`] so callers can fall back to a default.
pub async fn generate_structured(
    backend: &dyn GenerationBackend,
    request: GenerationRequest,
) -> AgentResult<Value> {
    let shape = match &request.shape {
        ResponseShape::Structured { name, .. } => name.clone(),
        ResponseShape::Text => "text".to_string(),
    };
    match backend.generate(request).await? {
        Generation::Structured(value) if value.is_object() => Ok(value),
        Generation::Structured(value) => Err(AgentError::malformed(
            shape,
            format!("expected an object, got {}", value),
        )),
        Generation::Text(text) => extract_json_object(&text)
            .ok_or_else(|| AgentError::malformed(shape, "no JSON object in response")),
    }
}

/// Pull a JSON object out of free text, tolerating code fences and prose.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value.is_object().then_some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Value>(&trimmed[start..=end])
        .ok()
        .filter(Value::is_object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tiers() {
        assert_eq!(ModelTier::Standard.max_tokens(), 512);
        assert_eq!(ModelTier::Utility.max_tokens(), 256);
        assert!(ModelTier::Utility.temperature() < ModelTier::Standard.temperature());
    }

    #[test]
    fn test_request_builders() {
        let request = GenerationRequest::text("be brief", vec![Message::user("hi")]);
        assert_eq!(request.shape, ResponseShape::Text);
        assert_eq!(request.tier, ModelTier::Standard);
        assert_eq!(request.last_message(), Some("hi"));

        let request = GenerationRequest::structured("route", Vec::new(), "route_query", json!({}));
        assert_eq!(request.tier, ModelTier::Utility);
        assert!(request.last_message().is_none());
    }

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_extract_fenced_json() {
        let text = "Here you go:\n```json\n{\"destination_agents\": [\"web_searcher\"]}\n```";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["destination_agents"][0], "web_searcher");
    }

    #[test]
    fn test_extract_rejects_non_objects() {
        assert!(extract_json_object("[1, 2]").is_none());
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("} backwards {").is_none());
    }

    #[test]
    fn test_into_text() {
        assert_eq!(Generation::Text("x".into()).into_text(), "x");
        assert_eq!(Generation::Structured(json!({"k": 1})).into_text(), r#"{"k":1}"#);
    }
}
