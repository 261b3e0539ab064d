//! LLM adapter for chat completions.
//!
//! Supports OpenAI and Anthropic APIs. Structured requests use OpenAI's
//! `json_schema` response format; for Anthropic the schema is appended to
//! the system prompt and the JSON is pulled out of the reply text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use remiro_core::{Message, MessageRole};

use crate::backend::{
    extract_json_object, Generation, GenerationBackend, GenerationRequest, ResponseShape,
};
use crate::error::{AgentError, AgentResult};

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Parse a provider name as written in settings files.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Some(LlmProvider::OpenAI),
            "anthropic" => Some(LlmProvider::Anthropic),
            _ => None,
        }
    }

    /// Environment variable holding this provider's key.
    pub fn key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "gpt-4o-mini",
            LlmProvider::Anthropic => "claude-3-5-haiku-latest",
        }
    }
}

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        Self {
            provider,
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// Get the current provider
    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Get the current model
    pub fn model(&self) -> &str {
        &self.model
    }

    // OpenAI chat completion
    async fn complete_openai(&self, request: &GenerationRequest) -> AgentResult<Generation> {
        let url = "https://api.openai.com/v1/chat/completions";

        let mut messages = vec![OpenAIMessage {
            role: "system".to_string(),
            content: request.instructions.clone(),
        }];
        messages.extend(request.messages.iter().map(|m| OpenAIMessage {
            role: m.role.as_str().to_string(),
            content: m.content.clone(),
        }));

        let response_format = match &request.shape {
            ResponseShape::Text => None,
            ResponseShape::Structured { name, schema } => Some(OpenAIResponseFormat {
                kind: "json_schema".to_string(),
                json_schema: OpenAIJsonSchema {
                    name: name.clone(),
                    schema: schema.clone(),
                },
            }),
        };

        let body = OpenAIRequest {
            model: self.model.clone(),
            messages,
            temperature: request.tier.temperature(),
            max_completion_tokens: request.tier.max_tokens(),
            response_format,
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Llm(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!("OpenAI API error {}: {}", status, body)));
        }

        let result: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Llm(format!("Failed to parse response: {}", e)))?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AgentError::Llm("No response from OpenAI".to_string()))?;

        Ok(shape_output(&request.shape, content))
    }

    // Anthropic messages API
    async fn complete_anthropic(&self, request: &GenerationRequest) -> AgentResult<Generation> {
        let url = "https://api.anthropic.com/v1/messages";

        let mut system = request.instructions.clone();
        if let ResponseShape::Structured { name, schema } = &request.shape {
            system.push_str(&format!(
                "\n\nRespond with ONLY a JSON object (\"{}\") that matches this JSON schema, with no other text:\n{}",
                name, schema
            ));
        }

        let messages = anthropic_messages(&request.messages, &mut system);

        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.tier.max_tokens(),
            temperature: request.tier.temperature(),
            system,
            messages,
        };

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Llm(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Llm(format!(
                "Anthropic API error {}: {}",
                status, body
            )));
        }

        let result: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Llm(format!("Failed to parse response: {}", e)))?;

        let content = result
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");
        if content.is_empty() {
            return Err(AgentError::Llm("No response from Anthropic".to_string()));
        }

        Ok(shape_output(&request.shape, content))
    }
}

#[async_trait]
impl GenerationBackend for LlmAdapter {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: GenerationRequest) -> AgentResult<Generation> {
        debug!(
            "Generating with {:?}/{} ({} messages, {:?})",
            self.provider,
            self.model,
            request.messages.len(),
            request.tier
        );
        match self.provider {
            LlmProvider::OpenAI => self.complete_openai(&request).await,
            LlmProvider::Anthropic => self.complete_anthropic(&request).await,
        }
    }
}

/// Wrap raw reply text according to the requested shape.
fn shape_output(shape: &ResponseShape, content: String) -> Generation {
    match shape {
        ResponseShape::Text => Generation::Text(content),
        ResponseShape::Structured { .. } => match extract_json_object(&content) {
            Some(value) => Generation::Structured(value),
            None => Generation::Text(content),
        },
    }
}

/// Convert transcript messages for the Anthropic API.
///
/// System messages are folded into the system prompt, and the conversation
/// must open with a user turn.
fn anthropic_messages(messages: &[Message], system: &mut String) -> Vec<AnthropicMessage> {
    let mut out = Vec::new();
    for m in messages {
        match m.role {
            MessageRole::System => {
                system.push_str("\n\n");
                system.push_str(&m.content);
            }
            MessageRole::User | MessageRole::Assistant => out.push(AnthropicMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            }),
        }
    }
    if out.first().map(|m| m.role != "user").unwrap_or(true) {
        out.insert(
            0,
            AnthropicMessage {
                role: "user".to_string(),
                content: "(conversation continues)".to_string(),
            },
        );
    }
    out
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_completion_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAIResponseFormat>,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    kind: String,
    json_schema: OpenAIJsonSchema,
}

#[derive(Debug, Serialize)]
struct OpenAIJsonSchema {
    name: String,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    system: String,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_models() {
        let openai = LlmAdapter::new(LlmProvider::OpenAI, "key".to_string(), None);
        assert_eq!(openai.model(), "gpt-4o-mini");

        let anthropic = LlmAdapter::new(LlmProvider::Anthropic, "key".to_string(), None);
        assert_eq!(anthropic.model(), "claude-3-5-haiku-latest");
    }

    #[test]
    fn test_custom_model() {
        let adapter = LlmAdapter::new(
            LlmProvider::OpenAI,
            "key".to_string(),
            Some("gpt-4.1".to_string()),
        );
        assert_eq!(adapter.model(), "gpt-4.1");
        assert_eq!(adapter.provider(), LlmProvider::OpenAI);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(LlmProvider::parse("OpenAI"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::parse(" anthropic "), Some(LlmProvider::Anthropic));
        assert_eq!(LlmProvider::parse("gemini"), None);
    }

    #[test]
    fn test_shape_output() {
        let shape = ResponseShape::Structured {
            name: "x".to_string(),
            schema: json!({}),
        };
        assert_eq!(
            shape_output(&shape, r#"{"a":1}"#.to_string()),
            Generation::Structured(json!({"a": 1}))
        );
        assert_eq!(
            shape_output(&shape, "not json".to_string()),
            Generation::Text("not json".to_string())
        );
        assert_eq!(
            shape_output(&ResponseShape::Text, r#"{"a":1}"#.to_string()),
            Generation::Text(r#"{"a":1}"#.to_string())
        );
    }

    #[test]
    fn test_anthropic_messages_fold_system_and_lead_with_user() {
        let mut system = "base".to_string();
        let messages = vec![
            Message::assistant("(Summary of earlier conversation)\nlikes remote work"),
            Message::system("be kind"),
            Message::user("what next?"),
        ];
        let out = anthropic_messages(&messages, &mut system);

        assert_eq!(system, "base\n\nbe kind");
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].role, "user");
        assert_eq!(out[1].role, "assistant");
        assert_eq!(out[2].content, "what next?");
    }

    #[test]
    fn test_openai_request_serialization() {
        let body = OpenAIRequest {
            model: "m".to_string(),
            messages: Vec::new(),
            temperature: 0.5,
            max_completion_tokens: 256,
            response_format: Some(OpenAIResponseFormat {
                kind: "json_schema".to_string(),
                json_schema: OpenAIJsonSchema {
                    name: "route_query".to_string(),
                    schema: json!({"type": "object"}),
                },
            }),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["response_format"]["type"], "json_schema");
        assert_eq!(value["response_format"]["json_schema"]["name"], "route_query");
    }
}
