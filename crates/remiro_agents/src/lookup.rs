//! External lookup service.
//!
//! The enrichment stage only needs `search(query) -> text`. The default
//! implementation calls the Serper Google Search API and flattens the JSON
//! answer into plain text lines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the lookup service.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("search request failed: {0}")]
    Request(String),

    #[error("search service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse search response: {0}")]
    Parse(String),
}

/// Trait for external lookups.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Run a query and return raw result text.
    async fn search(&self, query: &str) -> Result<String, LookupError>;
}

/// Serper (google.serper.dev) search client.
pub struct SerperLookup {
    api_key: String,
    endpoint: String,
    num_results: u8,
    client: reqwest::Client,
}

impl SerperLookup {
    pub const DEFAULT_ENDPOINT: &'static str = "https://google.serper.dev/search";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: Self::DEFAULT_ENDPOINT.to_string(),
            num_results: 10,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LookupService for SerperLookup {
    async fn search(&self, query: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&SerperRequest {
                q: query.to_string(),
                num: self.num_results,
            })
            .send()
            .await
            .map_err(|e| LookupError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LookupError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Parse(e.to_string()))?;

        Ok(render_results(&parsed))
    }
}

/// Flatten a Serper response into text, best answers first.
pub fn render_results(response: &SerperResponse) -> String {
    let mut lines = Vec::new();

    if let Some(answer) = &response.answer_box {
        if let Some(text) = answer.answer.as_ref().or(answer.snippet.as_ref()) {
            lines.push(text.clone());
        }
    }

    if let Some(kg) = &response.knowledge_graph {
        match (&kg.title, &kg.description) {
            (Some(title), Some(description)) => lines.push(format!("{}: {}", title, description)),
            (None, Some(description)) => lines.push(description.clone()),
            _ => {}
        }
    }

    for result in &response.organic {
        let mut line = result.title.clone();
        if let Some(snippet) = &result.snippet {
            line.push_str(" - ");
            line.push_str(snippet);
        }
        if let Some(link) = &result.link {
            line.push_str(&format!(" ({})", link));
        }
        lines.push(line);
    }

    if lines.is_empty() {
        "No good search result found".to_string()
    } else {
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest {
    q: String,
    num: u8,
}

/// Subset of the Serper search response we use.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerperResponse {
    #[serde(default)]
    pub answer_box: Option<SerperAnswerBox>,
    #[serde(default)]
    pub knowledge_graph: Option<SerperKnowledgeGraph>,
    #[serde(default)]
    pub organic: Vec<SerperOrganic>,
}

#[derive(Debug, Deserialize)]
pub struct SerperAnswerBox {
    pub answer: Option<String>,
    pub snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SerperKnowledgeGraph {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SerperOrganic {
    pub title: String,
    pub link: Option<String>,
    pub snippet: Option<String>,
}
