//! Settings loading.
//!
//! `<data_dir>/settings.json` is optional. Environment variables win over
//! the file:
//!
//! | Variable            | Purpose                               |
//! |---------------------|---------------------------------------|
//! | `OPENAI_API_KEY`    | OpenAI credential                     |
//! | `ANTHROPIC_API_KEY` | Anthropic credential                  |
//! | `REMIRO_LLM_MODEL`  | Model override                        |
//! | `SERPER_API_KEY`    | Search credential (optional)          |
//! | `REMIRO_DATA_DIR`   | Store root                            |

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use remiro_agents::{LlmAdapter, LlmProvider, RoutingConfig, SerperLookup};

use crate::error::{ChatError, ChatResult};

/// Data directory used when neither a flag nor `REMIRO_DATA_DIR` is given.
pub const DEFAULT_DATA_DIR: &str = ".remiro";

/// Contents of `settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// `openai` or `anthropic`; first configured key wins when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
    /// Replaces the built-in freshness keyword list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment_keywords: Option<Vec<String>>,
}

impl Settings {
    /// Load settings from `<data_dir>/settings.json`, or defaults if absent.
    pub fn load(data_dir: &Path) -> ChatResult<Self> {
        let path = data_dir.join("settings.json");
        if !path.exists() {
            debug!("No settings file at {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)
            .map_err(|e| ChatError::Settings(format!("{}: {}", path.display(), e)))
    }

    pub fn routing(&self) -> RoutingConfig {
        match &self.enrichment_keywords {
            Some(keywords) => RoutingConfig {
                enrichment_keywords: keywords.clone(),
            },
            None => RoutingConfig::default(),
        }
    }

    /// Build the generation backend from settings and the process environment.
    pub fn backend(&self) -> ChatResult<LlmAdapter> {
        self.backend_with(env_var)
    }

    /// Build the generation backend using `env` to read variables.
    pub fn backend_with(&self, env: impl Fn(&str) -> Option<String>) -> ChatResult<LlmAdapter> {
        let model = env("REMIRO_LLM_MODEL").or_else(|| self.default_model.clone());

        let provider = match self.default_provider.as_deref() {
            Some(name) => {
                let provider = LlmProvider::parse(name)
                    .ok_or_else(|| ChatError::Settings(format!("unknown provider '{}'", name)))?;
                env(provider.key_var())
                    .map(|key| (provider, key))
                    .ok_or(ChatError::LlmNotConfigured)?
            }
            None => [LlmProvider::OpenAI, LlmProvider::Anthropic]
                .into_iter()
                .find_map(|p| env(p.key_var()).map(|key| (p, key)))
                .ok_or(ChatError::LlmNotConfigured)?,
        };

        let adapter = LlmAdapter::new(provider.0, provider.1, model);
        info!(provider = ?adapter.provider(), model = adapter.model(), "LLM configured");
        Ok(adapter)
    }

    /// Search client, if a credential is available.
    pub fn lookup(&self) -> Option<SerperLookup> {
        self.lookup_with(env_var)
    }

    pub fn lookup_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<SerperLookup> {
        env("SERPER_API_KEY").map(SerperLookup::new)
    }
}

/// Resolve the data directory: explicit flag, then `REMIRO_DATA_DIR`, then the default.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| env_var("REMIRO_DATA_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Non-empty, trimmed environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
