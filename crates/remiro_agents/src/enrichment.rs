//! Enrichment stage.
//!
//! Looks the query up externally and condenses the raw results into a
//! short, cited summary for the specialists. Nothing here fails the turn:
//! a missing credential, a lookup error or a failed summary all become a
//! diagnostic string in place of the result.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use remiro_core::budget::{HISTORY_WINDOW, LOOKUP_RAW_CHARS};
use remiro_core::{
    recent_window, truncate_head, CoreResult, Message, OutputSource, Stage, StageId, TurnPatch,
    TurnState,
};

use crate::backend::{generate_text, GenerationBackend, GenerationRequest, ModelTier};
use crate::lookup::LookupService;
use crate::prompts::ENRICHMENT_PROMPT;

/// Prefix of every degraded enrichment result.
pub const UNAVAILABLE_PREFIX: &str = "[Web search unavailable]";

/// External lookup plus summary.
pub struct EnrichmentUnit {
    backend: Arc<dyn GenerationBackend>,
    lookup: Option<Arc<dyn LookupService>>,
}

impl EnrichmentUnit {
    /// `lookup` is `None` when no search credential is configured.
    pub fn new(backend: Arc<dyn GenerationBackend>, lookup: Option<Arc<dyn LookupService>>) -> Self {
        Self { backend, lookup }
    }

    /// Run the lookup and summary. Always returns text.
    pub async fn enrich(&self, query: &str, history: &[Message]) -> String {
        let Some(lookup) = &self.lookup else {
            warn!("Enrichment requested but no lookup credential is configured");
            return format!(
                "{} SERPER_API_KEY is not set. Add a key from https://serper.dev/ to enable web research.",
                UNAVAILABLE_PREFIX
            );
        };

        let raw = match lookup.search(query).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Lookup failed, continuing without web data");
                return format!(
                    "{} The search service could not be reached (missing or invalid key, quota, or network). Details: {}",
                    UNAVAILABLE_PREFIX, e
                );
            }
        };

        let raw = truncate_head(&raw, LOOKUP_RAW_CHARS);
        let mut messages = history.to_vec();
        messages.push(Message::user(format!(
            "User query: {}\n\nRaw search results:\n{}\n\nPresent only the most relevant, reliable facts, figures, links and trends for the other specialists.",
            query, raw
        )));

        let request =
            GenerationRequest::text(ENRICHMENT_PROMPT, messages).with_tier(ModelTier::Utility);
        match generate_text(self.backend.as_ref(), request).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Could not summarise search results");
                format!(
                    "{} Search results were found but could not be summarised. Details: {}",
                    UNAVAILABLE_PREFIX, e
                )
            }
        }
    }
}

#[async_trait]
impl Stage for EnrichmentUnit {
    fn id(&self) -> StageId {
        StageId::Enrich
    }

    fn description(&self) -> &str {
        "Looks up fresh external facts and summarises them"
    }

    async fn run(&self, state: &TurnState) -> CoreResult<TurnPatch> {
        let history = recent_window(&state.transcript, HISTORY_WINDOW);
        let text = self.enrich(state.latest_user_input(), history).await;
        info!(chars = text.chars().count(), "Enrichment complete");

        Ok(TurnPatch::new()
            .with_enrichment(text.clone())
            .with_output(OutputSource::Enrichment, text))
    }
}
