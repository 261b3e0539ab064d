//! Synthesizer stage: merges this turn's outputs into the single reply.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use remiro_core::budget::SYNTHESIS_CHARS;
use remiro_core::{
    truncate_head, CoreError, CoreResult, Message, SpecialistOutputs, Stage, StageId, TurnPatch,
    TurnState,
};

use crate::backend::{generate_text, GenerationBackend, GenerationRequest, ModelTier};
use crate::error::AgentResult;
use crate::prompts::SYNTHESIZER_PROMPT;

/// Labelled output blocks, head-truncated to the synthesis budget.
pub fn format_outputs(outputs: &SpecialistOutputs) -> String {
    let joined = outputs
        .iter()
        .map(|(source, text)| format!("--- {} ---\n{}", source.label(), text))
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_head(&joined, SYNTHESIS_CHARS)
}

pub struct Synthesizer {
    backend: Arc<dyn GenerationBackend>,
}

impl Synthesizer {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Produce the user-facing reply.
    pub async fn synthesize(&self, query: &str, outputs: &SpecialistOutputs) -> AgentResult<String> {
        let formatted = format_outputs(outputs);
        debug!(sources = outputs.len(), chars = formatted.chars().count(), "Synthesizing");

        let input = format!("User query: {}\n\nSpecialist notes:\n{}", query, formatted);
        let request = GenerationRequest::text(SYNTHESIZER_PROMPT, vec![Message::user(input)])
            .with_tier(ModelTier::Standard);
        generate_text(self.backend.as_ref(), request).await
    }
}

#[async_trait]
impl Stage for Synthesizer {
    fn id(&self) -> StageId {
        StageId::Synthesize
    }

    fn description(&self) -> &str {
        "Merges specialist outputs into one reply"
    }

    async fn run(&self, state: &TurnState) -> CoreResult<TurnPatch> {
        let reply = self
            .synthesize(state.latest_user_input(), &state.specialist_outputs)
            .await
            .map_err(|e| CoreError::stage_failed(self.id(), e))?;

        info!(chars = reply.chars().count(), "Reply ready");
        Ok(TurnPatch::new().with_message(Message::assistant(reply)))
    }
}
