//! Specialist units.
//!
//! A unit is a role identity plus a backend handle. It never calls another
//! unit; the fan-out stage decides the order and hands each one the
//! insights gathered so far.

use std::sync::Arc;

use tracing::debug;

use remiro_core::budget::{ENRICHMENT_CONTEXT_CHARS, HISTORY_WINDOW, INSIGHTS_CHARS, PROFILE_CHARS};
use remiro_core::{recent_window, truncate_head, truncate_tail, Message, Specialist, TurnState};

use crate::backend::{generate_text, GenerationBackend, GenerationRequest, ModelTier};
use crate::error::AgentResult;
use crate::prompts::specialist_prompt;

/// Bounded context for one specialist call.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecialistContext {
    /// The user's latest message
    pub task: String,
    /// Last few transcript messages
    pub history: Vec<Message>,
    /// Profile JSON, head-truncated
    pub profile: String,
    /// Enrichment text, head-truncated
    pub enrichment: Option<String>,
    /// Earlier specialists' output this turn, tail-truncated
    pub insights: Option<String>,
}

impl SpecialistContext {
    /// Build the context from the turn state and the insights accumulated so far.
    pub fn build(state: &TurnState, insights: &str) -> Self {
        let enrichment = state
            .enrichment_result
            .as_deref()
            .filter(|text| !text.is_empty())
            .map(|text| truncate_head(text, ENRICHMENT_CONTEXT_CHARS));
        let insights = (!insights.is_empty()).then(|| truncate_tail(insights, INSIGHTS_CHARS));

        Self {
            task: state.latest_user_input().to_string(),
            history: recent_window(&state.transcript, HISTORY_WINDOW).to_vec(),
            profile: truncate_head(&state.profile.render(), PROFILE_CHARS),
            enrichment,
            insights,
        }
    }

    /// The text sent as the final user message.
    pub fn render_input(&self) -> String {
        let mut input = self.task.clone();
        input.push_str("\n\n[Shared user profile]: ");
        input.push_str(&self.profile);
        if let Some(enrichment) = &self.enrichment {
            input.push_str("\n\n[Shared web research]: ");
            input.push_str(enrichment);
        }
        if let Some(insights) = &self.insights {
            input.push_str("\n\n[Insights from other specialists so far]:\n");
            input.push_str(insights);
        }
        input
    }
}

/// One specialist role bound to a backend.
#[derive(Clone)]
pub struct SpecialistUnit {
    specialist: Specialist,
    backend: Arc<dyn GenerationBackend>,
}

impl SpecialistUnit {
    pub fn new(specialist: Specialist, backend: Arc<dyn GenerationBackend>) -> Self {
        Self {
            specialist,
            backend,
        }
    }

    pub fn specialist(&self) -> Specialist {
        self.specialist
    }

    /// Produce this specialist's advice for the given context.
    pub async fn advise(&self, context: &SpecialistContext) -> AgentResult<String> {
        let mut messages = context.history.clone();
        messages.push(Message::user(context.render_input()));

        debug!(
            specialist = %self.specialist,
            history = context.history.len(),
            insights = context.insights.as_ref().map(|i| i.chars().count()).unwrap_or(0),
            "Invoking specialist"
        );

        let request = GenerationRequest::text(specialist_prompt(self.specialist), messages)
            .with_tier(ModelTier::Standard);
        generate_text(self.backend.as_ref(), request).await
    }
}

impl std::fmt::Debug for SpecialistUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecialistUnit")
            .field("specialist", &self.specialist)
            .field("backend", &self.backend.name())
            .finish()
    }
}
