//! Fan-out stage.
//!
//! Runs the routed specialists one after another. Each unit sees the
//! insights of the units that ran before it this turn, never the reverse.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use remiro_core::{
    CoreError, CoreResult, OutputSource, Specialist, Stage, StageId, TurnPatch, TurnState,
};

use crate::backend::GenerationBackend;
use crate::error::AgentResult;
use crate::specialist::{SpecialistContext, SpecialistUnit};

/// Insights block appended after each specialist runs.
pub fn insight_block(specialist: Specialist, text: &str) -> String {
    format!("--- {} ---\n{}\n\n", specialist.label(), text)
}

/// Table of specialist units, looked up by role.
pub struct FanOut {
    units: BTreeMap<Specialist, SpecialistUnit>,
}

impl FanOut {
    /// Empty table; see [`FanOut::with_all`] for the usual setup.
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
        }
    }

    /// One unit per role, all sharing `backend`.
    pub fn with_all(backend: Arc<dyn GenerationBackend>) -> Self {
        let mut fan_out = Self::new();
        for specialist in Specialist::all() {
            fan_out.register(SpecialistUnit::new(specialist, Arc::clone(&backend)));
        }
        fan_out
    }

    pub fn register(&mut self, unit: SpecialistUnit) {
        self.units.insert(unit.specialist(), unit);
    }

    /// Run the active specialists in order and collect their outputs.
    pub async fn run_cascade(&self, state: &TurnState) -> AgentResult<Vec<(Specialist, String)>> {
        let mut insights = String::new();
        let mut outputs = Vec::with_capacity(state.active_specialists.len());

        for specialist in &state.active_specialists {
            let Some(unit) = self.units.get(specialist) else {
                warn!(specialist = %specialist, "No unit registered, skipping");
                continue;
            };

            let context = SpecialistContext::build(state, &insights);
            let text = unit.advise(&context).await?;
            debug!(specialist = %specialist, chars = text.chars().count(), "Specialist replied");

            insights.push_str(&insight_block(*specialist, &text));
            outputs.push((*specialist, text));
        }

        Ok(outputs)
    }
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Stage for FanOut {
    fn id(&self) -> StageId {
        StageId::FanOut
    }

    fn description(&self) -> &str {
        "Runs the selected specialists as a cascade"
    }

    async fn run(&self, state: &TurnState) -> CoreResult<TurnPatch> {
        let outputs = self
            .run_cascade(state)
            .await
            .map_err(|e| CoreError::stage_failed(self.id(), e))?;

        info!(count = outputs.len(), "Specialists finished");

        Ok(outputs
            .into_iter()
            .fold(TurnPatch::new(), |patch, (specialist, text)| {
                patch.with_output(OutputSource::Specialist(specialist), text)
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockReply};
    use remiro_core::{Profile, RouteDecision};

    fn routed(specialists: Vec<Specialist>) -> TurnState {
        let mut state = TurnState::new(Vec::new(), Profile::new(), "Help me plan my next move");
        state
            .apply(TurnPatch::new().with_route(RouteDecision {
                specialists,
                enrich: false,
            }))
            .unwrap();
        state
    }

    fn scripted() -> MockBackend {
        MockBackend::new()
            .on_instructions("Core Identity Architect", MockReply::text("A: you are analytical"))
            .on_instructions("Grand Strategy Director", MockReply::text("B: three-phase plan"))
            .on_instructions("Chief Marketing Officer", MockReply::text("C: rewrite your headline"))
    }

    #[tokio::test]
    async fn test_cascade_threads_earlier_insights() {
        let backend = scripted();
        let fan_out = FanOut::with_all(Arc::new(backend.clone()));
        let state = routed(vec![
            Specialist::CoreIdentityArchitect,
            Specialist::GrandStrategyDirector,
            Specialist::ChiefMarketingOfficer,
        ]);

        let outputs = fan_out.run_cascade(&state).await.unwrap();
        assert_eq!(outputs.len(), 3);

        let calls = backend.captured();
        assert_eq!(calls.len(), 3);
        let inputs: Vec<&str> = calls.iter().map(|c| c.last_message().unwrap()).collect();

        assert!(!inputs[0].contains("Insights from other specialists"));
        assert!(inputs[1].contains("A: you are analytical"));
        assert!(!inputs[1].contains("B: three-phase plan"));
        assert!(inputs[2].contains("A: you are analytical"));
        assert!(inputs[2].contains("B: three-phase plan"));

        let a = inputs[2].find("--- Core Identity Architect ---").unwrap();
        let b = inputs[2].find("--- Strategy Director ---").unwrap();
        assert!(a < b);
    }

    #[tokio::test]
    async fn test_missing_unit_is_skipped() {
        let backend = scripted();
        let mut fan_out = FanOut::new();
        fan_out.register(SpecialistUnit::new(
            Specialist::GrandStrategyDirector,
            Arc::new(backend.clone()),
        ));
        let state = routed(vec![
            Specialist::CoreIdentityArchitect,
            Specialist::GrandStrategyDirector,
        ]);

        let patch = fan_out.run(&state).await.unwrap();
        assert_eq!(
            patch.outputs,
            vec![(
                OutputSource::Specialist(Specialist::GrandStrategyDirector),
                "B: three-phase plan".to_string()
            )]
        );
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_no_specialists_no_calls() {
        let backend = scripted();
        let fan_out = FanOut::with_all(Arc::new(backend.clone()));
        let patch = fan_out.run(&routed(Vec::new())).await.unwrap();
        assert!(patch.is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_backend_error_fails_stage() {
        let backend = MockBackend::new().with_fallback(MockReply::error("down"));
        let fan_out = FanOut::with_all(Arc::new(backend));
        let err = fan_out
            .run(&routed(vec![Specialist::WorkplaceDynamicsCoach]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::StageExecutionFailed { stage: StageId::FanOut, .. }
        ));
    }

    #[test]
    fn test_insight_block_format() {
        assert_eq!(
            insight_block(Specialist::WorkplaceDynamicsCoach, "set boundaries"),
            "--- Dynamics Coach ---\nset boundaries\n\n"
        );
    }
}
