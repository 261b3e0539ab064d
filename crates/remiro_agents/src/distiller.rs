//! Profile distiller stage.
//!
//! Every third user message, asks the backend which durable facts the
//! recent conversation revealed and merges them into the profile by key.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use remiro_core::budget::{DISTILL_CADENCE, DISTILL_WINDOW};
use remiro_core::{
    recent_window, transcript_text, CoreError, CoreResult, Message, Profile, Stage, StageId,
    TurnPatch, TurnState,
};

use crate::backend::{generate_structured, GenerationBackend, GenerationRequest};
use crate::error::{AgentError, AgentResult};
use crate::prompts::DISTILLER_PROMPT;

pub const PROFILE_SHAPE: &str = "profile_update";

/// Whether the distiller runs for this many user messages.
pub fn should_run(user_messages: usize) -> bool {
    user_messages > 0 && user_messages % DISTILL_CADENCE == 0
}

pub fn profile_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "updated_profile": {
                "type": "object",
                "description": "Only the durable keys to add or change",
                "additionalProperties": true
            }
        },
        "required": ["updated_profile"]
    })
}

pub struct ProfileDistiller {
    backend: Arc<dyn GenerationBackend>,
}

impl ProfileDistiller {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Extract profile updates from the recent messages.
    ///
    /// Malformed output counts as "nothing learned". Null values are
    /// dropped so a reply can never erase a key.
    pub async fn distill(
        &self,
        profile: &Profile,
        recent: &[Message],
    ) -> AgentResult<Map<String, Value>> {
        let input = format!(
            "Current profile: {}\n\nRecent conversation:\n{}",
            profile.render(),
            transcript_text(recent)
        );
        let request = GenerationRequest::structured(
            DISTILLER_PROMPT,
            vec![Message::user(input)],
            PROFILE_SHAPE,
            profile_schema(),
        );

        let value = match generate_structured(self.backend.as_ref(), request).await {
            Ok(value) => value,
            Err(AgentError::MalformedOutput { message, .. }) => {
                warn!(error = %message, "Distiller output malformed, skipping profile update");
                return Ok(Map::new());
            }
            Err(e) => return Err(e),
        };

        match value.get("updated_profile") {
            Some(Value::Object(updates)) => Ok(updates
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()),
            Some(Value::Null) | None => Ok(Map::new()),
            Some(other) => {
                warn!(value = %other, "updated_profile is not an object, skipping");
                Ok(Map::new())
            }
        }
    }
}

#[async_trait]
impl Stage for ProfileDistiller {
    fn id(&self) -> StageId {
        StageId::DistillProfile
    }

    fn description(&self) -> &str {
        "Merges durable user facts into the profile"
    }

    async fn run(&self, state: &TurnState) -> CoreResult<TurnPatch> {
        let count = state.user_message_count();
        if !should_run(count) {
            debug!(user_messages = count, "Profile distillation not due");
            return Ok(TurnPatch::new());
        }

        let recent = recent_window(&state.transcript, DISTILL_WINDOW);
        let updates = self
            .distill(&state.profile, recent)
            .await
            .map_err(|e| CoreError::stage_failed(self.id(), e))?;

        if updates.is_empty() {
            info!("No durable facts learned");
            return Ok(TurnPatch::new());
        }

        info!(keys = ?updates.keys().collect::<Vec<_>>(), "Profile updated");
        Ok(TurnPatch::new().with_profile_updates(updates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockReply};

    fn state_with_user_turns(turns: usize, profile: Profile) -> TurnState {
        let mut history = Vec::new();
        for i in 1..turns {
            history.push(Message::user(format!("message {}", i)));
            history.push(Message::assistant(format!("reply {}", i)));
        }
        TurnState::new(history, profile, "I can't relocate and need at least 50k")
    }

    fn distiller_with(reply: MockReply) -> (ProfileDistiller, MockBackend) {
        let backend = MockBackend::new().on_instructions("Long-Term Profile Updater", reply);
        (ProfileDistiller::new(Arc::new(backend.clone())), backend)
    }

    #[test]
    fn test_cadence() {
        assert!(!should_run(0));
        assert!(!should_run(1));
        assert!(!should_run(2));
        assert!(should_run(3));
        assert!(!should_run(4));
        assert!(should_run(6));
    }

    #[tokio::test]
    async fn test_skips_off_cadence() {
        let (distiller, backend) = distiller_with(MockReply::json(json!({"updated_profile": {"a": 1}})));
        for turns in [1, 2, 4] {
            let patch = distiller.run(&state_with_user_turns(turns, Profile::new())).await.unwrap();
            assert!(patch.is_empty());
        }
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_runs_on_third_turn_and_merges() {
        let (distiller, backend) = distiller_with(MockReply::json(json!({
            "updated_profile": {"relocation": "not possible", "min_salary": 50000, "mood": null}
        })));
        let mut profile = Profile::new();
        profile.insert("current_role", json!("nurse"));
        let mut state = state_with_user_turns(3, profile);

        let patch = distiller.run(&state).await.unwrap();
        state.apply(patch).unwrap();

        assert_eq!(state.profile.get("current_role"), Some(&json!("nurse")));
        assert_eq!(state.profile.get("relocation"), Some(&json!("not possible")));
        assert_eq!(state.profile.get("min_salary"), Some(&json!(50000)));
        assert!(state.profile.get("mood").is_none());

        let calls = backend.captured();
        assert_eq!(calls.len(), 1);
        let input = calls[0].last_message().unwrap();
        assert!(input.starts_with(r#"Current profile: {"current_role":"nurse"}"#));
        assert!(input.contains("[user] I can't relocate"));
        assert_eq!(input.lines().filter(|l| l.starts_with('[')).count(), 5);
    }

    #[tokio::test]
    async fn test_only_recent_window_is_sent() {
        let (distiller, backend) = distiller_with(MockReply::json(json!({"updated_profile": {}})));
        let state = state_with_user_turns(9, Profile::new());
        assert_eq!(state.transcript.len(), 17);

        distiller.run(&state).await.unwrap();

        let calls = backend.captured();
        let input = calls[0].last_message().unwrap();
        let lines: Vec<&str> = input.lines().filter(|l| l.starts_with('[')).collect();
        assert_eq!(lines.len(), DISTILL_WINDOW);

        let oldest = &state.transcript[state.transcript.len() - DISTILL_WINDOW];
        assert_eq!(lines[0], oldest.transcript_line());
        assert!(!input.contains("[user] message 4"));
        assert_eq!(lines[DISTILL_WINDOW - 1], "[user] I can't relocate and need at least 50k");
    }

    #[tokio::test]
    async fn test_empty_or_malformed_is_no_update() {
        for reply in [
            MockReply::json(json!({"updated_profile": {}})),
            MockReply::json(json!({"something_else": true})),
            MockReply::json(json!({"updated_profile": "introvert"})),
            MockReply::text("The user seems tired."),
        ] {
            let (distiller, _) = distiller_with(reply);
            let patch = distiller.run(&state_with_user_turns(3, Profile::new())).await.unwrap();
            assert!(patch.is_empty());
        }
    }

    #[tokio::test]
    async fn test_backend_error_fails_stage() {
        let (distiller, _) = distiller_with(MockReply::error("server error"));
        let err = distiller
            .run(&state_with_user_turns(3, Profile::new()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::StageExecutionFailed { stage: StageId::DistillProfile, .. }
        ));
    }
}
