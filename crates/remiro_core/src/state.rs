//! Turn state and the patches stages return.
//!
//! Stages never mutate the state directly. Each one reads a snapshot and
//! returns a [`TurnPatch`]; the graph applies it with [`TurnState::apply`],
//! which is also where the write-once and fan-out rules are enforced.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::budget::MAX_SPECIALISTS;
use crate::error::{CoreError, CoreResult};
use crate::message::{Message, MessageRole};
use crate::profile::Profile;
use crate::specialist::{OutputSource, Specialist};

/// Router outcome for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDecision {
    /// Specialists to run, in order
    pub specialists: Vec<Specialist>,
    /// Whether the enrichment stage runs before fan-out
    pub enrich: bool,
}

/// Outputs recorded this turn, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecialistOutputs {
    entries: Vec<(OutputSource, String)>,
}

impl SpecialistOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an output, replacing an earlier one under the same key.
    pub fn insert(&mut self, source: OutputSource, text: impl Into<String>) {
        let text = text.into();
        match self.entries.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = text,
            None => self.entries.push((source, text)),
        }
    }

    pub fn get(&self, source: OutputSource) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == source)
            .map(|(_, t)| t.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (OutputSource, &str)> {
        self.entries.iter().map(|(s, t)| (*s, t.as_str()))
    }

    pub fn keys(&self) -> Vec<OutputSource> {
        self.entries.iter().map(|(s, _)| *s).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ephemeral state for one turn.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    /// Ordered transcript, ending with the current user input at turn start
    pub transcript: Vec<Message>,
    /// Durable profile loaded at turn start
    pub profile: Profile,
    /// Specialists selected by the router
    pub active_specialists: Vec<Specialist>,
    /// Whether the router asked for enrichment
    pub enrichment_requested: bool,
    /// Outputs keyed by specialist (or enrichment)
    pub specialist_outputs: SpecialistOutputs,
    /// Summarised lookup text, set at most once
    pub enrichment_result: Option<String>,
    routed: bool,
}

impl TurnState {
    /// Start a turn from prior history, the stored profile and the new input.
    pub fn new(history: Vec<Message>, profile: Profile, input: impl Into<String>) -> Self {
        let mut transcript = history;
        transcript.push(Message::user(input));
        Self {
            transcript,
            profile,
            ..Self::default()
        }
    }

    /// Content of the most recent user message.
    pub fn latest_user_input(&self) -> &str {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Number of user messages currently in the transcript.
    pub fn user_message_count(&self) -> usize {
        self.transcript
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }

    /// Most recent assistant message, if any.
    pub fn latest_reply(&self) -> Option<&Message> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
    }

    /// Whether the router has already written its decision.
    pub fn is_routed(&self) -> bool {
        self.routed
    }

    /// Merge a stage's patch into the state.
    pub fn apply(&mut self, patch: TurnPatch) -> CoreResult<()> {
        if let Some(route) = patch.route {
            self.apply_route(route)?;
        }

        if let Some(result) = patch.enrichment_result {
            if self.enrichment_result.is_some() {
                return Err(CoreError::InvalidState(
                    "enrichment result already set this turn".to_string(),
                ));
            }
            self.enrichment_result = Some(result);
        }

        for (source, text) in patch.outputs {
            if let OutputSource::Specialist(s) = source {
                if !self.active_specialists.contains(&s) {
                    return Err(CoreError::InvalidState(format!(
                        "output recorded for inactive specialist {}",
                        s
                    )));
                }
            }
            self.specialist_outputs.insert(source, text);
        }

        if let Some(transcript) = patch.replace_transcript {
            self.transcript = transcript;
        }
        self.transcript.extend(patch.append_messages);

        if let Some(updates) = patch.profile_updates {
            self.profile.merge(updates);
        }

        Ok(())
    }

    fn apply_route(&mut self, route: RouteDecision) -> CoreResult<()> {
        if self.routed {
            return Err(CoreError::InvalidState(
                "active specialists already chosen this turn".to_string(),
            ));
        }
        if route.specialists.len() > MAX_SPECIALISTS {
            return Err(CoreError::InvalidState(format!(
                "{} specialists selected, at most {} allowed",
                route.specialists.len(),
                MAX_SPECIALISTS
            )));
        }
        for (i, s) in route.specialists.iter().enumerate() {
            if route.specialists[..i].contains(s) {
                return Err(CoreError::InvalidState(format!("duplicate specialist {}", s)));
            }
        }
        self.active_specialists = route.specialists;
        self.enrichment_requested = route.enrich;
        self.routed = true;
        Ok(())
    }
}

/// Partial update produced by one stage.
#[derive(Debug, Clone, Default)]
pub struct TurnPatch {
    pub route: Option<RouteDecision>,
    pub enrichment_result: Option<String>,
    pub outputs: Vec<(OutputSource, String)>,
    pub replace_transcript: Option<Vec<Message>>,
    pub append_messages: Vec<Message>,
    pub profile_updates: Option<serde_json::Map<String, Value>>,
}

impl TurnPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, route: RouteDecision) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_enrichment(mut self, text: impl Into<String>) -> Self {
        self.enrichment_result = Some(text.into());
        self
    }

    pub fn with_output(mut self, source: OutputSource, text: impl Into<String>) -> Self {
        self.outputs.push((source, text.into()));
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.append_messages.push(message);
        self
    }

    pub fn with_transcript(mut self, transcript: Vec<Message>) -> Self {
        self.replace_transcript = Some(transcript);
        self
    }

    pub fn with_profile_updates(mut self, updates: serde_json::Map<String, Value>) -> Self {
        self.profile_updates = Some(updates);
        self
    }

    /// True when applying this patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.route.is_none()
            && self.enrichment_result.is_none()
            && self.outputs.is_empty()
            && self.replace_transcript.is_none()
            && self.append_messages.is_empty()
            && self.profile_updates.is_none()
    }
}
