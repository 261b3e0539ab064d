//! History compactor stage.
//!
//! Once the transcript grows past [`COMPACT_THRESHOLD`] messages, the older
//! part is replaced by a single summary message. Only the most recent
//! [`COMPACT_OLDER_WINDOW`] of the older messages are summarised; anything
//! before that is dropped.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use remiro_core::budget::{COMPACT_KEEP_RECENT, COMPACT_OLDER_WINDOW, COMPACT_THRESHOLD};
use remiro_core::{
    recent_window, transcript_text, CoreError, CoreResult, Message, Stage, StageId, TurnPatch,
    TurnState,
};

use crate::backend::{generate_text, GenerationBackend, GenerationRequest, ModelTier};
use crate::error::AgentResult;
use crate::prompts::COMPACTION_PROMPT;

/// First line of every compaction summary.
pub const SUMMARY_HEADER: &str = "(Summary of earlier conversation)";

/// Split a transcript into the summarisable window and the verbatim tail.
///
/// Returns `None` when the transcript is within the threshold.
pub fn split_for_compaction(transcript: &[Message]) -> Option<(&[Message], &[Message])> {
    if transcript.len() <= COMPACT_THRESHOLD {
        return None;
    }
    let (older, recent) = transcript.split_at(transcript.len() - COMPACT_KEEP_RECENT);
    Some((recent_window(older, COMPACT_OLDER_WINDOW), recent))
}

pub struct HistoryCompactor {
    backend: Arc<dyn GenerationBackend>,
}

impl HistoryCompactor {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    /// Summarise `older` into one synthetic assistant message.
    pub async fn summarize(&self, older: &[Message]) -> AgentResult<Message> {
        let input = format!("Conversation so far:\n{}", transcript_text(older));
        let request = GenerationRequest::text(COMPACTION_PROMPT, vec![Message::user(input)])
            .with_tier(ModelTier::Utility);
        let summary = generate_text(self.backend.as_ref(), request).await?;
        Ok(Message::assistant(format!("{}\n{}", SUMMARY_HEADER, summary)))
    }
}

#[async_trait]
impl Stage for HistoryCompactor {
    fn id(&self) -> StageId {
        StageId::CompactHistory
    }

    fn description(&self) -> &str {
        "Summarises older messages once the transcript grows long"
    }

    async fn run(&self, state: &TurnState) -> CoreResult<TurnPatch> {
        let Some((older, recent)) = split_for_compaction(&state.transcript) else {
            debug!(messages = state.transcript.len(), "No compaction needed");
            return Ok(TurnPatch::new());
        };

        let summary = self
            .summarize(older)
            .await
            .map_err(|e| CoreError::stage_failed(self.id(), e))?;

        info!(
            before = state.transcript.len(),
            summarised = older.len(),
            kept = recent.len(),
            "Compacted history"
        );

        let mut transcript = Vec::with_capacity(recent.len() + 1);
        transcript.push(summary);
        transcript.extend_from_slice(recent);
        Ok(TurnPatch::new().with_transcript(transcript))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockReply};
    use remiro_core::{MessageRole, Profile};

    fn state_with(len: usize) -> TurnState {
        let history = (0..len - 1)
            .map(|i| {
                if i % 2 == 0 {
                    Message::user(format!("u{}", i))
                } else {
                    Message::assistant(format!("a{}", i))
                }
            })
            .collect();
        TurnState::new(history, Profile::new(), "latest")
    }

    fn compactor() -> (HistoryCompactor, MockBackend) {
        let backend = MockBackend::new().on_instructions(
            "Summarize the earlier part",
            MockReply::text("Wants remote data work; cannot relocate."),
        );
        (HistoryCompactor::new(Arc::new(backend.clone())), backend)
    }

    #[tokio::test]
    async fn test_noop_at_threshold() {
        let (compactor, backend) = compactor();
        let state = state_with(COMPACT_THRESHOLD);
        assert!(compactor.run(&state).await.unwrap().is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_compacts_61_to_11() {
        let (compactor, _) = compactor();
        let mut state = state_with(61);
        let original_tail = state.transcript[51..].to_vec();

        let patch = compactor.run(&state).await.unwrap();
        state.apply(patch).unwrap();

        assert_eq!(state.transcript.len(), 11);
        assert_eq!(state.transcript[0].role, MessageRole::Assistant);
        assert!(state.transcript[0].content.starts_with(SUMMARY_HEADER));
        assert_eq!(&state.transcript[1..], &original_tail[..]);
    }

    #[tokio::test]
    async fn test_only_recent_older_window_is_summarised() {
        let (compactor, backend) = compactor();
        let state = state_with(100);

        compactor.run(&state).await.unwrap();

        let input = backend.captured()[0].last_message().unwrap().to_string();
        let lines = input.lines().filter(|l| l.starts_with('[')).count();
        assert_eq!(lines, COMPACT_OLDER_WINDOW);
        // older = messages 0..90; the window is 50..90
        assert!(!input.contains("[user] u48\n"));
        assert!(input.contains("[user] u50\n"));
        assert!(input.ends_with("[assistant] a89"));
    }

    #[test]
    fn test_split_boundaries() {
        let transcript: Vec<Message> = (0..61).map(|i| Message::user(i.to_string())).collect();
        let (older, recent) = split_for_compaction(&transcript).unwrap();
        assert_eq!(older.len(), COMPACT_OLDER_WINDOW);
        assert_eq!(recent.len(), COMPACT_KEEP_RECENT);
        assert_eq!(older[0].content, "11");
        assert!(split_for_compaction(&transcript[..60]).is_none());
    }
}
