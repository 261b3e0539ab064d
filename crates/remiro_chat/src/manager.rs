//! Chat manager.
//!
//! The entry point for a turn: load the profile and history, run the
//! graph, persist what the turn produced, return the reply.

use std::sync::Arc;

use tracing::{info, warn};

use remiro_agents::{build_turn_graph, GenerationBackend, LookupService, RoutingConfig};
use remiro_core::{Message, Profile, Specialist, TurnGraph, TurnState, TurnTrace};

use crate::error::{ChatError, ChatResult};
use crate::settings::Settings;
use crate::store::{ChatStore, SessionRecord};

/// Characters of the first message used as a session title.
pub const SESSION_TITLE_CHARS: usize = 60;

/// Title for a session started by `input`.
pub fn session_title(input: &str) -> String {
    let input = input.trim();
    match input.char_indices().nth(SESSION_TITLE_CHARS) {
        Some((cut, _)) => format!("{}...", &input[..cut]),
        None => input.to_string(),
    }
}

/// Result of one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub session_id: String,
    pub reply: String,
    pub profile: Profile,
    /// Specialists that ran this turn
    pub specialists: Vec<Specialist>,
    pub trace: TurnTrace,
}

/// Main chat manager
pub struct ChatManager {
    store: Arc<dyn ChatStore>,
    graph: Option<TurnGraph>,
}

impl ChatManager {
    pub fn new(store: Arc<dyn ChatStore>, graph: TurnGraph) -> Self {
        Self {
            store,
            graph: Some(graph),
        }
    }

    /// Manager for reading sessions and history; turns fail with
    /// [`ChatError::LlmNotConfigured`].
    pub fn read_only(store: Arc<dyn ChatStore>) -> Self {
        Self { store, graph: None }
    }

    /// Build the default graph over `backend`.
    pub fn with_backend(
        store: Arc<dyn ChatStore>,
        backend: Arc<dyn GenerationBackend>,
        lookup: Option<Arc<dyn LookupService>>,
        routing: RoutingConfig,
    ) -> Self {
        Self::new(store, build_turn_graph(backend, lookup, routing))
    }

    /// Build from settings and environment. Fails without a backend credential.
    pub fn from_settings(store: Arc<dyn ChatStore>, settings: &Settings) -> ChatResult<Self> {
        let backend: Arc<dyn GenerationBackend> = Arc::new(settings.backend()?);
        let lookup = settings
            .lookup()
            .map(|l| Arc::new(l) as Arc<dyn LookupService>);
        if lookup.is_none() {
            warn!("SERPER_API_KEY not set, web research will be unavailable");
        }
        Ok(Self::with_backend(store, backend, lookup, settings.routing()))
    }

    pub fn store(&self) -> &Arc<dyn ChatStore> {
        &self.store
    }

    /// Check if a generation backend is available
    pub fn has_llm(&self) -> bool {
        self.graph.is_some()
    }

    /// Run one turn for `user_id`.
    ///
    /// Without `session_id` a new session is created once the turn
    /// succeeds. Only the user message and the reply are persisted.
    pub async fn run_turn(
        &self,
        user_id: &str,
        input: &str,
        session_id: Option<&str>,
    ) -> ChatResult<TurnOutcome> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        let graph = self.graph.as_ref().ok_or(ChatError::LlmNotConfigured)?;

        let record = self.store.load_profile(user_id)?;
        let (session, history) = match session_id {
            Some(id) => {
                let session = self.owned_session(user_id, id)?;
                let history = self.store.load_messages(&session.id)?;
                (Some(session), history)
            }
            None => (None, Vec::new()),
        };

        let state = TurnState::new(history, record.data.clone(), input);
        let user_message = state
            .transcript
            .last()
            .cloned()
            .unwrap_or_else(|| Message::user(input));

        let run = graph.execute(state).await?;

        let reply = run
            .state
            .latest_reply()
            .cloned()
            .ok_or_else(|| ChatError::Turn("turn finished without a reply".to_string()))?;

        if run.state.profile != record.data {
            let version = self
                .store
                .save_profile(user_id, &run.state.profile, record.version)?;
            info!(user = user_id, version, "Profile saved");
        }

        let session = match session {
            Some(session) => session,
            None => self.store.create_session(user_id, &session_title(input))?,
        };
        self.store
            .append_messages(&session.id, &[user_message, reply.clone()])?;

        info!(
            session = %session.id,
            specialists = run.state.active_specialists.len(),
            "Turn complete"
        );

        Ok(TurnOutcome {
            session_id: session.id,
            reply: reply.content,
            profile: run.state.profile,
            specialists: run.state.active_specialists,
            trace: run.trace,
        })
    }

    /// A user's sessions, newest first.
    pub fn list_sessions(&self, user_id: &str) -> ChatResult<Vec<SessionRecord>> {
        self.store.list_sessions(user_id)
    }

    /// Like [`list_sessions`](Self::list_sessions), but a store failure yields an empty list.
    pub fn list_sessions_or_empty(&self, user_id: &str) -> Vec<SessionRecord> {
        self.list_sessions(user_id).unwrap_or_else(|e| {
            warn!(error = %e, "Could not load sessions");
            Vec::new()
        })
    }

    /// Messages of a session owned by `user_id`, oldest first.
    pub fn session_messages(&self, user_id: &str, session_id: &str) -> ChatResult<Vec<Message>> {
        let session = self.owned_session(user_id, session_id)?;
        self.store.load_messages(&session.id)
    }

    /// Like [`session_messages`](Self::session_messages), but a store failure yields no messages.
    pub fn session_messages_or_empty(&self, user_id: &str, session_id: &str) -> Vec<Message> {
        self.session_messages(user_id, session_id).unwrap_or_else(|e| {
            warn!(error = %e, "Could not load session history");
            Vec::new()
        })
    }

    pub fn profile(&self, user_id: &str) -> ChatResult<Profile> {
        Ok(self.store.load_profile(user_id)?.data)
    }

    fn owned_session(&self, user_id: &str, session_id: &str) -> ChatResult<SessionRecord> {
        let session = self.store.get_session(session_id)?;
        if session.user_id != user_id {
            warn!(session = session_id, "Session belongs to another user");
            return Err(ChatError::SessionNotFound(session_id.to_string()));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use remiro_agents::{MockBackend, MockReply};
    use serde_json::json;

    fn manager(backend: MockBackend) -> (ChatManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = ChatManager::with_backend(
            store.clone(),
            Arc::new(backend),
            None,
            RoutingConfig::default(),
        );
        (manager, store)
    }

    fn routed_backend() -> MockBackend {
        MockBackend::new()
            .on_instructions(
                "Master Orchestrator",
                MockReply::json(json!({"destination_agents": ["chief_marketing_officer"]})),
            )
            .on_instructions("Voice of Remiro", MockReply::text("Lead with impact."))
    }

    #[test]
    fn test_session_title() {
        assert_eq!(session_title("  Short question "), "Short question");
        let long = "a".repeat(61);
        assert_eq!(session_title(&long), format!("{}...", "a".repeat(60)));
        assert_eq!(session_title(&"b".repeat(60)), "b".repeat(60));
    }

    #[tokio::test]
    async fn test_empty_input_rejected_before_loading() {
        let backend = routed_backend();
        let (manager, store) = manager(backend.clone());
        assert!(matches!(
            manager.run_turn("u1", "   ", None).await,
            Err(ChatError::EmptyInput)
        ));
        assert_eq!(backend.call_count(), 0);
        assert!(store.list_sessions("u1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_first_turn_creates_session() {
        let (manager, store) = manager(routed_backend());
        let outcome = manager.run_turn("u1", "Fix my resume", None).await.unwrap();

        assert_eq!(outcome.reply, "Lead with impact.");
        assert_eq!(outcome.specialists, vec![Specialist::ChiefMarketingOfficer]);

        let sessions = store.list_sessions("u1").unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].title, "Fix my resume");

        let messages = manager.session_messages("u1", &outcome.session_id).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "Fix my resume");
        assert_eq!(messages[1].content, "Lead with impact.");
    }

    #[tokio::test]
    async fn test_foreign_session_is_not_found() {
        let (manager, _) = manager(routed_backend());
        let outcome = manager.run_turn("owner", "Fix my resume", None).await.unwrap();
        let err = manager
            .run_turn("intruder", "hello", Some(&outcome.session_id))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SessionNotFound(_)));
    }

    #[tokio::test]
    async fn test_foreign_session_history_is_hidden() {
        let (manager, _) = manager(routed_backend());
        let outcome = manager.run_turn("owner", "Fix my resume", None).await.unwrap();

        assert_eq!(manager.session_messages("owner", &outcome.session_id).unwrap().len(), 2);
        assert!(matches!(
            manager.session_messages("intruder", &outcome.session_id),
            Err(ChatError::SessionNotFound(_))
        ));
        assert!(manager
            .session_messages_or_empty("intruder", &outcome.session_id)
            .is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_persists_nothing() {
        let backend = MockBackend::new()
            .on_instructions(
                "Master Orchestrator",
                MockReply::json(json!({"destination_agents": []})),
            )
            .with_fallback(MockReply::error("backend down"));
        let (manager, store) = manager(backend);

        let err = manager.run_turn("u1", "hello", None).await.unwrap_err();
        assert!(matches!(err, ChatError::Turn(_)));
        assert!(store.list_sessions("u1").unwrap().is_empty());
        assert_eq!(store.message_count(), 0);
    }

    #[tokio::test]
    async fn test_read_only_manager() {
        let store = Arc::new(MemoryStore::new());
        let session = store.create_session("u1", "t").unwrap();
        let manager = ChatManager::read_only(store);

        assert!(!manager.has_llm());
        assert_eq!(manager.list_sessions("u1").unwrap().len(), 1);
        assert!(matches!(
            manager.run_turn("u1", "hello", Some(&session.id)).await,
            Err(ChatError::LlmNotConfigured)
        ));
    }

    #[test]
    fn test_lenient_reads() {
        let (manager, _) = manager(routed_backend());
        assert!(manager.list_sessions_or_empty("nobody").is_empty());
        assert!(manager.session_messages_or_empty("u1", "missing").is_empty());
        assert!(manager.session_messages("u1", "missing").is_err());
    }
}
