//! Router stage.
//!
//! One structured call classifies the latest user message into route
//! targets. The backend's suggestion is then filtered and capped locally:
//! unknown identifiers are dropped, duplicates removed, at most
//! [`MAX_SPECIALISTS`] specialists kept, and enrichment only survives when
//! a freshness keyword confirms it or no specialist was chosen.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use remiro_core::budget::MAX_SPECIALISTS;
use remiro_core::{
    CoreError, CoreResult, Message, RouteDecision, Specialist, Stage, StageId, TurnPatch,
    TurnState, ENRICHMENT_ID,
};

use crate::backend::{generate_structured, GenerationBackend, GenerationRequest};
use crate::error::{AgentError, AgentResult};
use crate::prompts::ROUTER_PROMPT;

/// Name of the router's structured output.
pub const ROUTE_SHAPE: &str = "route_query";

/// Freshness terms that confirm an enrichment request.
pub const DEFAULT_ENRICHMENT_KEYWORDS: &[&str] = &[
    "search",
    "google",
    "news",
    "latest",
    "today",
    "current",
    "trend",
    "salary",
    "salaries",
    "market",
    "report",
    "reports",
    "statistic",
    "statistics",
    "stats",
    "2023",
    "2024",
    "2025",
    "data",
    "industry",
    "research",
    "article",
    "articles",
    "online",
    "website",
    "websites",
];

/// Tunable routing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Lowercase substrings that mark a query as needing fresh data
    #[serde(default = "default_keywords")]
    pub enrichment_keywords: Vec<String>,
}

fn default_keywords() -> Vec<String> {
    DEFAULT_ENRICHMENT_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            enrichment_keywords: default_keywords(),
        }
    }
}

impl RoutingConfig {
    /// Whether the lowercased input contains any freshness keyword.
    pub fn matches_freshness(&self, input: &str) -> bool {
        let lowered = input.to_lowercase();
        self.enrichment_keywords
            .iter()
            .filter(|k| !k.is_empty())
            .any(|k| lowered.contains(&k.to_lowercase()))
    }
}

/// One identifier from the router's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteTarget {
    Enrichment,
    Specialist(Specialist),
}

impl RouteTarget {
    pub fn parse(id: &str) -> AgentResult<Self> {
        if id.trim() == ENRICHMENT_ID {
            return Ok(RouteTarget::Enrichment);
        }
        Specialist::parse(id)
            .map(RouteTarget::Specialist)
            .ok_or_else(|| AgentError::InvalidRoute(id.to_string()))
    }
}

/// Turn the backend's suggested targets into this turn's decision.
pub fn apply_route_policy(
    suggested: &[RouteTarget],
    input: &str,
    config: &RoutingConfig,
) -> RouteDecision {
    let mut specialists: Vec<Specialist> = Vec::new();
    let mut wants_enrichment = false;

    for target in suggested {
        match target {
            RouteTarget::Enrichment => wants_enrichment = true,
            RouteTarget::Specialist(s) if !specialists.contains(s) => specialists.push(*s),
            RouteTarget::Specialist(_) => {}
        }
    }
    specialists.truncate(MAX_SPECIALISTS);

    let enrich =
        wants_enrichment && (specialists.is_empty() || config.matches_freshness(input));

    RouteDecision {
        specialists,
        enrich,
    }
}

/// JSON schema for the router's structured output.
pub fn route_schema() -> Value {
    let mut vocabulary = vec![ENRICHMENT_ID.to_string()];
    vocabulary.extend(Specialist::all().iter().map(|s| s.as_str().to_string()));
    json!({
        "type": "object",
        "properties": {
            "destination_agents": {
                "type": "array",
                "items": { "type": "string", "enum": vocabulary },
                "description": "Identifiers that should handle the message, most relevant first"
            }
        },
        "required": ["destination_agents"],
        "additionalProperties": false
    })
}

/// Classifies each user message.
pub struct Router {
    backend: Arc<dyn GenerationBackend>,
    config: RoutingConfig,
}

impl Router {
    pub fn new(backend: Arc<dyn GenerationBackend>, config: RoutingConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Ask the backend for targets, then apply the routing policy.
    pub async fn route(&self, input: &str) -> AgentResult<RouteDecision> {
        let request = GenerationRequest::structured(
            ROUTER_PROMPT,
            vec![Message::user(input)],
            ROUTE_SHAPE,
            route_schema(),
        );

        let suggested = match generate_structured(self.backend.as_ref(), request).await {
            Ok(value) => parse_targets(&value),
            Err(AgentError::MalformedOutput { message, .. }) => {
                warn!(error = %message, "Router returned malformed output, selecting no specialists");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        Ok(apply_route_policy(&suggested, input, &self.config))
    }
}

fn parse_targets(value: &Value) -> Vec<RouteTarget> {
    let Some(ids) = value.get("destination_agents").and_then(Value::as_array) else {
        warn!("Router output has no destination_agents list");
        return Vec::new();
    };

    ids.iter()
        .filter_map(|id| match id.as_str().map(RouteTarget::parse) {
            Some(Ok(target)) => Some(target),
            Some(Err(e)) => {
                warn!(error = %e, "Dropping route identifier");
                None
            }
            None => {
                warn!(value = %id, "Dropping non-string route identifier");
                None
            }
        })
        .collect()
}

#[async_trait]
impl Stage for Router {
    fn id(&self) -> StageId {
        StageId::Route
    }

    fn description(&self) -> &str {
        "Selects specialists and decides whether to enrich"
    }

    async fn run(&self, state: &TurnState) -> CoreResult<TurnPatch> {
        let decision = self
            .route(state.latest_user_input())
            .await
            .map_err(|e| CoreError::stage_failed(self.id(), e))?;

        info!(
            specialists = ?decision.specialists.iter().map(Specialist::as_str).collect::<Vec<_>>(),
            enrich = decision.enrich,
            "Routed message"
        );

        Ok(TurnPatch::new().with_route(decision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockReply};
    use remiro_core::Profile;

    fn targets(ids: &[&str]) -> Vec<RouteTarget> {
        ids.iter().filter_map(|id| RouteTarget::parse(id).ok()).collect()
    }

    fn router_with(reply: MockReply) -> (Router, MockBackend) {
        let backend = MockBackend::new().on_instructions("Master Orchestrator", reply);
        (
            Router::new(Arc::new(backend.clone()), RoutingConfig::default()),
            backend,
        )
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert_eq!(RouteTarget::parse("web_searcher").unwrap(), RouteTarget::Enrichment);
        assert_eq!(
            RouteTarget::parse("chief_marketing_officer").unwrap(),
            RouteTarget::Specialist(Specialist::ChiefMarketingOfficer)
        );
        assert!(matches!(
            RouteTarget::parse("astrologer"),
            Err(AgentError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_policy_caps_and_dedupes() {
        let suggested = targets(&[
            "grand_strategy_director",
            "web_searcher",
            "grand_strategy_director",
            "core_identity_architect",
            "chief_marketing_officer",
            "workplace_dynamics_coach",
        ]);
        let decision = apply_route_policy(&suggested, "plan my career", &RoutingConfig::default());
        assert_eq!(
            decision.specialists,
            vec![
                Specialist::GrandStrategyDirector,
                Specialist::CoreIdentityArchitect,
                Specialist::ChiefMarketingOfficer,
            ]
        );
        assert!(!decision.enrich);
    }

    #[test]
    fn test_enrichment_alone_always_runs() {
        let decision = apply_route_policy(
            &targets(&["web_searcher"]),
            "tell me something",
            &RoutingConfig::default(),
        );
        assert!(decision.specialists.is_empty());
        assert!(decision.enrich);
    }

    #[test]
    fn test_enrichment_needs_keyword_with_specialists() {
        let suggested = targets(&["web_searcher", "capability_growth_engineer"]);
        let config = RoutingConfig::default();

        let without = apply_route_policy(&suggested, "I want to learn Python but I'm busy", &config);
        assert!(!without.enrich);

        let with = apply_route_policy(&suggested, "Which skills are in the LATEST job market?", &config);
        assert!(with.enrich);
    }

    #[test]
    fn test_enrichment_never_inferred_without_request() {
        let decision = apply_route_policy(
            &targets(&["capability_growth_engineer"]),
            "salary data for 2025",
            &RoutingConfig::default(),
        );
        assert!(!decision.enrich);
    }

    #[test]
    fn test_custom_keywords() {
        let config = RoutingConfig {
            enrichment_keywords: vec!["benchmark".to_string()],
        };
        assert!(config.matches_freshness("Any Benchmark numbers?"));
        assert!(!config.matches_freshness("salary in 2025"));
        assert_eq!(RoutingConfig::default().enrichment_keywords.len(), 26);
    }

    #[test]
    fn test_schema_lists_vocabulary() {
        let schema = route_schema();
        let ids = schema["properties"]["destination_agents"]["items"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(ids.len(), 7);
        assert_eq!(ids[0], ENRICHMENT_ID);
    }

    #[tokio::test]
    async fn test_route_filters_invalid_ids() {
        let (router, backend) = router_with(MockReply::json(serde_json::json!({
            "destination_agents": ["capability_growth_engineer", "fortune_teller", 7, "grand_strategy_director"]
        })));

        let decision = router.route("I want to learn Python but I'm busy").await.unwrap();
        assert_eq!(
            decision.specialists,
            vec![Specialist::CapabilityGrowthEngineer, Specialist::GrandStrategyDirector]
        );

        let calls = backend.captured();
        assert!(matches!(
            &calls[0].shape,
            crate::backend::ResponseShape::Structured { name, .. } if name == ROUTE_SHAPE
        ));
    }

    #[tokio::test]
    async fn test_route_malformed_output_selects_nothing() {
        let (router, _) = router_with(MockReply::text("I think the strategist should answer."));
        let decision = router.route("help").await.unwrap();
        assert_eq!(decision, RouteDecision::default());
    }

    #[tokio::test]
    async fn test_route_backend_error_is_fatal() {
        let (router, _) = router_with(MockReply::error("invalid api key"));
        assert!(router.route("help").await.is_err());
    }

    #[tokio::test]
    async fn test_stage_patch() {
        let (router, _) = router_with(MockReply::json(serde_json::json!({
            "destination_agents": ["web_searcher", "grand_strategy_director"]
        })));
        let state = TurnState::new(Vec::new(), Profile::new(), "What is the salary outlook for 2025?");
        let patch = router.run(&state).await.unwrap();
        let route = patch.route.unwrap();
        assert_eq!(route.specialists, vec![Specialist::GrandStrategyDirector]);
        assert!(route.enrich);
    }
}
