//! Turn graph executor.
//!
//! The graph is fixed:
//!
//! ```text
//! route ─┬─> enrich ─┐
//!        └───────────┴─> fan_out -> synthesize -> distill_profile -> compact_history
//! ```
//!
//! The only branch is after `route`: `enrich` runs iff the router asked for
//! it. Stages run one at a time, each exactly once at most. The first stage
//! error ends the turn.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::{CoreError, CoreResult};
use crate::registry::StageRegistry;
use crate::stage::StageId;
use crate::state::TurnState;

/// Turn execution state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

/// One executed stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub stage: StageId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Whether the stage's patch changed anything
    pub changed: bool,
}

/// Record of the path a turn took through the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnTrace {
    pub turn_id: String,
    pub state: ExecutionState,
    pub entries: Vec<TraceEntry>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

impl TurnTrace {
    fn new() -> Self {
        Self {
            turn_id: uuid::Uuid::new_v4().to_string(),
            state: ExecutionState::Pending,
            entries: Vec::new(),
            started_at: None,
            completed_at: None,
            error: None,
        }
    }

    /// Stages in the order they ran.
    pub fn path(&self) -> Vec<StageId> {
        self.entries.iter().map(|e| e.stage).collect()
    }

    /// Whether a given stage ran this turn.
    pub fn visited(&self, stage: StageId) -> bool {
        self.entries.iter().any(|e| e.stage == stage)
    }
}

/// Final state and trace of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnRun {
    pub state: TurnState,
    pub trace: TurnTrace,
}

/// Transition function of the graph.
///
/// `None` as input means "start"; `None` as output means "end".
pub fn next_stage(current: Option<StageId>, state: &TurnState) -> Option<StageId> {
    match current {
        None => Some(StageId::Route),
        Some(StageId::Route) if state.enrichment_requested => Some(StageId::Enrich),
        Some(StageId::Route) | Some(StageId::Enrich) => Some(StageId::FanOut),
        Some(StageId::FanOut) => Some(StageId::Synthesize),
        Some(StageId::Synthesize) => Some(StageId::DistillProfile),
        Some(StageId::DistillProfile) => Some(StageId::CompactHistory),
        Some(StageId::CompactHistory) => None,
    }
}

/// Runs turns over a registry of stages.
pub struct TurnGraph {
    registry: Arc<StageRegistry>,
}

impl TurnGraph {
    /// Create a graph over the given registry.
    pub fn new(registry: Arc<StageRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Run one turn to completion.
    pub async fn execute(&self, mut state: TurnState) -> CoreResult<TurnRun> {
        let mut trace = TurnTrace::new();
        trace.state = ExecutionState::Running;
        trace.started_at = Some(Utc::now());

        info!("Starting turn {}", trace.turn_id);

        let mut current = None;
        while let Some(stage_id) = next_stage(current, &state) {
            if let Err(e) = self.run_stage(stage_id, &mut state, &mut trace).await {
                error!("Turn {} failed at {}: {}", trace.turn_id, stage_id, e);
                trace.state = ExecutionState::Failed;
                trace.error = Some(e.to_string());
                trace.completed_at = Some(Utc::now());
                return Err(match e {
                    CoreError::StageExecutionFailed { .. } | CoreError::StageNotFound(_) => e,
                    other => CoreError::stage_failed(stage_id, other),
                });
            }
            current = Some(stage_id);
        }

        trace.state = ExecutionState::Completed;
        trace.completed_at = Some(Utc::now());
        info!(
            "Turn {} completed: {}",
            trace.turn_id,
            trace
                .path()
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Ok(TurnRun { state, trace })
    }

    async fn run_stage(
        &self,
        stage_id: StageId,
        state: &mut TurnState,
        trace: &mut TurnTrace,
    ) -> CoreResult<()> {
        let stage = self.registry.get_required(stage_id)?;
        let started_at = Utc::now();
        debug!("Executing stage {}", stage_id);

        let patch = stage.run(state).await?;
        let changed = !patch.is_empty();
        state.apply(patch)?;

        trace.entries.push(TraceEntry {
            stage: stage_id,
            started_at,
            completed_at: Utc::now(),
            changed,
        });
        Ok(())
    }
}
