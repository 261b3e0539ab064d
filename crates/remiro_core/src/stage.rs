//! Stage definitions.
//!
//! A stage is one node of the turn graph. It reads a snapshot of the
//! [`TurnState`] and returns a [`TurnPatch`]; it never mutates the state
//! itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use async_trait::async_trait;
//! use remiro_core::{CoreResult, Stage, StageId, TurnPatch, TurnState};
//!
//! struct Noop;
//!
//! #[async_trait]
//! impl Stage for Noop {
//!     fn id(&self) -> StageId { StageId::CompactHistory }
//!     fn description(&self) -> &str { "Leaves the transcript alone" }
//!
//!     async fn run(&self, _state: &TurnState) -> CoreResult<TurnPatch> {
//!         Ok(TurnPatch::new())
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::state::{TurnPatch, TurnState};

/// Nodes of the turn graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    Route,
    Enrich,
    FanOut,
    Synthesize,
    DistillProfile,
    CompactHistory,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Route => "route",
            StageId::Enrich => "enrich",
            StageId::FanOut => "fan_out",
            StageId::Synthesize => "synthesize",
            StageId::DistillProfile => "distill_profile",
            StageId::CompactHistory => "compact_history",
        }
    }

    pub fn all() -> Vec<StageId> {
        vec![
            StageId::Route,
            StageId::Enrich,
            StageId::FanOut,
            StageId::Synthesize,
            StageId::DistillProfile,
            StageId::CompactHistory,
        ]
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for stage implementations.
///
/// Stages must be `Send + Sync` so a graph can be shared behind an `Arc`,
/// even though a single turn runs them one after another.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Graph node this stage implements.
    fn id(&self) -> StageId;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Compute this stage's patch from the current state.
    async fn run(&self, state: &TurnState) -> CoreResult<TurnPatch>;
}
