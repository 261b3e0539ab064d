//! # remiro_core
//!
//! Turn state and orchestration graph for Remiro.
//!
//! A turn takes one user message through a fixed pipeline of stages:
//! route, optional enrichment, specialist fan-out, synthesis, profile
//! distillation and history compaction. This crate holds the pieces that do
//! not talk to the outside world:
//!
//! - **Messages and profile**: the transcript and the durable user facts
//! - **Turn state**: what stages read, and the patches they return
//! - **Budgets**: the capped-length hand-offs between stages
//! - **Graph**: the stage trait, registry and executor

pub mod budget;
pub mod error;
pub mod graph;
pub mod message;
pub mod profile;
pub mod registry;
pub mod specialist;
pub mod stage;
pub mod state;

pub use budget::{truncate_head, truncate_tail, TRUNCATION_MARKER};
pub use error::{CoreError, CoreResult};
pub use graph::{next_stage, ExecutionState, TraceEntry, TurnGraph, TurnRun, TurnTrace};
pub use message::{recent_window, transcript_text, Message, MessageRole};
pub use profile::Profile;
pub use registry::StageRegistry;
pub use specialist::{OutputSource, Specialist, ENRICHMENT_ID};
pub use stage::{Stage, StageId};
pub use state::{RouteDecision, SpecialistOutputs, TurnPatch, TurnState};
