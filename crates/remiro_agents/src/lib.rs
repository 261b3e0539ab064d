//! # remiro_agents
//!
//! The stages of a Remiro turn and the services they call.
//!
//! - [`backend`]: the generation seam, with an HTTP adapter in [`llm`] and a
//!   scripted double in [`mock`]
//! - [`lookup`]: the external search seam
//! - [`router`], [`enrichment`], [`fanout`], [`synthesizer`],
//!   [`distiller`], [`compactor`]: one module per graph stage
//! - [`graph`]: wires the stages into a [`remiro_core::TurnGraph`]

pub mod backend;
pub mod compactor;
pub mod distiller;
pub mod enrichment;
pub mod error;
pub mod fanout;
pub mod graph;
pub mod llm;
pub mod lookup;
pub mod mock;
pub mod prompts;
pub mod router;
pub mod specialist;
pub mod synthesizer;

pub use backend::{
    generate_structured, generate_text, Generation, GenerationBackend, GenerationRequest,
    ModelTier, ResponseShape,
};
pub use compactor::HistoryCompactor;
pub use distiller::ProfileDistiller;
pub use enrichment::EnrichmentUnit;
pub use error::{AgentError, AgentResult};
pub use fanout::FanOut;
pub use graph::build_turn_graph;
pub use llm::{LlmAdapter, LlmProvider};
pub use lookup::{LookupError, LookupService, SerperLookup};
pub use mock::{MockBackend, MockReply};
pub use router::{apply_route_policy, RouteTarget, Router, RoutingConfig};
pub use specialist::{SpecialistContext, SpecialistUnit};
pub use synthesizer::Synthesizer;
