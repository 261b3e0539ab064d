//! Default turn graph wiring.

use std::sync::Arc;

use remiro_core::{StageRegistry, TurnGraph};

use crate::backend::GenerationBackend;
use crate::compactor::HistoryCompactor;
use crate::distiller::ProfileDistiller;
use crate::enrichment::EnrichmentUnit;
use crate::fanout::FanOut;
use crate::lookup::LookupService;
use crate::router::{Router, RoutingConfig};
use crate::synthesizer::Synthesizer;

/// Register every stage against one backend and build the graph.
pub fn build_turn_graph(
    backend: Arc<dyn GenerationBackend>,
    lookup: Option<Arc<dyn LookupService>>,
    routing: RoutingConfig,
) -> TurnGraph {
    let mut registry = StageRegistry::new();
    registry.register(Arc::new(Router::new(Arc::clone(&backend), routing)));
    registry.register(Arc::new(EnrichmentUnit::new(Arc::clone(&backend), lookup)));
    registry.register(Arc::new(FanOut::with_all(Arc::clone(&backend))));
    registry.register(Arc::new(Synthesizer::new(Arc::clone(&backend))));
    registry.register(Arc::new(ProfileDistiller::new(Arc::clone(&backend))));
    registry.register(Arc::new(HistoryCompactor::new(backend)));
    TurnGraph::new(Arc::new(registry))
}
