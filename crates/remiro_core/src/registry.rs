//! Stage registry.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{CoreError, CoreResult};
use crate::stage::{Stage, StageId};

/// Maps graph nodes to their implementations.
#[derive(Default)]
pub struct StageRegistry {
    stages: HashMap<StageId, Arc<dyn Stage>>,
}

impl StageRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            stages: HashMap::new(),
        }
    }

    /// Register a stage under its `id()`, replacing any previous one.
    pub fn register(&mut self, stage: Arc<dyn Stage>) {
        let id = stage.id();
        debug!("Registering stage: {}", id);
        self.stages.insert(id, stage);
    }

    /// Get a stage by id.
    pub fn get(&self, id: StageId) -> Option<Arc<dyn Stage>> {
        self.stages.get(&id).cloned()
    }

    /// Get a stage by id, returning an error if not found.
    pub fn get_required(&self, id: StageId) -> CoreResult<Arc<dyn Stage>> {
        self.get(id).ok_or(CoreError::StageNotFound(id))
    }

    /// Check if a stage is registered.
    pub fn contains(&self, id: StageId) -> bool {
        self.stages.contains_key(&id)
    }

    /// Graph nodes that have no implementation yet.
    pub fn missing(&self) -> Vec<StageId> {
        StageId::all()
            .into_iter()
            .filter(|id| !self.contains(*id))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl std::fmt::Debug for StageRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageRegistry")
            .field("stages", &self.stages.keys().collect::<Vec<_>>())
            .finish()
    }
}
