use crate::StorageResult;
use async_trait::async_trait;
use tat_types::{Entity, EntityId, WorkflowFamily};

/// Paged read window. A `limit` of zero means no limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryWindow {
    pub limit: usize,
    pub offset: usize,
}

impl QueryWindow {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }
}

/// Document store for entities and the timelines they own.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Insert a new entity at version 1 and return the stored document.
    async fn insert_entity(&self, entity: Entity) -> StorageResult<Entity>;

    /// Fetch an entity by id.
    async fn get_entity(&self, id: &EntityId) -> StorageResult<Option<Entity>>;

    /// List entities oldest-first, optionally restricted to one family.
    async fn list_entities(
        &self,
        family: Option<WorkflowFamily>,
        window: QueryWindow,
    ) -> StorageResult<Vec<Entity>>;

    /// Replace an entity if its stored version still equals
    /// `expected_version`. The stored copy gets `expected_version + 1`.
    async fn update_entity(&self, entity: Entity, expected_version: u64)
        -> StorageResult<Entity>;
}
