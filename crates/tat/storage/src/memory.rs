//! In-memory reference implementation of [`EntityStore`].
//!
//! Entities are held as serialized JSON documents so the stored shape is
//! exactly what a real document store would receive. Deterministic and
//! test-friendly; not durable.

use crate::traits::{EntityStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use tat_types::{Entity, EntityId, WorkflowFamily};

struct StoredDocument {
    version: u64,
    body: serde_json::Value,
}

impl StoredDocument {
    fn decode(&self) -> StorageResult<Entity> {
        let mut entity: Entity = serde_json::from_value(self.body.clone())?;
        entity.version = self.version;
        Ok(entity)
    }
}

/// In-memory entity store.
#[derive(Default)]
pub struct InMemoryEntityStore {
    documents: RwLock<HashMap<EntityId, StoredDocument>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.documents.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw stored document, for callers that need the persisted shape.
    pub fn raw_document(&self, id: &EntityId) -> StorageResult<Option<serde_json::Value>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        Ok(guard.get(id).map(|doc| doc.body.clone()))
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn insert_entity(&self, mut entity: Entity) -> StorageResult<Entity> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;

        if guard.contains_key(&entity.id) {
            return Err(StorageError::Conflict(format!(
                "entity {} already exists",
                entity.id
            )));
        }

        entity.version = 1;
        let body = serde_json::to_value(&entity)?;
        guard.insert(
            entity.id.clone(),
            StoredDocument {
                version: entity.version,
                body,
            },
        );
        tracing::debug!(entity_id = %entity.id, "Inserted entity document");
        Ok(entity)
    }

    async fn get_entity(&self, id: &EntityId) -> StorageResult<Option<Entity>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;
        guard.get(id).map(StoredDocument::decode).transpose()
    }

    async fn list_entities(
        &self,
        family: Option<WorkflowFamily>,
        window: QueryWindow,
    ) -> StorageResult<Vec<Entity>> {
        let guard = self
            .documents
            .read()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;

        let mut entities = guard
            .values()
            .map(StoredDocument::decode)
            .collect::<StorageResult<Vec<_>>>()?;
        drop(guard);

        if let Some(family) = family {
            entities.retain(|e| e.family == family);
        }
        entities.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let limit = if window.limit == 0 {
            usize::MAX
        } else {
            window.limit
        };
        Ok(entities
            .into_iter()
            .skip(window.offset)
            .take(limit)
            .collect())
    }

    async fn update_entity(
        &self,
        mut entity: Entity,
        expected_version: u64,
    ) -> StorageResult<Entity> {
        let mut guard = self
            .documents
            .write()
            .map_err(|_| StorageError::Backend("documents lock poisoned".to_string()))?;

        let current = guard
            .get(&entity.id)
            .ok_or_else(|| StorageError::NotFound(entity.id.clone()))?;

        if current.version != expected_version {
            tracing::warn!(
                entity_id = %entity.id,
                expected = expected_version,
                found = current.version,
                "Rejected stale entity write"
            );
            return Err(StorageError::VersionMismatch {
                id: entity.id.clone(),
                expected: expected_version,
                found: current.version,
            });
        }

        entity.version = expected_version + 1;
        let body = serde_json::to_value(&entity)?;
        guard.insert(
            entity.id.clone(),
            StoredDocument {
                version: entity.version,
                body,
            },
        );
        Ok(entity)
    }
}
