//! Per-entity mutation locks
//!
//! One async mutex per entity id serializes read → validate → recompute →
//! persist for that entity while leaving other entities unaffected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tat_types::EntityId;
use tokio::sync::OwnedMutexGuard;

/// Idle locks are pruned once the table grows past this size.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Debug, Default)]
pub struct EntityLocks {
    table: Mutex<HashMap<EntityId, Arc<tokio::sync::Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `id`. Released when the guard drops.
    pub async fn acquire(&self, id: &EntityId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut table = self.table.lock().unwrap_or_else(|e| e.into_inner());
            if table.len() > PRUNE_THRESHOLD {
                table.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            table
                .entry(id.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    pub fn tracked(&self) -> usize {
        self.table.lock().map(|t| t.len()).unwrap_or(0)
    }
}
