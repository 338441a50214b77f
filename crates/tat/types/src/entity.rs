//! Entities: leads, projects and service requests
//!
//! An entity exclusively owns its timeline and progression state. The
//! `stage` field moves only through stage transition validation or
//! sub-stage completion; the sub-stage fields move only through the
//! progression tracker.

use crate::{ActorId, EntityId, SubstageId, Timeline, WorkflowFamily};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Audit entry for an entity mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub sequence: u64,
    pub event_type: String,
    pub description: String,
    pub actor: Option<ActorId>,
    pub timestamp: DateTime<Utc>,
}

/// A user attached to an entity on stage entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collaborator {
    pub user_id: ActorId,
    pub role: String,
    pub added_for_stage: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: EntityId,
    pub family: WorkflowFamily,
    pub name: String,
    pub stage: String,
    pub timeline: Timeline,
    #[serde(default)]
    pub completed_substages: Vec<SubstageId>,
    #[serde(default)]
    pub percentage_substages: BTreeMap<SubstageId, u8>,
    #[serde(default)]
    pub collaborators: Vec<Collaborator>,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    pub fn new(
        id: EntityId,
        family: WorkflowFamily,
        name: impl Into<String>,
        stage: impl Into<String>,
        timeline: Timeline,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            family,
            name: name.into(),
            stage: stage.into(),
            timeline,
            completed_substages: Vec::new(),
            percentage_substages: BTreeMap::new(),
            collaborators: Vec::new(),
            audit: Vec::new(),
            version: 0,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn is_substage_complete(&self, id: &SubstageId) -> bool {
        self.completed_substages.contains(id)
    }

    pub fn percentage_of(&self, id: &SubstageId) -> u8 {
        self.percentage_substages.get(id).copied().unwrap_or(0)
    }

    pub fn has_collaborator(&self, user: &ActorId, role: &str) -> bool {
        self.collaborators
            .iter()
            .any(|c| &c.user_id == user && c.role == role)
    }

    /// Append an audit entry with the next sequence number.
    pub fn record_audit(
        &mut self,
        event_type: impl Into<String>,
        description: impl Into<String>,
        actor: Option<&ActorId>,
        at: DateTime<Utc>,
    ) {
        let sequence = self.audit.last().map(|e| e.sequence + 1).unwrap_or(0);
        self.audit.push(AuditEntry {
            sequence,
            event_type: event_type.into(),
            description: description.into(),
            actor: actor.cloned(),
            timestamp: at,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entity() -> Entity {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        Entity::new(
            EntityId::new("p-1"),
            WorkflowFamily::Project,
            "Villa 12",
            "Design",
            Timeline::default(),
            t0,
        )
    }

    #[test]
    fn test_audit_sequence_increments() {
        let mut e = entity();
        let at = e.created_at;
        e.record_audit("created", "Entity created", None, at);
        e.record_audit("stage_changed", "Stage changed from A to B", None, at);
        assert_eq!(e.audit[0].sequence, 0);
        assert_eq!(e.audit[1].sequence, 1);
    }

    #[test]
    fn test_document_uses_camel_case() {
        let json = serde_json::to_value(entity()).unwrap();
        assert!(json.get("completedSubstages").is_some());
        assert!(json.get("percentageSubstages").is_some());
        assert_eq!(json["family"], "project");
    }
}
