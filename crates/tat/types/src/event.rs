//! Stage transition events
//!
//! Emitted after a stage change has been persisted. Consumers (collaborator
//! assignment, notification dispatch) never see a transition that was
//! rolled back by a failed write.

use crate::{ActorId, EntityId, WorkflowFamily};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What caused the stage to move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// Explicit stage change request
    StageChange,
    /// A sub-stage group finished and advanced the stage
    SubstageCompletion,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub entity_id: EntityId,
    pub family: WorkflowFamily,
    pub from_stage: String,
    pub to_stage: String,
    pub rollback: bool,
    pub cause: TransitionCause,
    pub actor: ActorId,
    pub at: DateTime<Utc>,
}

impl TransitionEvent {
    pub fn event_type(&self) -> &'static str {
        if self.rollback {
            "stage_rollback"
        } else {
            "stage_entered"
        }
    }
}
