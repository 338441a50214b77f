//! Stage-entry side effects
//!
//! Listeners see every applied transition before the entity is persisted
//! and may return collaborators to attach. They must be pure with respect
//! to the entity; the service applies what they return under the same
//! lock as the transition itself.

use crate::config::CollaboratorRule;
use tat_types::{Collaborator, Entity, TransitionEvent};

pub trait TransitionListener: Send + Sync {
    fn name(&self) -> &str;

    /// Collaborators to add for this transition.
    fn on_transition(&self, event: &TransitionEvent, entity: &Entity) -> Vec<Collaborator>;
}

/// Attaches configured collaborators when an entity enters a stage.
#[derive(Debug, Clone, Default)]
pub struct AutoCollaboratorTrigger {
    rules: Vec<CollaboratorRule>,
}

impl AutoCollaboratorTrigger {
    pub fn new(rules: Vec<CollaboratorRule>) -> Self {
        Self { rules }
    }
}

impl TransitionListener for AutoCollaboratorTrigger {
    fn name(&self) -> &str {
        "auto-collaborator"
    }

    fn on_transition(&self, event: &TransitionEvent, entity: &Entity) -> Vec<Collaborator> {
        // Forward moves only.
        if event.rollback {
            return Vec::new();
        }
        self.rules
            .iter()
            .filter(|r| r.family == event.family && r.stage == event.to_stage)
            .filter(|r| !entity.has_collaborator(&r.user_id, &r.role))
            .map(|r| Collaborator {
                user_id: r.user_id.clone(),
                role: r.role.clone(),
                added_for_stage: r.stage.clone(),
            })
            .collect()
    }
}
