//! Stage Transition Validator
//!
//! States are the catalog's stage names in canonical order. Moving forward
//! is open to anyone with update rights; moving backward is open only to
//! the privileged role and is annotated as a rollback. Re-entering the
//! current stage is a successful no-op so retries stay idempotent.

use tat_types::{Actor, StageCatalog, TatError, TatResult};

/// Outcome of validating a stage change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Target equals the current stage; nothing to persist
    Unchanged { message: String },
    Forward { from_index: usize, to_index: usize },
    /// Privileged backward move
    Rollback { from_index: usize, to_index: usize },
}

impl TransitionDecision {
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }

    pub fn is_rollback(&self) -> bool {
        matches!(self, Self::Rollback { .. })
    }
}

pub struct StageTransitionValidator<'a> {
    catalog: &'a StageCatalog,
}

impl<'a> StageTransitionValidator<'a> {
    pub fn new(catalog: &'a StageCatalog) -> Self {
        Self { catalog }
    }

    pub fn validate(&self, actor: &Actor, from: &str, to: &str) -> TatResult<TransitionDecision> {
        actor.require_update_rights("change stage")?;

        let to_index = self.catalog.require_index(to)?;
        let from_index = self.catalog.require_index(from)?;

        if to_index == from_index {
            tracing::debug!(stage = %to, "Stage unchanged");
            return Ok(TransitionDecision::Unchanged {
                message: format!("Entity is already in stage '{}'", to),
            });
        }

        if to_index > from_index {
            return Ok(TransitionDecision::Forward {
                from_index,
                to_index,
            });
        }

        if actor.is_privileged() {
            return Ok(TransitionDecision::Rollback {
                from_index,
                to_index,
            });
        }

        tracing::warn!(
            actor = %actor.id,
            from = %from,
            to = %to,
            "Backward transition rejected"
        );
        Err(TatError::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    /// Audit comment for an applied transition.
    pub fn audit_comment(from: &str, to: &str, decision: &TransitionDecision) -> String {
        match decision {
            TransitionDecision::Unchanged { message } => message.clone(),
            TransitionDecision::Forward { .. } => format!("Stage changed from {} to {}", from, to),
            TransitionDecision::Rollback { .. } => format!(
                "Stage changed from {} to {} (privileged rollback from {})",
                from, to, from
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tat_types::{Role, WorkflowFamily};

    fn catalog() -> StageCatalog {
        StageCatalog::flat(WorkflowFamily::Lead, ["New", "Contacted", "Converted"])
    }

    #[test]
    fn test_forward_allowed_for_staff() {
        let catalog = catalog();
        let decision = StageTransitionValidator::new(&catalog)
            .validate(&Actor::new("u1", Role::Staff), "New", "Converted")
            .unwrap();
        assert_eq!(
            decision,
            TransitionDecision::Forward {
                from_index: 0,
                to_index: 2
            }
        );
    }

    #[test]
    fn test_same_stage_is_noop_not_error() {
        let catalog = catalog();
        let decision = StageTransitionValidator::new(&catalog)
            .validate(&Actor::new("u1", Role::Staff), "Contacted", "Contacted")
            .unwrap();
        assert!(!decision.is_change());
    }

    #[test]
    fn test_backward_requires_privilege() {
        let catalog = catalog();
        let validator = StageTransitionValidator::new(&catalog);

        let err = validator
            .validate(&Actor::new("m1", Role::Manager), "Converted", "New")
            .unwrap_err();
        assert!(matches!(err, TatError::InvalidTransition { .. }));

        let decision = validator
            .validate(&Actor::new("root", Role::SuperAdmin), "Converted", "New")
            .unwrap();
        assert!(decision.is_rollback());
        let comment = StageTransitionValidator::audit_comment("Converted", "New", &decision);
        assert_eq!(
            comment,
            "Stage changed from Converted to New (privileged rollback from Converted)"
        );
    }

    #[test]
    fn test_unknown_target_is_invalid_stage() {
        let catalog = catalog();
        let err = StageTransitionValidator::new(&catalog)
            .validate(&Actor::new("root", Role::SuperAdmin), "New", "Lost")
            .unwrap_err();
        assert!(matches!(err, TatError::InvalidStage { .. }));
    }

    #[test]
    fn test_viewer_cannot_change_stage() {
        let catalog = catalog();
        let err = StageTransitionValidator::new(&catalog)
            .validate(&Actor::new("v", Role::Viewer), "New", "Contacted")
            .unwrap_err();
        assert!(matches!(err, TatError::Forbidden { .. }));
    }
}
