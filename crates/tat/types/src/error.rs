//! Error types for the TAT engine.
//!
//! Every failure is local to one mutation attempt: nothing here is fatal to
//! the process, and every error is safe to retry once the caller has
//! corrected its input. A stage change to the current stage is a success,
//! not an error, so it has no variant here.

use crate::{ActorId, EntityId, MilestoneId, SubstageId, WorkflowFamily};
use thiserror::Error;

/// Result type for TAT engine operations.
pub type TatResult<T> = Result<T, TatError>;

/// Errors raised by timeline and progression operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TatError {
    /// Stage name is not a member of the family's catalog.
    #[error("invalid stage '{stage}' for the {family} workflow")]
    InvalidStage {
        family: WorkflowFamily,
        stage: String,
    },

    /// Backward stage move attempted without privilege.
    #[error("invalid transition from '{from}' back to '{to}': only a privileged actor may roll back")]
    InvalidTransition { from: String, to: String },

    /// Sub-stage id is not in the catalog.
    #[error("unknown sub-stage: {0}")]
    UnknownSubstage(SubstageId),

    /// Sub-stage was already completed.
    #[error("sub-stage {0} is already complete")]
    AlreadyComplete(SubstageId),

    /// The immediately preceding sub-stage is not complete yet.
    #[error("sub-stage {substage} cannot be completed before {requires}")]
    OutOfOrder {
        substage: SubstageId,
        requires: SubstageId,
    },

    /// Percentage outside 0..=100.
    #[error("percentage {0} is out of range (expected 0-100)")]
    OutOfRange(i64),

    /// Percentage decreased without privilege.
    #[error("percentage for {substage} cannot decrease from {previous} to {requested}")]
    Regression {
        substage: SubstageId,
        previous: u8,
        requested: u8,
    },

    /// Percentage update on a boolean-typed sub-stage.
    #[error("sub-stage {0} is not percentage-typed")]
    NotPercentageTyped(SubstageId),

    /// Regeneration start point matched no milestone.
    #[error("no milestone matches '{0}'")]
    NoMatchingStage(String),

    /// Every milestone from the start point onward is completed.
    #[error("nothing to regenerate from '{0}': every remaining milestone is completed")]
    NothingToRegenerate(String),

    /// Delay reason tag outside the closed enumeration.
    #[error("invalid delay reason: {0}")]
    InvalidReason(String),

    /// Actor lacks update rights.
    #[error("actor {actor} is not allowed to {action}")]
    Forbidden { actor: ActorId, action: String },

    /// Stage catalog or rule table failed validation.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// A computed expected date falls outside the representable calendar.
    #[error("expected date for {0} is out of range")]
    DateOutOfRange(MilestoneId),

    /// Workflow family tag not recognised or not configured.
    #[error("unknown workflow family: {0}")]
    UnknownFamily(String),

    /// Entity does not exist.
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Another mutation was persisted between our read and write.
    #[error("entity {0} was modified concurrently; retry the operation")]
    ConcurrentModification(EntityId),

    /// Document store failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse classification used by outer surfaces to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected input (unknown names, out-of-range values)
    Validation,
    /// Rejected because of ordering (out-of-order, backward, regression)
    Ordering,
    /// Missing entity or regeneration start point
    NotFound,
    /// Actor lacks rights
    Forbidden,
    /// Lost a race with another mutation
    Conflict,
    /// Backend failure
    Internal,
}

impl TatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidStage { .. }
            | Self::UnknownSubstage(_)
            | Self::OutOfRange(_)
            | Self::NotPercentageTyped(_)
            | Self::InvalidReason(_)
            | Self::InvalidCatalog(_)
            | Self::DateOutOfRange(_)
            | Self::UnknownFamily(_) => ErrorKind::Validation,
            Self::InvalidTransition { .. }
            | Self::AlreadyComplete(_)
            | Self::OutOfOrder { .. }
            | Self::Regression { .. }
            | Self::NothingToRegenerate(_) => ErrorKind::Ordering,
            Self::NoMatchingStage(_) | Self::EntityNotFound(_) => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::ConcurrentModification(_) => ErrorKind::Conflict,
            Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Machine-readable code, stable across message wording changes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidStage { .. } => "INVALID_STAGE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::UnknownSubstage(_) => "UNKNOWN_SUBSTAGE",
            Self::AlreadyComplete(_) => "ALREADY_COMPLETE",
            Self::OutOfOrder { .. } => "OUT_OF_ORDER",
            Self::OutOfRange(_) => "OUT_OF_RANGE",
            Self::Regression { .. } => "REGRESSION",
            Self::NotPercentageTyped(_) => "NOT_PERCENTAGE_TYPED",
            Self::NoMatchingStage(_) => "NO_MATCHING_STAGE",
            Self::NothingToRegenerate(_) => "NOTHING_TO_REGENERATE",
            Self::InvalidReason(_) => "INVALID_REASON",
            Self::Forbidden { .. } => "FORBIDDEN",
            Self::InvalidCatalog(_) => "INVALID_CATALOG",
            Self::DateOutOfRange(_) => "DATE_OUT_OF_RANGE",
            Self::UnknownFamily(_) => "UNKNOWN_FAMILY",
            Self::EntityNotFound(_) => "NOT_FOUND",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}
