//! Domain types for the Time-to-Action (TAT) engine
//!
//! Every lead, project and service request owns a [`Timeline`]: an ordered
//! list of dated [`Milestone`]s expanded from its family's [`StageCatalog`]
//! and [`TatTable`]. This crate holds the data model only; the temporal
//! logic lives in `tat-engine`.
//!
//! # Key Types
//!
//! - [`StageCatalog`] - ordered stages, optionally with sub-stage groups
//! - [`TatTable`] - per-milestone day offsets with a fallback default
//! - [`Milestone`] / [`Timeline`] - the persisted schedule
//! - [`Entity`] - the owner of a timeline and its progression state
//! - [`TatError`] - the error taxonomy shared by all engine operations

#![deny(unsafe_code)]

pub mod actor;
pub mod catalog;
pub mod delay;
pub mod entity;
pub mod error;
pub mod event;
pub mod ids;
pub mod milestone;
pub mod rules;
pub mod timeline;

pub use actor::{Actor, Role};
pub use catalog::{
    slugify, MilestoneTemplate, StageCatalog, StageEntry, SubstageDescriptor, SubstageKind,
    SubstageSlot, WorkflowFamily,
};
pub use delay::DelayReason;
pub use entity::{AuditEntry, Collaborator, Entity};
pub use error::{ErrorKind, TatError, TatResult};
pub use event::{TransitionCause, TransitionEvent};
pub use ids::{ActorId, EntityId, MilestoneId, SubstageId};
pub use milestone::{Milestone, MilestoneStatus};
pub use rules::{TatTable, DEFAULT_TAT_DAYS, MAX_TAT_DAYS, MAX_TIMELINE_DAYS};
pub use timeline::Timeline;
