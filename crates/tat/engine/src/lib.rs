//! Time-to-Action (TAT) engine
//!
//! Expands stage catalogs into dated milestone timelines, derives milestone
//! status from the current stage and wall-clock time, and guards every
//! progression change.
//!
//! # Architecture
//!
//! The [`TimelineService`] frames each entity mutation as one
//! read → validate → recompute → persist unit under a per-entity lock, and
//! composes the pure components:
//!
//! - [`TimelineGenerator`] - expands catalog + TAT table + anchor into a timeline
//! - [`StatusDeriver`] - pending / completed / delayed from stage and time
//! - [`StageTransitionValidator`] - forward-only stage changes, privileged rollback
//! - [`SubstageTracker`] - strictly ordered sub-stage completion and percentages
//! - [`TimelineRegenerator`] - pushes remaining dates out after a delay
//! - [`AutoCollaboratorTrigger`] - assigns collaborators on stage entry
//!
//! The engine never reads ambient state: catalogs and rule tables arrive
//! through [`EngineConfig`], and "now" comes from an injected [`Clock`].
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use tat_engine::TimelineGenerator;
//! use tat_types::{StageCatalog, TatTable, WorkflowFamily, MilestoneStatus};
//!
//! let catalog = StageCatalog::flat(WorkflowFamily::Lead, ["A", "B", "C"]);
//! let tat = TatTable::new().with_rule("a", 0).with_rule("b", 1).with_rule("c", 3);
//! let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//!
//! let timeline = TimelineGenerator::new(&catalog, &tat)
//!     .generate(t0, 0, t0)
//!     .unwrap();
//! assert_eq!(timeline.milestones()[0].status, MilestoneStatus::Completed);
//! assert_eq!(timeline.milestones()[2].expected_date, t0 + chrono::Duration::days(4));
//! ```

#![deny(unsafe_code)]

pub mod clock;
pub mod config;
pub mod defaults;
pub mod generator;
pub mod locks;
pub mod regenerator;
pub mod service;
pub mod status_deriver;
pub mod substage_tracker;
pub mod transition_validator;
pub mod trigger;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{CollaboratorRule, EngineConfig, FamilyConfig};
pub use generator::TimelineGenerator;
pub use regenerator::{RegeneratedMilestone, RegenerationOutcome, TimelineRegenerator};
pub use service::{
    NewEntity, RegenerationResult, StageChangeOutcome, SubstageUpdateOutcome, SyncOutcome,
    TimelineService,
};
pub use status_deriver::{derive_status, Derivation, StatusDeriver};
pub use substage_tracker::{StageAdvance, SubstageOutcome, SubstageTracker};
pub use transition_validator::{StageTransitionValidator, TransitionDecision};
pub use trigger::{AutoCollaboratorTrigger, TransitionListener};
