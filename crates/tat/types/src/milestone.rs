//! Milestones: dated checkpoints on a timeline
//!
//! The serialized form is the persisted document shape and must stay
//! stable: `{id, title, expectedDate, completedDate, status, stageRef,
//! regenerated?, originalExpectedDate?, regeneratedReason?}` with ISO-8601
//! timestamps and `completedDate: null` while open.

use crate::{DelayReason, MilestoneId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a milestone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    Completed,
    Delayed,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
        }
    }
}

impl std::fmt::Display for MilestoneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated checkpoint in an entity's timeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: MilestoneId,
    pub title: String,
    pub expected_date: DateTime<Utc>,
    pub completed_date: Option<DateTime<Utc>>,
    pub status: MilestoneStatus,
    pub stage_ref: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub regenerated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_expected_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regenerated_reason: Option<DelayReason>,
}

impl Milestone {
    pub fn new(
        id: MilestoneId,
        title: impl Into<String>,
        stage_ref: impl Into<String>,
        expected_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            expected_date,
            completed_date: None,
            status: MilestoneStatus::Pending,
            stage_ref: stage_ref.into(),
            regenerated: false,
            original_expected_date: None,
            regenerated_reason: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == MilestoneStatus::Completed
    }

    /// Mark completed, keeping an earlier completion time if one exists.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        if self.completed_date.is_none() {
            self.completed_date = Some(at);
        }
        self.status = MilestoneStatus::Completed;
    }

    /// Clear completion and fall back to a time-derived status.
    pub fn reopen(&mut self, status: MilestoneStatus) {
        debug_assert!(status != MilestoneStatus::Completed);
        self.completed_date = None;
        self.status = status;
    }

    /// Whether the stored fields agree with each other at `now`.
    pub fn is_consistent(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            MilestoneStatus::Completed => self.completed_date.is_some(),
            MilestoneStatus::Delayed => self.completed_date.is_none() && self.expected_date < now,
            MilestoneStatus::Pending => self.completed_date.is_none(),
        }
    }
}
