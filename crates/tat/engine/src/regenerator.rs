//! Timeline Regenerator
//!
//! After an external delay, pushes the remaining schedule out from "now".
//! Selection is positional: every milestone at or after the first one
//! matching the start key (by stage reference or milestone id) that is not
//! completed. Completed milestones in that range are skipped, not
//! re-dated, and do not break the run.

use crate::status_deriver::derive_status;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tat_types::{DelayReason, MilestoneId, TatError, TatResult, TatTable, Timeline};

/// One re-dated milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegeneratedMilestone {
    pub id: MilestoneId,
    pub original_expected_date: DateTime<Utc>,
    pub expected_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationOutcome {
    pub reason: DelayReason,
    pub updated: Vec<RegeneratedMilestone>,
}

impl RegenerationOutcome {
    pub fn count(&self) -> usize {
        self.updated.len()
    }
}

pub struct TimelineRegenerator<'a> {
    tat: &'a TatTable,
}

impl<'a> TimelineRegenerator<'a> {
    pub fn new(tat: &'a TatTable) -> Self {
        Self { tat }
    }

    pub fn regenerate(
        &self,
        timeline: &mut Timeline,
        from: &str,
        reason: DelayReason,
        now: DateTime<Utc>,
    ) -> TatResult<RegenerationOutcome> {
        let start = timeline
            .position_of(from)
            .ok_or_else(|| TatError::NoMatchingStage(from.to_string()))?;

        // Dates are computed before anything is written so an overflow
        // leaves the timeline as it was.
        let mut running = now;
        let mut plan = Vec::new();
        for (index, milestone) in timeline.milestones().iter().enumerate().skip(start) {
            if milestone.is_completed() {
                continue;
            }
            running = self.tat.due_after(running, &milestone.id)?;
            plan.push((index, running));
        }

        let mut updated = Vec::with_capacity(plan.len());
        let milestones = timeline.milestones_mut();
        for (index, expected) in plan {
            let milestone = &mut milestones[index];
            let original = milestone.expected_date;

            milestone.original_expected_date = Some(original);
            milestone.expected_date = expected;
            milestone.regenerated = true;
            milestone.regenerated_reason = Some(reason);
            milestone.status = derive_status(expected, now);

            updated.push(RegeneratedMilestone {
                id: milestone.id.clone(),
                original_expected_date: original,
                expected_date: expected,
            });
        }

        if updated.is_empty() {
            return Err(TatError::NothingToRegenerate(from.to_string()));
        }

        Ok(RegenerationOutcome { reason, updated })
    }
}
