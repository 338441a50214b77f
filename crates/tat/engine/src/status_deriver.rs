//! Status Deriver
//!
//! Computes each milestone's lifecycle status from its position relative
//! to the entity's current stage and from "now":
//!
//! | milestone stage            | status                                   |
//! |----------------------------|------------------------------------------|
//! | before the current stage   | completed (back-filled at expected date) |
//! | current stage, first item  | completed (at stage entry)               |
//! | completed sub-stage        | completed                                |
//! | anything else              | delayed if expected < now, else pending  |
//!
//! Completion dates already present are kept, so re-running with the same
//! stage and `now` yields the same timeline.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tat_types::{MilestoneId, MilestoneStatus, StageCatalog, SubstageId, Timeline};

/// Status of a milestone not forced to `completed`.
pub fn derive_status(expected: DateTime<Utc>, now: DateTime<Utc>) -> MilestoneStatus {
    if expected < now {
        MilestoneStatus::Delayed
    } else {
        MilestoneStatus::Pending
    }
}

/// Inputs of one derivation pass.
#[derive(Debug, Clone, Copy)]
pub struct Derivation<'a> {
    /// Index of the entity's current stage in catalog order
    pub current_index: usize,
    /// Completion time for the first milestone of the current stage
    pub entered_at: DateTime<Utc>,
    pub now: DateTime<Utc>,
    pub completed_substages: &'a [SubstageId],
}

pub struct StatusDeriver<'a> {
    catalog: &'a StageCatalog,
}

impl<'a> StatusDeriver<'a> {
    pub fn new(catalog: &'a StageCatalog) -> Self {
        Self { catalog }
    }

    /// Recompute every milestone's status in place.
    pub fn apply(&self, timeline: &mut Timeline, derivation: &Derivation<'_>) {
        let forced: HashSet<MilestoneId> = derivation
            .completed_substages
            .iter()
            .map(SubstageId::as_milestone)
            .collect();
        let current_name = self
            .catalog
            .stage(derivation.current_index)
            .map(|s| s.name.as_str());
        let mut lead_seen = false;

        for milestone in timeline.milestones_mut() {
            let stage_index = self.catalog.index_of(&milestone.stage_ref);
            let is_current = current_name == Some(milestone.stage_ref.as_str());

            match stage_index {
                Some(index) if index < derivation.current_index => {
                    let backfill = milestone.expected_date;
                    milestone.complete(backfill);
                }
                Some(_) if is_current && !lead_seen => {
                    lead_seen = true;
                    milestone.complete(derivation.entered_at);
                }
                _ if forced.contains(&milestone.id) => {
                    milestone.complete(derivation.now);
                }
                // Stage dropped from the catalog: completion is history.
                None if milestone.is_completed() => {}
                _ => {
                    milestone.reopen(derive_status(milestone.expected_date, derivation.now));
                }
            }
        }
    }

    /// Read-time refresh: flip open milestones between pending and delayed
    /// without touching completion state.
    pub fn refresh_delays(timeline: &mut Timeline, now: DateTime<Utc>) -> usize {
        let mut flipped = 0;
        for milestone in timeline.milestones_mut() {
            if milestone.is_completed() {
                continue;
            }
            let status = derive_status(milestone.expected_date, now);
            if milestone.status != status {
                milestone.status = status;
                flipped += 1;
            }
        }
        flipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tat_types::{Milestone, StageEntry, SubstageDescriptor, WorkflowFamily};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn flat() -> (StageCatalog, Timeline) {
        let catalog = StageCatalog::flat(WorkflowFamily::Lead, ["A", "B", "C"]);
        let timeline = Timeline::new(
            catalog
                .milestones()
                .into_iter()
                .enumerate()
                .map(|(i, m)| {
                    Milestone::new(m.id, m.title, m.stage_ref, t0() + Duration::days(i as i64))
                })
                .collect(),
        );
        (catalog, timeline)
    }

    #[test]
    fn test_derive_status_boundary() {
        assert_eq!(derive_status(t0(), t0()), MilestoneStatus::Pending);
        assert_eq!(
            derive_status(t0(), t0() + Duration::seconds(1)),
            MilestoneStatus::Delayed
        );
    }

    #[test]
    fn test_past_current_future() {
        let (catalog, mut timeline) = flat();
        let now = t0() + Duration::hours(36);
        StatusDeriver::new(&catalog).apply(
            &mut timeline,
            &Derivation {
                current_index: 1,
                entered_at: now,
                now,
                completed_substages: &[],
            },
        );

        let ms = timeline.milestones();
        assert_eq!(ms[0].status, MilestoneStatus::Completed);
        assert_eq!(ms[0].completed_date, Some(ms[0].expected_date));
        assert_eq!(ms[1].status, MilestoneStatus::Completed);
        assert_eq!(ms[1].completed_date, Some(now));
        assert_eq!(ms[2].status, MilestoneStatus::Pending);
    }

    #[test]
    fn test_rollback_reopens_later_stages() {
        let (catalog, mut timeline) = flat();
        let deriver = StatusDeriver::new(&catalog);
        let now = t0() + Duration::days(5);

        deriver.apply(
            &mut timeline,
            &Derivation {
                current_index: 2,
                entered_at: now,
                now,
                completed_substages: &[],
            },
        );
        assert!(timeline.milestones().iter().all(|m| m.is_completed()));

        deriver.apply(
            &mut timeline,
            &Derivation {
                current_index: 0,
                entered_at: now,
                now,
                completed_substages: &[],
            },
        );
        let ms = timeline.milestones();
        assert!(ms[0].is_completed());
        assert_eq!(ms[1].status, MilestoneStatus::Delayed);
        assert!(ms[1].completed_date.is_none());
        assert_eq!(ms[2].status, MilestoneStatus::Delayed);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let (catalog, mut timeline) = flat();
        let deriver = StatusDeriver::new(&catalog);
        let now = t0() + Duration::days(1);
        let derivation = Derivation {
            current_index: 1,
            entered_at: now,
            now,
            completed_substages: &[],
        };

        deriver.apply(&mut timeline, &derivation);
        let once = timeline.clone();
        deriver.apply(&mut timeline, &derivation);
        assert_eq!(once, timeline);
    }

    #[test]
    fn test_completed_substages_are_forced() {
        let catalog = StageCatalog::new(
            WorkflowFamily::Project,
            vec![StageEntry::new("Production", 1)
                .with_substage(SubstageDescriptor::boolean("s1", "One", 1))
                .with_substage(SubstageDescriptor::boolean("s2", "Two", 2))
                .with_substage(SubstageDescriptor::boolean("s3", "Three", 3))],
        );
        let mut timeline = Timeline::new(
            catalog
                .milestones()
                .into_iter()
                .map(|m| Milestone::new(m.id, m.title, m.stage_ref, t0() + Duration::days(10)))
                .collect(),
        );
        let completed = vec![SubstageId::new("s2")];
        StatusDeriver::new(&catalog).apply(
            &mut timeline,
            &Derivation {
                current_index: 0,
                entered_at: t0(),
                now: t0(),
                completed_substages: &completed,
            },
        );

        let ms = timeline.milestones();
        assert!(ms[0].is_completed());
        assert!(ms[1].is_completed());
        assert_eq!(ms[2].status, MilestoneStatus::Pending);
    }

    #[test]
    fn test_refresh_only_touches_open_milestones() {
        let (_, mut timeline) = flat();
        timeline.milestones_mut()[0].complete(t0());
        let flipped = StatusDeriver::refresh_delays(&mut timeline, t0() + Duration::days(3));
        assert_eq!(flipped, 2);
        assert!(timeline.milestones()[0].is_completed());
        assert_eq!(timeline.milestones()[2].status, MilestoneStatus::Delayed);
    }
}
