//! Timeline Generator
//!
//! Expands a stage catalog into dated milestones. Offsets accumulate: each
//! milestone is due its TAT-table offset after the previous one, so the
//! expected date is the anchor plus the running sum of offsets.

use crate::status_deriver::{Derivation, StatusDeriver};
use chrono::{DateTime, Utc};
use tat_types::{Milestone, StageCatalog, TatResult, TatTable, Timeline};

pub struct TimelineGenerator<'a> {
    catalog: &'a StageCatalog,
    tat: &'a TatTable,
}

impl<'a> TimelineGenerator<'a> {
    pub fn new(catalog: &'a StageCatalog, tat: &'a TatTable) -> Self {
        Self { catalog, tat }
    }

    /// Build the full timeline for an entity at `current_index`.
    ///
    /// Pure: the same inputs always give the same timeline. Fails with
    /// `DateOutOfRange` if an expected date leaves the calendar.
    pub fn generate(
        &self,
        anchor: DateTime<Utc>,
        current_index: usize,
        now: DateTime<Utc>,
    ) -> TatResult<Timeline> {
        let mut due = anchor;
        let mut milestones = Vec::new();
        for template in self.catalog.milestones() {
            due = self.tat.due_after(due, &template.id)?;
            milestones.push(Milestone::new(
                template.id,
                template.title,
                template.stage_ref,
                due,
            ));
        }

        let mut timeline = Timeline::new(milestones);
        StatusDeriver::new(self.catalog).apply(
            &mut timeline,
            &Derivation {
                current_index,
                entered_at: anchor,
                now,
                completed_substages: &[],
            },
        );
        Ok(timeline)
    }

    /// Like [`generate`](Self::generate), resolving the stage by name.
    pub fn generate_for_stage(
        &self,
        anchor: DateTime<Utc>,
        current_stage: &str,
        now: DateTime<Utc>,
    ) -> TatResult<Timeline> {
        let index = self.catalog.require_index(current_stage)?;
        self.generate(anchor, index, now)
    }

    /// Append milestones the catalog gained since `timeline` was generated.
    ///
    /// New items are chained from the last existing expected date. Existing
    /// items are never touched, and nothing is appended if any new date is
    /// out of range. Returns how many were appended.
    pub fn append_missing(
        &self,
        timeline: &mut Timeline,
        now: DateTime<Utc>,
    ) -> TatResult<usize> {
        let mut running = timeline.last().map(|m| m.expected_date).unwrap_or(now);
        let mut missing = Vec::new();

        for template in self.catalog.milestones() {
            if timeline.contains(&template.id) {
                continue;
            }
            running = self.tat.due_after(running, &template.id)?;
            missing.push(Milestone::new(
                template.id,
                template.title,
                template.stage_ref,
                running,
            ));
        }

        let appended = missing.len();
        for milestone in missing {
            timeline.append(milestone);
        }
        Ok(appended)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tat_types::{MilestoneId, MilestoneStatus, TatError, StageEntry, SubstageDescriptor, WorkflowFamily};

    fn day0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
    }

    fn abc() -> (StageCatalog, TatTable) {
        (
            StageCatalog::flat(WorkflowFamily::Lead, ["A", "B", "C"]),
            TatTable::new()
                .with_rule("a", 0)
                .with_rule("b", 1)
                .with_rule("c", 3),
        )
    }

    #[test]
    fn test_cumulative_offsets_scenario() {
        let (catalog, tat) = abc();
        let timeline = TimelineGenerator::new(&catalog, &tat)
            .generate(day0(), 0, day0())
            .unwrap();
        let ms = timeline.milestones();

        assert_eq!(ms[0].expected_date, day0());
        assert_eq!(ms[0].status, MilestoneStatus::Completed);
        assert_eq!(ms[0].completed_date, Some(day0()));
        assert_eq!(ms[1].expected_date, day0() + Duration::days(1));
        assert_eq!(ms[1].status, MilestoneStatus::Pending);
        assert_eq!(ms[2].expected_date, day0() + Duration::days(4));
        assert_eq!(ms[2].status, MilestoneStatus::Pending);
    }

    #[test]
    fn test_late_generation_marks_delayed() {
        let (catalog, tat) = abc();
        let now = day0() + Duration::days(2);
        let timeline = TimelineGenerator::new(&catalog, &tat)
            .generate(day0(), 0, now)
            .unwrap();
        let ms = timeline.milestones();
        assert_eq!(ms[1].status, MilestoneStatus::Delayed);
        assert_eq!(ms[2].status, MilestoneStatus::Pending);
    }

    #[test]
    fn test_missing_rule_uses_default() {
        let catalog = StageCatalog::flat(WorkflowFamily::Service, ["X", "Y"]);
        let tat = TatTable::new();
        let timeline = TimelineGenerator::new(&catalog, &tat)
            .generate(day0(), 0, day0())
            .unwrap();
        assert_eq!(
            timeline.milestones()[1].expected_date,
            day0() + Duration::days(6)
        );
    }

    #[test]
    fn test_back_filled_stages() {
        let (catalog, tat) = abc();
        let timeline = TimelineGenerator::new(&catalog, &tat)
            .generate_for_stage(day0(), "C", day0())
            .unwrap();
        let ms = timeline.milestones();
        assert_eq!(ms[1].status, MilestoneStatus::Completed);
        assert_eq!(ms[1].completed_date, Some(ms[1].expected_date));
        assert_eq!(ms[2].completed_date, Some(day0()));
    }

    #[test]
    fn test_unknown_initial_stage() {
        let (catalog, tat) = abc();
        assert!(TimelineGenerator::new(&catalog, &tat)
            .generate_for_stage(day0(), "Z", day0())
            .is_err());
    }

    #[test]
    fn test_hierarchical_expansion() {
        let catalog = StageCatalog::new(
            WorkflowFamily::Project,
            vec![
                StageEntry::new("Design", 1)
                    .with_substage(SubstageDescriptor::boolean("brief", "Brief", 1))
                    .with_substage(SubstageDescriptor::boolean("layout", "Layout", 2)),
                StageEntry::new("Handover", 2),
            ],
        );
        let tat = TatTable::new().with_rule("layout", 5).with_rule("handover", 2);
        let timeline = TimelineGenerator::new(&catalog, &tat)
            .generate(day0(), 0, day0())
            .unwrap();

        let ids: Vec<_> = timeline.ids().map(|id| id.as_str().to_string()).collect();
        assert_eq!(ids, vec!["brief", "layout", "handover"]);
        assert_eq!(
            timeline.milestones()[2].expected_date,
            day0() + Duration::days(3 + 5 + 2)
        );
    }

    #[test]
    fn test_append_missing_never_shrinks() {
        let (catalog, tat) = abc();
        let mut timeline = TimelineGenerator::new(&catalog, &tat)
            .generate(day0(), 0, day0())
            .unwrap();

        let grown = StageCatalog::flat(WorkflowFamily::Lead, ["A", "B", "C", "D"]);
        let added = TimelineGenerator::new(&grown, &tat)
            .append_missing(&mut timeline, day0())
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(timeline.len(), 4);
        assert_eq!(
            timeline.milestones()[3].expected_date,
            day0() + Duration::days(4 + 3)
        );

        let again = TimelineGenerator::new(&grown, &tat)
            .append_missing(&mut timeline, day0())
            .unwrap();
        assert_eq!(again, 0);
    }

    #[test]
    fn test_oversized_offset_is_an_error() {
        let catalog = StageCatalog::flat(WorkflowFamily::Lead, ["A", "B", "C"]);
        let tat = TatTable::new().with_rule("b", 100_000_000);
        let generator = TimelineGenerator::new(&catalog, &tat);

        assert_eq!(
            generator.generate(day0(), 0, day0()),
            Err(TatError::DateOutOfRange(MilestoneId::new("b")))
        );
        assert!(generator.generate_for_stage(day0(), "B", day0()).is_err());
    }

    #[test]
    fn test_append_missing_out_of_range_leaves_timeline() {
        let (catalog, tat) = abc();
        let mut timeline = TimelineGenerator::new(&catalog, &tat)
            .generate(day0(), 0, day0())
            .unwrap();

        let grown = StageCatalog::flat(WorkflowFamily::Lead, ["A", "B", "C", "D", "E"]);
        let huge = tat.clone().with_rule("e", 100_000_000);
        let result = TimelineGenerator::new(&grown, &huge).append_missing(&mut timeline, day0());
        assert!(matches!(result, Err(TatError::DateOutOfRange(_))));
        assert_eq!(timeline.len(), 3);
    }
}
