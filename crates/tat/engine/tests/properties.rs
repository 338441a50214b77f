//! Property tests for timeline generation and progression rules.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tat_engine::*;
use tat_types::*;

// ---------------------------------------------------------------------------
// Helpers / Strategies
// ---------------------------------------------------------------------------

fn anchor() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

fn stage_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Stage {}", i)).collect()
}

/// A flat catalog with a rule for every stage, some rules left out.
fn arb_flat_setup() -> impl Strategy<Value = (StageCatalog, TatTable, Vec<i64>)> {
    prop::collection::vec(prop::option::of(0i64..15), 1..10).prop_map(|rules| {
        let names = stage_names(rules.len());
        let catalog = StageCatalog::flat(WorkflowFamily::Lead, names.iter().cloned());
        let mut tat = TatTable::new();
        let mut effective = Vec::new();
        for (name, rule) in names.iter().zip(rules) {
            if let Some(days) = rule {
                tat = tat.with_rule(slugify(name), days);
            }
            effective.push(rule.unwrap_or(DEFAULT_TAT_DAYS));
        }
        (catalog, tat, effective)
    })
}

/// A project catalog of `groups` stages with `per_group` boolean sub-stages.
fn grouped_catalog(groups: usize, per_group: usize) -> StageCatalog {
    let stages = (0..groups)
        .map(|g| {
            (0..per_group).fold(StageEntry::new(format!("Group {}", g), g as u32 + 1), |s, i| {
                s.with_substage(SubstageDescriptor::boolean(
                    format!("g{}_s{}", g, i),
                    format!("Step {}.{}", g, i),
                    i as u32 + 1,
                ))
            })
        })
        .collect();
    StageCatalog::new(WorkflowFamily::Project, stages)
}

fn project_entity(stage: &str) -> Entity {
    Entity::new(
        EntityId::new("p-prop"),
        WorkflowFamily::Project,
        "Property project",
        stage,
        Timeline::default(),
        anchor(),
    )
}

fn arb_non_privileged() -> impl Strategy<Value = Actor> {
    prop_oneof![Just(Role::Manager), Just(Role::Staff)].prop_map(|role| Actor::new("u", role))
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Same inputs, same timeline, byte for byte.
    #[test]
    fn generation_is_deterministic(
        (catalog, tat, _) in arb_flat_setup(),
        stage_seed in any::<usize>(),
        now_offset_hours in 0i64..2000,
    ) {
        let current = stage_seed % catalog.len();
        let now = anchor() + Duration::hours(now_offset_hours);
        let generator = TimelineGenerator::new(&catalog, &tat);

        let first = generator.generate(anchor(), current, now).unwrap();
        let second = generator.generate(anchor(), current, now).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    /// Expected dates are the anchor plus the running sum of offsets.
    #[test]
    fn expected_dates_accumulate((catalog, tat, effective) in arb_flat_setup()) {
        let timeline = TimelineGenerator::new(&catalog, &tat).generate(anchor(), 0, anchor()).unwrap();
        let mut cumulative = 0;
        for (milestone, days) in timeline.milestones().iter().zip(&effective) {
            cumulative += days;
            prop_assert_eq!(milestone.expected_date, anchor() + Duration::days(cumulative));
        }
    }

    /// Tables that pass validation always produce representable dates.
    #[test]
    fn validated_tables_never_overflow(
        offsets in prop::collection::vec(0i64..=MAX_TAT_DAYS, 1..12),
    ) {
        let names = stage_names(offsets.len());
        let catalog = StageCatalog::flat(WorkflowFamily::Lead, names.iter().cloned());
        let tat = names
            .iter()
            .zip(&offsets)
            .fold(TatTable::new(), |t, (name, days)| t.with_rule(slugify(name), *days));

        prop_assert!(tat.validate().is_ok());
        let within_span = offsets.iter().sum::<i64>() <= MAX_TIMELINE_DAYS;
        prop_assert_eq!(tat.validate_span(&catalog).is_ok(), within_span);
        if within_span {
            let generated = TimelineGenerator::new(&catalog, &tat).generate(anchor(), 0, anchor());
            prop_assert!(generated.is_ok());
        }
    }

    /// Every generated milestone satisfies the status/date invariants.
    #[test]
    fn generated_statuses_are_consistent(
        (catalog, tat, _) in arb_flat_setup(),
        stage_seed in any::<usize>(),
        now_offset_hours in 0i64..2000,
    ) {
        let current = stage_seed % catalog.len();
        let now = anchor() + Duration::hours(now_offset_hours);
        let timeline = TimelineGenerator::new(&catalog, &tat).generate(anchor(), current, now).unwrap();

        for (i, milestone) in timeline.milestones().iter().enumerate() {
            prop_assert!(milestone.is_consistent(now));
            prop_assert_eq!(milestone.is_completed(), i <= current);
        }
    }

    /// Re-deriving with the same stage and time changes nothing.
    #[test]
    fn derivation_is_idempotent(
        (catalog, tat, _) in arb_flat_setup(),
        stage_seed in any::<usize>(),
        now_offset_hours in 0i64..2000,
    ) {
        let current = stage_seed % catalog.len();
        let now = anchor() + Duration::hours(now_offset_hours);
        let mut timeline = TimelineGenerator::new(&catalog, &tat).generate(anchor(), current, now).unwrap();
        let before = timeline.clone();

        StatusDeriver::new(&catalog).apply(&mut timeline, &Derivation {
            current_index: current,
            entered_at: now,
            now,
            completed_substages: &[],
        });
        prop_assert_eq!(before, timeline);
    }

    /// Non-privileged backward moves always fail.
    #[test]
    fn backward_moves_need_privilege(
        stages in 2usize..10,
        a in any::<usize>(),
        b in any::<usize>(),
        actor in arb_non_privileged(),
    ) {
        let names = stage_names(stages);
        let catalog = StageCatalog::flat(WorkflowFamily::Service, names.iter().cloned());
        let (from, to) = (a % stages, b % stages);
        let result = StageTransitionValidator::new(&catalog).validate(&actor, &names[from], &names[to]);

        if to < from {
            let is_invalid_transition = matches!(result, Err(TatError::InvalidTransition { .. }));
            prop_assert!(is_invalid_transition);
        } else {
            prop_assert!(result.is_ok());
        }
    }

    /// The privileged role may move backward and the move is annotated.
    #[test]
    fn privileged_rollback_is_annotated(stages in 2usize..10, a in any::<usize>(), b in any::<usize>()) {
        let names = stage_names(stages);
        let catalog = StageCatalog::flat(WorkflowFamily::Lead, names.iter().cloned());
        let from = 1 + a % (stages - 1);
        let to = b % from;

        let decision = StageTransitionValidator::new(&catalog)
            .validate(&Actor::new("root", Role::SuperAdmin), &names[from], &names[to])
            .unwrap();
        prop_assert!(decision.is_rollback());
        let comment = StageTransitionValidator::audit_comment(&names[from], &names[to], &decision);
        let annotation = format!("(privileged rollback from {})", names[from]);
        prop_assert!(comment.contains(&annotation));
    }

    /// With the first `done` sub-stages complete, only the next one may be completed.
    #[test]
    fn substages_complete_strictly_in_order(
        groups in 1usize..4,
        per_group in 1usize..4,
        done_seed in any::<usize>(),
        target_seed in any::<usize>(),
    ) {
        let catalog = grouped_catalog(groups, per_group);
        let all: Vec<SubstageId> = catalog.substages().iter().map(|s| s.descriptor.id.clone()).collect();
        let done = done_seed % (all.len() + 1);
        let target = target_seed % all.len();
        let completed = &all[..done];

        let result = SubstageTracker::new(&catalog).can_complete(&all[target], completed);
        if target < done {
            let is_already_complete = matches!(result, Err(TatError::AlreadyComplete(_)));
            prop_assert!(is_already_complete);
        } else if target == done {
            prop_assert!(result.is_ok());
        } else {
            match result {
                Err(TatError::OutOfOrder { requires, .. }) => prop_assert_eq!(&requires, &all[target - 1]),
                other => prop_assert!(false, "expected OutOfOrder, got {:?}", other),
            }
        }
    }

    /// A non-privileged actor can never lower a percentage.
    #[test]
    fn percentage_is_monotonic_for_staff(v1 in 0i64..100, v2 in 0i64..100) {
        let catalog = StageCatalog::new(
            WorkflowFamily::Project,
            vec![StageEntry::new("Production", 1)
                .with_substage(SubstageDescriptor::percentage("p", "Paint", 1))],
        );
        let tracker = SubstageTracker::new(&catalog);
        let staff = Actor::new("s", Role::Staff);
        let id = SubstageId::new("p");
        let mut entity = project_entity("Production");

        tracker.update_percentage(&mut entity, &staff, &id, v1).unwrap();
        let result = tracker.update_percentage(&mut entity, &staff, &id, v2);
        if v2 < v1 {
            let is_regression = matches!(result, Err(TatError::Regression { .. }));
            prop_assert!(is_regression);
            prop_assert_eq!(entity.percentage_of(&id), v1 as u8);
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(entity.percentage_of(&id), v2 as u8);
        }
    }

    /// Out-of-range percentages are rejected before anything else.
    #[test]
    fn out_of_range_percentages_rejected(value in prop_oneof![-500i64..0, 101i64..500]) {
        let catalog = grouped_catalog(1, 1);
        let mut entity = project_entity("Group 0");
        let result = SubstageTracker::new(&catalog).update_percentage(
            &mut entity,
            &Actor::new("s", Role::Staff),
            &SubstageId::new("g0_s0"),
            value,
        );
        prop_assert_eq!(result.unwrap_err(), TatError::OutOfRange(value));
    }

    /// Reaching 100 completes the sub-stage; finishing a group ahead of
    /// the current stage moves the entity into it.
    #[test]
    fn percentage_100_autocompletes(groups in 2usize..5) {
        let stages = (0..groups)
            .map(|g| {
                StageEntry::new(format!("Group {}", g), g as u32 + 1)
                    .with_substage(SubstageDescriptor::percentage(format!("pct_{}", g), "Work", 1))
            })
            .collect();
        let catalog = StageCatalog::new(WorkflowFamily::Project, stages);
        let tracker = SubstageTracker::new(&catalog);
        let staff = Actor::new("s", Role::Staff);
        let mut entity = project_entity("Group 0");

        for g in 0..groups {
            let id = SubstageId::new(format!("pct_{}", g));
            let outcome = tracker.update_percentage(&mut entity, &staff, &id, 100).unwrap();
            prop_assert!(outcome.completed);
            prop_assert!(entity.is_substage_complete(&id));
            prop_assert_eq!(&entity.stage, &format!("Group {}", g));
        }
    }

    /// Regeneration keeps the pre-regeneration dates and the reason.
    #[test]
    fn regeneration_preserves_audit(
        (catalog, tat, _) in arb_flat_setup(),
        start_seed in any::<usize>(),
        reason_index in 0usize..7,
        delay_days in 0i64..90,
    ) {
        let mut timeline = TimelineGenerator::new(&catalog, &tat).generate(anchor(), 0, anchor()).unwrap();
        let before = timeline.clone();
        let start = start_seed % timeline.len();
        let key = timeline.milestones()[start].stage_ref.clone();
        let reason = DelayReason::ALL[reason_index];
        let now = anchor() + Duration::days(delay_days);

        match TimelineRegenerator::new(&tat).regenerate(&mut timeline, &key, reason, now) {
            Ok(outcome) => {
                for touched in &outcome.updated {
                    let prior = before.find(&touched.id).unwrap();
                    let after = timeline.find(&touched.id).unwrap();
                    prop_assert_eq!(after.original_expected_date, Some(prior.expected_date));
                    prop_assert_eq!(after.regenerated_reason, Some(reason));
                    prop_assert!(after.regenerated);
                    prop_assert!(after.expected_date >= now);
                }
                prop_assert_eq!(timeline.len(), before.len());
            }
            Err(err) => {
                prop_assert_eq!(err, TatError::NothingToRegenerate(key));
                prop_assert_eq!(&timeline, &before);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_abc_offsets() {
    let catalog = StageCatalog::flat(WorkflowFamily::Lead, ["A", "B", "C"]);
    let tat = TatTable::new()
        .with_rule("a", 0)
        .with_rule("b", 1)
        .with_rule("c", 3);

    let early = TimelineGenerator::new(&catalog, &tat).generate(anchor(), 0, anchor()).unwrap();
    let ms = early.milestones();
    assert_eq!(ms[0].expected_date, anchor());
    assert_eq!(ms[0].status, MilestoneStatus::Completed);
    assert_eq!(ms[1].expected_date, anchor() + Duration::days(1));
    assert_eq!(ms[2].expected_date, anchor() + Duration::days(4));
    assert_eq!(ms[1].status, MilestoneStatus::Pending);
    assert_eq!(ms[2].status, MilestoneStatus::Pending);

    let late = TimelineGenerator::new(&catalog, &tat).generate(
        anchor(),
        0,
        anchor() + Duration::days(5),
    )
    .unwrap();
    assert_eq!(late.milestones()[1].status, MilestoneStatus::Delayed);
    assert_eq!(late.milestones()[2].status, MilestoneStatus::Delayed);
}

#[test]
fn scenario_s1_s2_s3() {
    let catalog = StageCatalog::new(
        WorkflowFamily::Project,
        vec![StageEntry::new("Design", 1)
            .with_substage(SubstageDescriptor::boolean("s1", "One", 1))
            .with_substage(SubstageDescriptor::boolean("s2", "Two", 2))
            .with_substage(SubstageDescriptor::boolean("s3", "Three", 3))],
    );
    let tracker = SubstageTracker::new(&catalog);
    let staff = Actor::new("s", Role::Staff);

    let mut entity = project_entity("Design");
    entity.completed_substages.push(SubstageId::new("s1"));
    let mut racing = entity.clone();

    tracker
        .complete_boolean(&mut entity, &staff, &SubstageId::new("s2"))
        .unwrap();
    assert!(entity.is_substage_complete(&SubstageId::new("s2")));

    let err = tracker
        .complete_boolean(&mut racing, &staff, &SubstageId::new("s3"))
        .unwrap_err();
    assert_eq!(
        err,
        TatError::OutOfOrder {
            substage: SubstageId::new("s3"),
            requires: SubstageId::new("s2"),
        }
    );
    assert_eq!(err.to_string(), "sub-stage s3 cannot be completed before s2");
}
