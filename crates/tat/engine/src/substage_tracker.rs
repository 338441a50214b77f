//! Sub-stage Progression Tracker
//!
//! Sub-stages are ordered globally across every stage group, not just
//! within one group. A sub-stage can be completed only once its immediate
//! predecessor in that global order is complete. Percentage-typed
//! sub-stages complete themselves at 100.
//!
//! Finishing the last open sub-stage of a group moves the entity into that
//! group's stage without consulting the transition validator; completion
//! order already guarantees forward movement. A group that finishes while
//! the entity is already at or past its stage leaves the stage alone.
//!
//! Groups of stages behind the entity's stage count as finished: they are
//! seeded as complete when an entity starts later in the catalog or moves
//! forward past them.

use tat_types::{
    Actor, Entity, StageCatalog, SubstageId, SubstageKind, SubstageSlot, TatError, TatResult,
};

/// Stage move caused by a group finishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAdvance {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstageOutcome {
    pub substage: SubstageId,
    /// The sub-stage is in the completed set after this call
    pub completed: bool,
    /// Every sub-stage of the owning group is complete
    pub group_complete: bool,
    pub advance: Option<StageAdvance>,
    pub percentage: Option<u8>,
}

pub struct SubstageTracker<'a> {
    catalog: &'a StageCatalog,
}

impl<'a> SubstageTracker<'a> {
    pub fn new(catalog: &'a StageCatalog) -> Self {
        Self { catalog }
    }

    fn slot(&self, id: &SubstageId) -> TatResult<SubstageSlot<'a>> {
        self.catalog
            .find_substage(id)
            .ok_or_else(|| TatError::UnknownSubstage(id.clone()))
    }

    /// Check that `id` may be completed given `completed`.
    pub fn can_complete(
        &self,
        id: &SubstageId,
        completed: &[SubstageId],
    ) -> TatResult<SubstageSlot<'a>> {
        let slot = self.slot(id)?;
        if completed.contains(id) {
            return Err(TatError::AlreadyComplete(id.clone()));
        }
        if slot.position > 0 {
            let substages = self.catalog.substages();
            let predecessor = &substages[slot.position - 1].descriptor.id;
            if !completed.contains(predecessor) {
                return Err(TatError::OutOfOrder {
                    substage: id.clone(),
                    requires: predecessor.clone(),
                });
            }
        }
        Ok(slot)
    }

    /// Mark a sub-stage complete and advance the stage if its group is done.
    pub fn complete_boolean(
        &self,
        entity: &mut Entity,
        actor: &Actor,
        id: &SubstageId,
    ) -> TatResult<SubstageOutcome> {
        actor.require_update_rights("complete sub-stage")?;
        let slot = self.can_complete(id, &entity.completed_substages)?;
        Ok(self.record_completion(entity, slot))
    }

    /// Set progress on a percentage-typed sub-stage; 100 completes it.
    pub fn update_percentage(
        &self,
        entity: &mut Entity,
        actor: &Actor,
        id: &SubstageId,
        value: i64,
    ) -> TatResult<SubstageOutcome> {
        actor.require_update_rights("update sub-stage progress")?;
        if !(0..=100).contains(&value) {
            return Err(TatError::OutOfRange(value));
        }
        let value = value as u8;

        let slot = self.slot(id)?;
        if slot.descriptor.kind != SubstageKind::Percentage {
            return Err(TatError::NotPercentageTyped(id.clone()));
        }
        let slot = self.can_complete(id, &entity.completed_substages)?;

        let previous = entity.percentage_of(id);
        if value < previous && !actor.is_privileged() {
            return Err(TatError::Regression {
                substage: id.clone(),
                previous,
                requested: value,
            });
        }

        entity.percentage_substages.insert(id.clone(), value);
        if value == 100 {
            return Ok(self.record_completion(entity, slot));
        }

        Ok(SubstageOutcome {
            substage: id.clone(),
            completed: false,
            group_complete: false,
            advance: None,
            percentage: Some(value),
        })
    }

    fn record_completion(&self, entity: &mut Entity, slot: SubstageSlot<'_>) -> SubstageOutcome {
        let id = slot.descriptor.id.clone();
        entity.completed_substages.push(id.clone());
        if slot.descriptor.kind == SubstageKind::Percentage {
            entity.percentage_substages.insert(id.clone(), 100);
        }

        let group_complete = slot
            .stage
            .substages
            .iter()
            .all(|s| entity.is_substage_complete(&s.id));

        let mut advance = None;
        if group_complete {
            let ahead = self
                .catalog
                .index_of(&entity.stage)
                .map_or(true, |current| slot.stage_index > current);
            if ahead {
                advance = Some(StageAdvance {
                    from: std::mem::replace(&mut entity.stage, slot.stage.name.clone()),
                    to: slot.stage.name.clone(),
                });
            }
        }

        SubstageOutcome {
            percentage: (slot.descriptor.kind == SubstageKind::Percentage).then_some(100),
            substage: id,
            completed: true,
            group_complete,
            advance,
        }
    }

    /// Complete every sub-stage of the groups before the entity's stage.
    ///
    /// Returns the newly completed ids in global order.
    pub fn seed_passed_groups(&self, entity: &mut Entity) -> TatResult<Vec<SubstageId>> {
        let current = self.catalog.require_index(&entity.stage)?;
        let mut seeded = Vec::new();
        for slot in self.catalog.substages() {
            let id = &slot.descriptor.id;
            if slot.stage_index >= current || entity.is_substage_complete(id) {
                continue;
            }
            if slot.descriptor.kind == SubstageKind::Percentage {
                entity.percentage_substages.insert(id.clone(), 100);
            }
            entity.completed_substages.push(id.clone());
            seeded.push(id.clone());
        }
        Ok(seeded)
    }

    pub fn describe(outcome: &SubstageOutcome) -> String {
        match (outcome.completed, outcome.percentage) {
            (true, _) => format!("Sub-stage {} completed", outcome.substage),
            (false, Some(value)) => {
                format!("Sub-stage {} progress set to {}%", outcome.substage, value)
            }
            (false, None) => format!("Sub-stage {} updated", outcome.substage),
        }
    }
}
