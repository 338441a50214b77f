//! Timeline: the ordered milestone schedule owned by one entity
//!
//! Length and id sequence are fixed once generated. Items are mutated in
//! place by status and date recomputation and new items may be appended,
//! but nothing is ever removed or reordered.

use crate::{Milestone, MilestoneId, MilestoneStatus};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline(Vec<Milestone>);

impl Timeline {
    pub fn new(milestones: Vec<Milestone>) -> Self {
        Self(milestones)
    }

    pub fn milestones(&self) -> &[Milestone] {
        &self.0
    }

    /// Mutable access to items; the slice type keeps callers from
    /// inserting or removing.
    pub fn milestones_mut(&mut self) -> &mut [Milestone] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Milestone> {
        self.0.last()
    }

    pub fn find(&self, id: &MilestoneId) -> Option<&Milestone> {
        self.0.iter().find(|m| &m.id == id)
    }

    pub fn contains(&self, id: &MilestoneId) -> bool {
        self.find(id).is_some()
    }

    /// First position whose stage reference or milestone id equals `key`.
    pub fn position_of(&self, key: &str) -> Option<usize> {
        self.0
            .iter()
            .position(|m| m.stage_ref == key || m.id.as_str() == key)
    }

    pub fn append(&mut self, milestone: Milestone) {
        self.0.push(milestone);
    }

    pub fn count_with_status(&self, status: MilestoneStatus) -> usize {
        self.0.iter().filter(|m| m.status == status).count()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MilestoneId> {
        self.0.iter().map(|m| &m.id)
    }
}
