//! Stage catalogs: the canonical stage order of each workflow family
//!
//! A catalog is an ordered list of stages. Hierarchical families (project
//! delivery) nest an ordered list of sub-stage descriptors inside each
//! stage; flat families (lead, service) do not.
//!
//! Flattening a catalog into milestones follows one rule: a stage without
//! sub-stages contributes a single milestone keyed by the slug of its name;
//! a stage with sub-stages contributes one milestone per sub-stage, keyed by
//! the sub-stage id.

use crate::{MilestoneId, SubstageId, TatError, TatResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Workflow Family ──────────────────────────────────────────────────

/// The workflow families that own timelines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowFamily {
    /// Sales lead pipeline
    Lead,
    /// Project delivery pipeline (hierarchical)
    Project,
    /// After-sales service pipeline
    Service,
}

impl WorkflowFamily {
    pub const ALL: [WorkflowFamily; 3] = [Self::Lead, Self::Project, Self::Service];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Project => "project",
            Self::Service => "service",
        }
    }
}

impl std::fmt::Display for WorkflowFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowFamily {
    type Err = TatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lead" | "leads" => Ok(Self::Lead),
            "project" | "projects" => Ok(Self::Project),
            "service" | "services" | "service_request" => Ok(Self::Service),
            other => Err(TatError::UnknownFamily(other.to_string())),
        }
    }
}

// ── Sub-stages ───────────────────────────────────────────────────────

/// How progress on a sub-stage is tracked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstageKind {
    /// Done or not done
    #[default]
    Boolean,
    /// 0–100, auto-completes at 100
    Percentage,
}

/// A fine-grained unit of progress inside a stage
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubstageDescriptor {
    pub id: SubstageId,
    pub name: String,
    pub order: u32,
    #[serde(rename = "type", default)]
    pub kind: SubstageKind,
}

impl SubstageDescriptor {
    pub fn boolean(id: impl Into<String>, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: SubstageId::new(id),
            name: name.into(),
            order,
            kind: SubstageKind::Boolean,
        }
    }

    pub fn percentage(id: impl Into<String>, name: impl Into<String>, order: u32) -> Self {
        Self {
            id: SubstageId::new(id),
            name: name.into(),
            order,
            kind: SubstageKind::Percentage,
        }
    }
}

// ── Stages ───────────────────────────────────────────────────────────

/// One stage of a workflow
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEntry {
    pub name: String,
    pub order: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub substages: Vec<SubstageDescriptor>,
}

impl StageEntry {
    pub fn new(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            order,
            substages: Vec::new(),
        }
    }

    pub fn with_substage(mut self, substage: SubstageDescriptor) -> Self {
        self.substages.push(substage);
        self
    }
}

/// A milestone as the catalog describes it, before dates are attached
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MilestoneTemplate {
    pub id: MilestoneId,
    pub title: String,
    pub stage_ref: String,
    pub stage_index: usize,
    /// True for the first milestone of its stage
    pub leads_stage: bool,
}

/// A sub-stage located in the catalog's global order
#[derive(Clone, Copy, Debug)]
pub struct SubstageSlot<'a> {
    /// Position across all stage groups
    pub position: usize,
    pub stage_index: usize,
    pub stage: &'a StageEntry,
    pub descriptor: &'a SubstageDescriptor,
}

// ── Stage Catalog ────────────────────────────────────────────────────

/// The ordered stage list of one workflow family
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCatalog {
    pub family: WorkflowFamily,
    pub stages: Vec<StageEntry>,
}

impl StageCatalog {
    pub fn new(family: WorkflowFamily, stages: Vec<StageEntry>) -> Self {
        Self { family, stages }
    }

    /// Build a flat catalog from stage names, ordered as given.
    pub fn flat<I, S>(family: WorkflowFamily, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stages = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| StageEntry::new(name, i as u32 + 1))
            .collect();
        Self { family, stages }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn is_hierarchical(&self) -> bool {
        self.stages.iter().any(|s| !s.substages.is_empty())
    }

    pub fn first_stage(&self) -> Option<&StageEntry> {
        self.stages.first()
    }

    pub fn stage(&self, index: usize) -> Option<&StageEntry> {
        self.stages.get(index)
    }

    /// Position of a stage in canonical order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.stages.iter().position(|s| s.name == name)
    }

    /// Like [`index_of`](Self::index_of), failing with `InvalidStage`.
    pub fn require_index(&self, name: &str) -> TatResult<usize> {
        self.index_of(name).ok_or_else(|| TatError::InvalidStage {
            family: self.family,
            stage: name.to_string(),
        })
    }

    /// Flatten into the ordered milestone sequence.
    pub fn milestones(&self) -> Vec<MilestoneTemplate> {
        let mut out = Vec::new();
        for (stage_index, stage) in self.stages.iter().enumerate() {
            if stage.substages.is_empty() {
                out.push(MilestoneTemplate {
                    id: MilestoneId::new(slugify(&stage.name)),
                    title: stage.name.clone(),
                    stage_ref: stage.name.clone(),
                    stage_index,
                    leads_stage: true,
                });
                continue;
            }
            for (i, sub) in stage.substages.iter().enumerate() {
                out.push(MilestoneTemplate {
                    id: sub.id.as_milestone(),
                    title: sub.name.clone(),
                    stage_ref: stage.name.clone(),
                    stage_index,
                    leads_stage: i == 0,
                });
            }
        }
        out
    }

    /// All sub-stages across every group, in global order.
    pub fn substages(&self) -> Vec<SubstageSlot<'_>> {
        self.stages
            .iter()
            .enumerate()
            .flat_map(|(stage_index, stage)| {
                stage.substages.iter().map(move |descriptor| (stage_index, stage, descriptor))
            })
            .enumerate()
            .map(|(position, (stage_index, stage, descriptor))| SubstageSlot {
                position,
                stage_index,
                stage,
                descriptor,
            })
            .collect()
    }

    pub fn find_substage(&self, id: &SubstageId) -> Option<SubstageSlot<'_>> {
        self.substages().into_iter().find(|s| &s.descriptor.id == id)
    }

    /// Reject catalogs the engine cannot order deterministically.
    pub fn validate(&self) -> TatResult<()> {
        if self.stages.is_empty() {
            return Err(TatError::InvalidCatalog(format!(
                "{} catalog has no stages",
                self.family
            )));
        }

        let mut names = HashSet::new();
        let mut milestone_ids = HashSet::new();
        let mut previous_order = None;

        for stage in &self.stages {
            if stage.name.trim().is_empty() {
                return Err(TatError::InvalidCatalog(format!(
                    "{} catalog contains a stage with an empty name",
                    self.family
                )));
            }
            if !names.insert(stage.name.as_str()) {
                return Err(TatError::InvalidCatalog(format!(
                    "duplicate stage '{}' in {} catalog",
                    stage.name, self.family
                )));
            }
            if previous_order.is_some_and(|prev| stage.order <= prev) {
                return Err(TatError::InvalidCatalog(format!(
                    "stage '{}' has order {} which does not follow its predecessor",
                    stage.name, stage.order
                )));
            }
            previous_order = Some(stage.order);

            let mut previous_sub_order = None;
            for sub in &stage.substages {
                if previous_sub_order.is_some_and(|prev| sub.order <= prev) {
                    return Err(TatError::InvalidCatalog(format!(
                        "sub-stage '{}' in '{}' is out of order",
                        sub.id, stage.name
                    )));
                }
                previous_sub_order = Some(sub.order);
            }
        }

        for template in self.milestones() {
            if !milestone_ids.insert(template.id.clone()) {
                return Err(TatError::InvalidCatalog(format!(
                    "duplicate milestone id '{}' in {} catalog",
                    template.id, self.family
                )));
            }
        }

        Ok(())
    }
}

/// Machine key for a display name: lowercase, runs of anything that is
/// not alphanumeric collapsed to a single underscore.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}
