//! TAT rule tables
//!
//! A rule table maps a milestone id to the number of days allowed after the
//! previous milestone. Milestones missing from the table fall back to
//! `default_days`; that leniency is intended, not an error.

use crate::{MilestoneId, StageCatalog, TatError, TatResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fallback offset for milestones with no rule
pub const DEFAULT_TAT_DAYS: i64 = 3;

/// Largest offset a single milestone may carry
pub const MAX_TAT_DAYS: i64 = 3_650;

/// Largest total span of one generated timeline
pub const MAX_TIMELINE_DAYS: i64 = 36_500;

fn default_days() -> i64 {
    DEFAULT_TAT_DAYS
}

/// Day offsets per milestone for one workflow family
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TatTable {
    #[serde(default = "default_days")]
    pub default_days: i64,
    #[serde(default)]
    pub days: BTreeMap<MilestoneId, i64>,
}

impl Default for TatTable {
    fn default() -> Self {
        Self {
            default_days: DEFAULT_TAT_DAYS,
            days: BTreeMap::new(),
        }
    }
}

impl TatTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, days: i64) -> Self {
        self.default_days = days;
        self
    }

    pub fn with_rule(mut self, milestone: impl Into<String>, days: i64) -> Self {
        self.days.insert(MilestoneId::new(milestone), days);
        self
    }

    /// Offset for a milestone, or the table default.
    pub fn days_for(&self, milestone: &MilestoneId) -> i64 {
        self.days.get(milestone).copied().unwrap_or(self.default_days)
    }

    pub fn has_rule(&self, milestone: &MilestoneId) -> bool {
        self.days.contains_key(milestone)
    }

    /// Expected date of `milestone` when the previous one is due at `from`.
    pub fn due_after(
        &self,
        from: DateTime<Utc>,
        milestone: &MilestoneId,
    ) -> TatResult<DateTime<Utc>> {
        Duration::try_days(self.days_for(milestone))
            .and_then(|offset| from.checked_add_signed(offset))
            .ok_or_else(|| TatError::DateOutOfRange(milestone.clone()))
    }

    pub fn validate(&self) -> TatResult<()> {
        let in_range = |days: i64| (0..=MAX_TAT_DAYS).contains(&days);
        if !in_range(self.default_days) {
            return Err(TatError::InvalidCatalog(format!(
                "default TAT of {} days is outside 0-{}",
                self.default_days, MAX_TAT_DAYS
            )));
        }
        if let Some((id, days)) = self.days.iter().find(|(_, d)| !in_range(**d)) {
            return Err(TatError::InvalidCatalog(format!(
                "TAT for '{}' is {} days, outside 0-{}",
                id, days, MAX_TAT_DAYS
            )));
        }
        Ok(())
    }

    /// Check that a full timeline for `catalog` stays within
    /// [`MAX_TIMELINE_DAYS`].
    pub fn validate_span(&self, catalog: &StageCatalog) -> TatResult<()> {
        let span: i64 = catalog
            .milestones()
            .iter()
            .map(|m| self.days_for(&m.id).max(0))
            .fold(0i64, i64::saturating_add);
        if span > MAX_TIMELINE_DAYS {
            return Err(TatError::InvalidCatalog(format!(
                "{} timeline spans {} days, more than {}",
                catalog.family, span, MAX_TIMELINE_DAYS
            )));
        }
        Ok(())
    }
}
