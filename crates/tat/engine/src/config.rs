//! Engine configuration
//!
//! Catalogs, rule tables and collaborator rules are passed in explicitly;
//! the engine holds no module-level catalogs. [`EngineConfig::default`]
//! builds the stock interior-design workflows from [`crate::defaults`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tat_types::{ActorId, StageCatalog, TatError, TatResult, TatTable, WorkflowFamily};

/// Catalog and rule table for one workflow family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyConfig {
    pub catalog: StageCatalog,
    #[serde(default)]
    pub tat: TatTable,
}

/// Assign `user_id` as `role` when an entity of `family` enters `stage`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorRule {
    pub family: WorkflowFamily,
    pub stage: String,
    pub user_id: ActorId,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub families: BTreeMap<WorkflowFamily, FamilyConfig>,
    #[serde(default)]
    pub collaborator_rules: Vec<CollaboratorRule>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let families = WorkflowFamily::ALL
            .into_iter()
            .map(|family| {
                (
                    family,
                    FamilyConfig {
                        catalog: crate::defaults::catalog(family),
                        tat: crate::defaults::tat_table(family),
                    },
                )
            })
            .collect();
        Self {
            families,
            collaborator_rules: crate::defaults::collaborator_rules(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> TatResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| TatError::InvalidCatalog(format!("malformed engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> TatResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TatError::InvalidCatalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> TatResult<()> {
        for (family, cfg) in &self.families {
            if cfg.catalog.family != *family {
                return Err(TatError::InvalidCatalog(format!(
                    "catalog registered under {} declares family {}",
                    family, cfg.catalog.family
                )));
            }
            cfg.catalog.validate()?;
            cfg.tat.validate()?;
            cfg.tat.validate_span(&cfg.catalog)?;
        }

        for rule in &self.collaborator_rules {
            let cfg = self.family(rule.family)?;
            cfg.catalog.require_index(&rule.stage)?;
        }
        Ok(())
    }

    pub fn family(&self, family: WorkflowFamily) -> TatResult<&FamilyConfig> {
        self.families
            .get(&family)
            .ok_or_else(|| TatError::UnknownFamily(family.to_string()))
    }

    pub fn with_family(mut self, family: WorkflowFamily, config: FamilyConfig) -> Self {
        self.families.insert(family, config);
        self
    }

    pub fn without_collaborator_rules(mut self) -> Self {
        self.collaborator_rules.clear();
        self
    }
}
