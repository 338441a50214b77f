//! Catalog inspection

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use tat_engine::CollaboratorRule;
use tat_types::{MilestoneId, StageCatalog, TatTable, WorkflowFamily};

/// One flattened milestone with its resolved offset
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneRule {
    pub id: MilestoneId,
    pub title: String,
    pub stage_ref: String,
    pub days: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub family: WorkflowFamily,
    pub catalog: StageCatalog,
    pub tat: TatTable,
    pub milestones: Vec<MilestoneRule>,
    pub collaborator_rules: Vec<CollaboratorRule>,
}

pub async fn get_catalog(
    State(state): State<AppState>,
    Path(family): Path<String>,
) -> ApiResult<Json<CatalogResponse>> {
    let family: WorkflowFamily = family.parse()?;
    let config = state.service.config();
    let cfg = config.family(family)?;

    let milestones = cfg
        .catalog
        .milestones()
        .into_iter()
        .map(|m| MilestoneRule {
            days: cfg.tat.days_for(&m.id),
            id: m.id,
            title: m.title,
            stage_ref: m.stage_ref,
        })
        .collect();

    let collaborator_rules = config
        .collaborator_rules
        .iter()
        .filter(|r| r.family == family)
        .cloned()
        .collect();

    Ok(Json(CatalogResponse {
        family,
        catalog: cfg.catalog.clone(),
        tat: cfg.tat.clone(),
        milestones,
        collaborator_rules,
    }))
}
