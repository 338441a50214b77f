//! Entity, timeline and progression handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tat_engine::{NewEntity, RegenerationOutcome};
use tat_storage::QueryWindow;
use tat_types::{
    Actor, Collaborator, Entity, EntityId, SubstageId, Timeline, TransitionEvent, WorkflowFamily,
};

// ── Requests ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateEntityRequest {
    pub actor: Actor,
    pub family: WorkflowFamily,
    pub name: String,
    #[serde(default)]
    pub id: Option<EntityId>,
    /// Initial stage; the first catalog stage when absent
    #[serde(default)]
    pub stage: Option<String>,
    /// Timeline anchor; now when absent
    #[serde(default)]
    pub anchor: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ListEntitiesQuery {
    pub family: Option<WorkflowFamily>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Body of a mutation that needs nothing but the acting user
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStageRequest {
    pub actor: Actor,
    pub stage: String,
}

#[derive(Debug, Deserialize)]
pub struct PercentageRequest {
    pub actor: Actor,
    pub value: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegenerateRequest {
    pub actor: Actor,
    /// Stage reference or milestone id to start from
    pub from: String,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
}

// ── Responses ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageChangeResponse {
    pub entity: Entity,
    pub changed: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<TransitionEvent>,
    pub collaborators_added: Vec<Collaborator>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstageResponse {
    pub entity: Entity,
    pub substage: SubstageId,
    pub completed: bool,
    pub group_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<TransitionEvent>,
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub entity: Entity,
    /// Number of re-dated milestones
    pub count: usize,
    #[serde(flatten)]
    pub outcome: RegenerationOutcome,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub entity: Entity,
    pub appended: usize,
}

// ── Handlers ─────────────────────────────────────────────────────────

pub async fn create_entity(
    State(state): State<AppState>,
    body: Result<Json<CreateEntityRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let Json(request) = body?;
    let mut new = NewEntity::new(request.family, request.name);
    if let Some(id) = request.id {
        new = new.with_id(id);
    }
    if let Some(stage) = request.stage {
        new = new.at_stage(stage);
    }
    if let Some(anchor) = request.anchor {
        new = new.anchored_at(anchor);
    }

    let entity = state.service.create_entity(new, &request.actor).await?;
    Ok((StatusCode::CREATED, Json(entity)))
}

pub async fn list_entities(
    State(state): State<AppState>,
    query: Result<Query<ListEntitiesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Entity>>> {
    let Query(query) = query?;
    let entities = state
        .service
        .list_entities(query.family, QueryWindow::new(query.limit, query.offset))
        .await?;
    Ok(Json(entities))
}

pub async fn get_entity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Entity>> {
    Ok(Json(state.service.get_entity(&EntityId::new(id)).await?))
}

pub async fn get_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Timeline>> {
    Ok(Json(state.service.timeline(&EntityId::new(id)).await?))
}

pub async fn change_stage(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ChangeStageRequest>, JsonRejection>,
) -> ApiResult<Json<StageChangeResponse>> {
    let Json(request) = body?;
    let outcome = state
        .service
        .change_stage(&EntityId::new(id), &request.stage, &request.actor)
        .await?;

    Ok(Json(StageChangeResponse {
        entity: outcome.entity,
        changed: outcome.changed,
        message: outcome.message,
        event: outcome.event,
        collaborators_added: outcome.collaborators_added,
    }))
}

pub async fn complete_substage(
    State(state): State<AppState>,
    Path((id, substage)): Path<(String, String)>,
    body: Result<Json<ActorRequest>, JsonRejection>,
) -> ApiResult<Json<SubstageResponse>> {
    let Json(request) = body?;
    let outcome = state
        .service
        .complete_substage(&EntityId::new(id), &SubstageId::new(substage), &request.actor)
        .await?;
    Ok(Json(substage_response(outcome)))
}

pub async fn update_percentage(
    State(state): State<AppState>,
    Path((id, substage)): Path<(String, String)>,
    body: Result<Json<PercentageRequest>, JsonRejection>,
) -> ApiResult<Json<SubstageResponse>> {
    let Json(request) = body?;
    let outcome = state
        .service
        .update_percentage(
            &EntityId::new(id),
            &SubstageId::new(substage),
            request.value,
            request.note.as_deref(),
            &request.actor,
        )
        .await?;
    Ok(Json(substage_response(outcome)))
}

pub async fn regenerate_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<RegenerateRequest>, JsonRejection>,
) -> ApiResult<Json<RegenerateResponse>> {
    let Json(request) = body?;
    let result = state
        .service
        .regenerate(
            &EntityId::new(id),
            &request.from,
            &request.reason,
            request.notes.as_deref(),
            &request.actor,
        )
        .await?;

    Ok(Json(RegenerateResponse {
        entity: result.entity,
        count: result.outcome.count(),
        outcome: result.outcome,
    }))
}

pub async fn sync_timeline(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ActorRequest>, JsonRejection>,
) -> ApiResult<Json<SyncResponse>> {
    let Json(request) = body?;
    let outcome = state
        .service
        .sync_timeline(&EntityId::new(id), &request.actor)
        .await?;
    Ok(Json(SyncResponse {
        entity: outcome.entity,
        appended: outcome.appended,
    }))
}

fn substage_response(outcome: tat_engine::SubstageUpdateOutcome) -> SubstageResponse {
    SubstageResponse {
        entity: outcome.entity,
        substage: outcome.substage,
        completed: outcome.completed,
        group_complete: outcome.group_complete,
        percentage: outcome.percentage,
        event: outcome.event,
    }
}
