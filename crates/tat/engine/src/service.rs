//! Timeline Service
//!
//! Entry point for every entity operation. A mutation runs as one unit
//! under the entity's lock:
//!
//! 1. read the entity and note its version
//! 2. validate and apply the change (validator, tracker or regenerator)
//! 3. re-derive every milestone status against the resulting stage
//! 4. write back, conditional on the version read in step 1
//! 5. publish transition events
//!
//! Reads re-derive delayed/pending against "now" without persisting.

use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, FamilyConfig};
use crate::generator::TimelineGenerator;
use crate::locks::EntityLocks;
use crate::regenerator::{RegenerationOutcome, TimelineRegenerator};
use crate::status_deriver::{Derivation, StatusDeriver};
use crate::substage_tracker::{SubstageOutcome, SubstageTracker};
use crate::transition_validator::StageTransitionValidator;
use crate::trigger::{AutoCollaboratorTrigger, TransitionListener};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tat_storage::{EntityStore, QueryWindow};
use tat_types::{
    Actor, Collaborator, DelayReason, Entity, EntityId, StageCatalog, SubstageId, TatError,
    TatResult, Timeline, TransitionCause, TransitionEvent, WorkflowFamily,
};
use tokio::sync::broadcast;

/// Capacity of the transition event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

// ── Requests and outcomes ────────────────────────────────────────────

/// Parameters for creating a lead, project or service request
#[derive(Debug, Clone)]
pub struct NewEntity {
    pub id: Option<EntityId>,
    pub family: WorkflowFamily,
    pub name: String,
    /// Defaults to the first catalog stage
    pub stage: Option<String>,
    /// Defaults to now
    pub anchor: Option<DateTime<Utc>>,
}

impl NewEntity {
    pub fn new(family: WorkflowFamily, name: impl Into<String>) -> Self {
        Self {
            id: None,
            family,
            name: name.into(),
            stage: None,
            anchor: None,
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn at_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn anchored_at(mut self, anchor: DateTime<Utc>) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

#[derive(Debug, Clone)]
pub struct StageChangeOutcome {
    pub entity: Entity,
    /// False for a no-op request to the current stage
    pub changed: bool,
    /// Audit comment, or the no-op explanation
    pub message: String,
    pub event: Option<TransitionEvent>,
    pub collaborators_added: Vec<Collaborator>,
}

#[derive(Debug, Clone)]
pub struct SubstageUpdateOutcome {
    pub entity: Entity,
    pub substage: SubstageId,
    pub completed: bool,
    pub group_complete: bool,
    pub percentage: Option<u8>,
    /// Present when finishing the group moved the entity's stage
    pub event: Option<TransitionEvent>,
}

#[derive(Debug, Clone)]
pub struct RegenerationResult {
    pub entity: Entity,
    pub outcome: RegenerationOutcome,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub entity: Entity,
    pub appended: usize,
}

// ── Service ──────────────────────────────────────────────────────────

pub struct TimelineService {
    config: Arc<EngineConfig>,
    store: Arc<dyn EntityStore>,
    clock: Arc<dyn Clock>,
    locks: EntityLocks,
    events: broadcast::Sender<TransitionEvent>,
    listeners: Vec<Arc<dyn TransitionListener>>,
}

impl TimelineService {
    /// Build a service over `store`, with the collaborator trigger from
    /// `config` registered and the system clock.
    pub fn new(config: EngineConfig, store: Arc<dyn EntityStore>) -> TatResult<Self> {
        config.validate()?;
        let trigger = AutoCollaboratorTrigger::new(config.collaborator_rules.clone());
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config: Arc::new(config),
            store,
            clock: Arc::new(SystemClock),
            locks: EntityLocks::new(),
            events,
            listeners: vec![Arc::new(trigger)],
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn TransitionListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self, family: WorkflowFamily) -> TatResult<&StageCatalog> {
        Ok(&self.config.family(family)?.catalog)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events.subscribe()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // ── Reads ──

    pub async fn get_entity(&self, id: &EntityId) -> TatResult<Entity> {
        let mut entity = self.load(id).await?;
        StatusDeriver::refresh_delays(&mut entity.timeline, self.clock.now());
        Ok(entity)
    }

    pub async fn timeline(&self, id: &EntityId) -> TatResult<Timeline> {
        Ok(self.get_entity(id).await?.timeline)
    }

    pub async fn list_entities(
        &self,
        family: Option<WorkflowFamily>,
        window: QueryWindow,
    ) -> TatResult<Vec<Entity>> {
        let now = self.clock.now();
        let mut entities = self.store.list_entities(family, window).await?;
        for entity in &mut entities {
            StatusDeriver::refresh_delays(&mut entity.timeline, now);
        }
        Ok(entities)
    }

    // ── Mutations ──

    /// Create an entity and generate its timeline.
    pub async fn create_entity(&self, request: NewEntity, actor: &Actor) -> TatResult<Entity> {
        actor.require_update_rights("create entity")?;
        let cfg = self.config.family(request.family)?;
        let now = self.clock.now();
        let anchor = request.anchor.unwrap_or(now);

        let stage = match request.stage {
            Some(stage) => stage,
            None => cfg
                .catalog
                .first_stage()
                .map(|s| s.name.clone())
                .ok_or_else(|| {
                    TatError::InvalidCatalog(format!("{} catalog has no stages", request.family))
                })?,
        };

        let timeline =
            TimelineGenerator::new(&cfg.catalog, &cfg.tat).generate_for_stage(anchor, &stage, now)?;
        let id = request.id.unwrap_or_else(EntityId::generate);
        let mut entity = Entity::new(id, request.family, request.name, &stage, timeline, now);
        entity.record_audit(
            "entity_created",
            format!("Created at stage {} with {} milestones", stage, entity.timeline.len()),
            Some(&actor.id),
            now,
        );
        Self::seed_passed_groups(&mut entity, &cfg.catalog, actor, now)?;

        let stored = self.store.insert_entity(entity).await?;
        tracing::info!(
            entity_id = %stored.id,
            family = %stored.family,
            stage = %stored.stage,
            "Created entity"
        );
        Ok(stored)
    }

    /// Move an entity to `target`.
    pub async fn change_stage(
        &self,
        id: &EntityId,
        target: &str,
        actor: &Actor,
    ) -> TatResult<StageChangeOutcome> {
        let (entity, (message, event, collaborators_added)) = self
            .mutate(id, |entity, cfg, now| {
                let decision = StageTransitionValidator::new(&cfg.catalog).validate(
                    actor,
                    &entity.stage,
                    target,
                )?;
                let from = entity.stage.clone();
                let message = StageTransitionValidator::audit_comment(&from, target, &decision);
                if !decision.is_change() {
                    return Ok(((message, None, Vec::new()), false));
                }

                entity.stage = target.to_string();
                let event = TransitionEvent {
                    entity_id: entity.id.clone(),
                    family: entity.family,
                    from_stage: from,
                    to_stage: target.to_string(),
                    rollback: decision.is_rollback(),
                    cause: TransitionCause::StageChange,
                    actor: actor.id.clone(),
                    at: now,
                };
                entity.record_audit(event.event_type(), &message, Some(&actor.id), now);
                if !decision.is_rollback() {
                    Self::seed_passed_groups(entity, &cfg.catalog, actor, now)?;
                }
                let added = self.notify_listeners(entity, &event, now);
                Ok(((message, Some(event), added), true))
            })
            .await?;

        if let Some(event) = &event {
            tracing::info!(
                entity_id = %id,
                from = %event.from_stage,
                to = %event.to_stage,
                rollback = event.rollback,
                "Stage changed"
            );
            self.publish(event.clone());
        } else {
            tracing::debug!(entity_id = %id, stage = %target, "Stage change was a no-op");
        }

        Ok(StageChangeOutcome {
            changed: event.is_some(),
            entity,
            message,
            event,
            collaborators_added,
        })
    }

    /// Complete a sub-stage.
    pub async fn complete_substage(
        &self,
        id: &EntityId,
        substage: &SubstageId,
        actor: &Actor,
    ) -> TatResult<SubstageUpdateOutcome> {
        let (entity, (outcome, event)) = self
            .mutate(id, |entity, cfg, now| {
                let outcome =
                    SubstageTracker::new(&cfg.catalog).complete_boolean(entity, actor, substage)?;
                entity.record_audit(
                    "substage_completed",
                    SubstageTracker::describe(&outcome),
                    Some(&actor.id),
                    now,
                );
                let event = self.record_advance(entity, &outcome, actor, now);
                Ok(((outcome, event), true))
            })
            .await?;

        tracing::info!(entity_id = %id, substage = %substage, "Sub-stage completed");
        Ok(self.finish_substage_update(entity, outcome, event))
    }

    /// Set progress on a percentage-typed sub-stage.
    pub async fn update_percentage(
        &self,
        id: &EntityId,
        substage: &SubstageId,
        value: i64,
        note: Option<&str>,
        actor: &Actor,
    ) -> TatResult<SubstageUpdateOutcome> {
        let (entity, (outcome, event)) = self
            .mutate(id, |entity, cfg, now| {
                let outcome = SubstageTracker::new(&cfg.catalog)
                    .update_percentage(entity, actor, substage, value)?;
                let mut description = SubstageTracker::describe(&outcome);
                if let Some(note) = note.filter(|n| !n.trim().is_empty()) {
                    description = format!("{}: {}", description, note.trim());
                }
                let event_type = if outcome.completed {
                    "substage_completed"
                } else {
                    "substage_progress"
                };
                entity.record_audit(event_type, description, Some(&actor.id), now);
                let event = self.record_advance(entity, &outcome, actor, now);
                Ok(((outcome, event), true))
            })
            .await?;

        tracing::info!(
            entity_id = %id,
            substage = %substage,
            value,
            completed = outcome.completed,
            "Sub-stage progress updated"
        );
        Ok(self.finish_substage_update(entity, outcome, event))
    }

    /// Push the remaining schedule out from now after a delay.
    pub async fn regenerate(
        &self,
        id: &EntityId,
        from: &str,
        reason: &str,
        notes: Option<&str>,
        actor: &Actor,
    ) -> TatResult<RegenerationResult> {
        actor.require_update_rights("regenerate timeline")?;
        let reason: DelayReason = reason.parse()?;

        let (entity, outcome) = self
            .mutate(id, |entity, cfg, now| {
                let outcome = TimelineRegenerator::new(&cfg.tat).regenerate(
                    &mut entity.timeline,
                    from,
                    reason,
                    now,
                )?;
                let mut description = format!(
                    "Regenerated {} milestones from '{}' ({})",
                    outcome.count(),
                    from,
                    reason
                );
                if let Some(notes) = notes.filter(|n| !n.trim().is_empty()) {
                    description = format!("{}: {}", description, notes.trim());
                }
                entity.record_audit("timeline_regenerated", description, Some(&actor.id), now);
                Ok((outcome, true))
            })
            .await?;

        tracing::info!(
            entity_id = %id,
            from = %from,
            reason = %reason,
            updated = outcome.count(),
            "Timeline regenerated"
        );
        Ok(RegenerationResult { entity, outcome })
    }

    /// Append milestones for catalog entries added after creation.
    pub async fn sync_timeline(&self, id: &EntityId, actor: &Actor) -> TatResult<SyncOutcome> {
        actor.require_update_rights("extend timeline")?;
        let (entity, appended) = self
            .mutate(id, |entity, cfg, now| {
                let appended = TimelineGenerator::new(&cfg.catalog, &cfg.tat)
                    .append_missing(&mut entity.timeline, now)?;
                if appended == 0 {
                    return Ok((0, false));
                }
                entity.record_audit(
                    "timeline_extended",
                    format!("Appended {} milestones from the catalog", appended),
                    Some(&actor.id),
                    now,
                );
                Ok((appended, true))
            })
            .await?;

        if appended > 0 {
            tracing::info!(entity_id = %id, appended, "Timeline extended");
        }
        Ok(SyncOutcome { entity, appended })
    }

    // ── Internals ──

    async fn load(&self, id: &EntityId) -> TatResult<Entity> {
        self.store
            .get_entity(id)
            .await?
            .ok_or_else(|| TatError::EntityNotFound(id.clone()))
    }

    /// Run `op` as one locked read → change → derive → persist unit.
    ///
    /// `op` returns its result and whether anything should be written.
    /// Nothing is written when `op` fails or declines.
    async fn mutate<T, F>(&self, id: &EntityId, op: F) -> TatResult<(Entity, T)>
    where
        F: FnOnce(&mut Entity, &FamilyConfig, DateTime<Utc>) -> TatResult<(T, bool)>,
    {
        let _guard = self.locks.acquire(id).await;
        let current = self.load(id).await?;
        let cfg = self.config.family(current.family)?;
        let now = self.clock.now();

        let mut entity = current.clone();
        let (value, persist) = op(&mut entity, cfg, now)?;

        if !persist {
            let mut unchanged = current;
            StatusDeriver::refresh_delays(&mut unchanged.timeline, now);
            return Ok((unchanged, value));
        }

        let current_index = cfg.catalog.require_index(&entity.stage)?;
        StatusDeriver::new(&cfg.catalog).apply(
            &mut entity.timeline,
            &Derivation {
                current_index,
                entered_at: now,
                now,
                completed_substages: &entity.completed_substages,
            },
        );
        entity.updated_at = now;

        let stored = self.store.update_entity(entity, current.version).await?;
        Ok((stored, value))
    }

    /// Complete the sub-stages of groups the entity has moved past.
    fn seed_passed_groups(
        entity: &mut Entity,
        catalog: &StageCatalog,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> TatResult<()> {
        let seeded = SubstageTracker::new(catalog).seed_passed_groups(entity)?;
        if !seeded.is_empty() {
            tracing::debug!(entity_id = %entity.id, count = seeded.len(), "Seeded sub-stages");
            entity.record_audit(
                "substages_seeded",
                format!("Marked {} sub-stages of earlier stages complete", seeded.len()),
                Some(&actor.id),
                now,
            );
        }
        Ok(())
    }

    fn notify_listeners(
        &self,
        entity: &mut Entity,
        event: &TransitionEvent,
        now: DateTime<Utc>,
    ) -> Vec<Collaborator> {
        let mut added = Vec::new();
        for listener in &self.listeners {
            for collaborator in listener.on_transition(event, entity) {
                if entity.has_collaborator(&collaborator.user_id, &collaborator.role) {
                    continue;
                }
                tracing::debug!(
                    listener = listener.name(),
                    user = %collaborator.user_id,
                    role = %collaborator.role,
                    "Adding collaborator"
                );
                entity.record_audit(
                    "collaborator_added",
                    format!(
                        "{} added as {} on entering {}",
                        collaborator.user_id, collaborator.role, collaborator.added_for_stage
                    ),
                    None,
                    now,
                );
                entity.collaborators.push(collaborator.clone());
                added.push(collaborator);
            }
        }
        added
    }

    /// Audit and announce a stage move caused by a finished group.
    fn record_advance(
        &self,
        entity: &mut Entity,
        outcome: &SubstageOutcome,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Option<TransitionEvent> {
        let advance = outcome.advance.as_ref()?;
        let event = TransitionEvent {
            entity_id: entity.id.clone(),
            family: entity.family,
            from_stage: advance.from.clone(),
            to_stage: advance.to.clone(),
            rollback: false,
            cause: TransitionCause::SubstageCompletion,
            actor: actor.id.clone(),
            at: now,
        };
        entity.record_audit(
            event.event_type(),
            format!(
                "Stage changed from {} to {} (all sub-stages of {} complete)",
                advance.from, advance.to, advance.to
            ),
            Some(&actor.id),
            now,
        );
        self.notify_listeners(entity, &event, now);
        Some(event)
    }

    fn finish_substage_update(
        &self,
        entity: Entity,
        outcome: SubstageOutcome,
        event: Option<TransitionEvent>,
    ) -> SubstageUpdateOutcome {
        if let Some(event) = &event {
            tracing::info!(
                entity_id = %event.entity_id,
                from = %event.from_stage,
                to = %event.to_stage,
                "Stage advanced by sub-stage completion"
            );
            self.publish(event.clone());
        }
        SubstageUpdateOutcome {
            entity,
            substage: outcome.substage,
            completed: outcome.completed,
            group_complete: outcome.group_complete,
            percentage: outcome.percentage,
            event,
        }
    }

    fn publish(&self, event: TransitionEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("No subscribers for transition event");
        }
    }
}
