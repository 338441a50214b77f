//! Stock workflows for the interior-design business.
//!
//! Built on demand as plain values. Nothing here is global state; callers
//! that need different catalogs load their own [`EngineConfig`].
//!
//! [`EngineConfig`]: crate::EngineConfig

use crate::config::CollaboratorRule;
use tat_types::{
    ActorId, StageCatalog, StageEntry, SubstageDescriptor, TatTable, WorkflowFamily,
    DEFAULT_TAT_DAYS,
};

pub fn catalog(family: WorkflowFamily) -> StageCatalog {
    match family {
        WorkflowFamily::Lead => lead_catalog(),
        WorkflowFamily::Project => project_catalog(),
        WorkflowFamily::Service => service_catalog(),
    }
}

pub fn tat_table(family: WorkflowFamily) -> TatTable {
    match family {
        WorkflowFamily::Lead => lead_tat(),
        WorkflowFamily::Project => project_tat(),
        WorkflowFamily::Service => service_tat(),
    }
}

// ── Lead pipeline ────────────────────────────────────────────────────

pub fn lead_catalog() -> StageCatalog {
    StageCatalog::flat(
        WorkflowFamily::Lead,
        [
            "New",
            "Contacted",
            "Site Visit Scheduled",
            "Site Visit Done",
            "Quotation Shared",
            "Negotiation",
            "Booking Confirmed",
            "Converted",
        ],
    )
}

pub fn lead_tat() -> TatTable {
    TatTable::new()
        .with_rule("new", 0)
        .with_rule("contacted", 1)
        .with_rule("site_visit_scheduled", 2)
        .with_rule("site_visit_done", 3)
        .with_rule("quotation_shared", 2)
        .with_rule("negotiation", 5)
        .with_rule("booking_confirmed", 3)
        .with_rule("converted", 2)
}

// ── Project delivery ─────────────────────────────────────────────────

pub fn project_catalog() -> StageCatalog {
    StageCatalog::new(
        WorkflowFamily::Project,
        vec![
            StageEntry::new("Design", 1)
                .with_substage(SubstageDescriptor::boolean("design_brief", "Design Brief", 1))
                .with_substage(SubstageDescriptor::boolean("space_planning", "Space Planning", 2))
                .with_substage(SubstageDescriptor::boolean("renders_3d", "3D Renders", 3)),
            StageEntry::new("Approvals", 2)
                .with_substage(SubstageDescriptor::boolean("client_sign_off", "Client Sign-off", 1))
                .with_substage(SubstageDescriptor::boolean("final_drawings", "Final Drawings", 2)),
            StageEntry::new("Procurement", 3)
                .with_substage(SubstageDescriptor::boolean("material_selection", "Material Selection", 1))
                .with_substage(SubstageDescriptor::boolean("purchase_orders", "Purchase Orders", 2))
                .with_substage(SubstageDescriptor::boolean("material_received", "Material Received", 3)),
            StageEntry::new("Production", 4)
                .with_substage(SubstageDescriptor::percentage("carcass_fabrication", "Carcass Fabrication", 1))
                .with_substage(SubstageDescriptor::percentage("shutter_finishing", "Shutter Finishing", 2))
                .with_substage(SubstageDescriptor::boolean("quality_check", "Quality Check", 3)),
            StageEntry::new("Installation", 5)
                .with_substage(SubstageDescriptor::boolean("site_readiness", "Site Readiness", 1))
                .with_substage(SubstageDescriptor::percentage("modular_installation", "Modular Installation", 2))
                .with_substage(SubstageDescriptor::boolean("snag_closure", "Snag Closure", 3)),
            StageEntry::new("Handover", 6)
                .with_substage(SubstageDescriptor::boolean("final_cleaning", "Final Cleaning", 1))
                .with_substage(SubstageDescriptor::boolean("handover_walkthrough", "Handover Walkthrough", 2)),
        ],
    )
}

pub fn project_tat() -> TatTable {
    TatTable::new()
        .with_rule("design_brief", 0)
        .with_rule("space_planning", 3)
        .with_rule("renders_3d", 5)
        .with_rule("client_sign_off", 3)
        .with_rule("final_drawings", 4)
        .with_rule("material_selection", 3)
        .with_rule("purchase_orders", 2)
        .with_rule("material_received", 10)
        .with_rule("carcass_fabrication", 12)
        .with_rule("shutter_finishing", 7)
        .with_rule("quality_check", 2)
        .with_rule("site_readiness", 2)
        .with_rule("modular_installation", 7)
        .with_rule("snag_closure", 4)
        .with_rule("final_cleaning", 1)
        .with_rule("handover_walkthrough", 1)
}

// ── Service pipeline ─────────────────────────────────────────────────

pub fn service_catalog() -> StageCatalog {
    StageCatalog::flat(
        WorkflowFamily::Service,
        [
            "Request Raised",
            "Assessment",
            "Technician Assigned",
            "Work In Progress",
            "Resolved",
            "Closed",
        ],
    )
}

pub fn service_tat() -> TatTable {
    TatTable::new()
        .with_default(DEFAULT_TAT_DAYS)
        .with_rule("request_raised", 0)
        .with_rule("assessment", 1)
        .with_rule("technician_assigned", 1)
        .with_rule("work_in_progress", 2)
        .with_rule("resolved", 3)
        .with_rule("closed", 1)
}

// ── Collaborators ────────────────────────────────────────────────────

pub fn collaborator_rules() -> Vec<CollaboratorRule> {
    let rule = |family, stage: &str, user: &str, role: &str| CollaboratorRule {
        family,
        stage: stage.to_string(),
        user_id: ActorId::new(user),
        role: role.to_string(),
    };
    vec![
        rule(WorkflowFamily::Lead, "Site Visit Scheduled", "design-desk", "designer"),
        rule(WorkflowFamily::Lead, "Quotation Shared", "estimation-desk", "estimator"),
        rule(WorkflowFamily::Project, "Procurement", "procurement-desk", "procurement"),
        rule(WorkflowFamily::Project, "Production", "factory-desk", "production_manager"),
        rule(WorkflowFamily::Project, "Installation", "site-desk", "site_supervisor"),
        rule(WorkflowFamily::Service, "Technician Assigned", "service-desk", "service_coordinator"),
    ]
}
