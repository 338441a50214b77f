//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, server: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/health", get(handlers::health_check))
        // Catalogs
        .route("/catalogs/:family", get(handlers::get_catalog))
        // Entities
        .route(
            "/entities",
            get(handlers::list_entities).post(handlers::create_entity),
        )
        .route("/entities/:id", get(handlers::get_entity))
        .route("/entities/:id/stage", post(handlers::change_stage))
        .route(
            "/entities/:id/substages/:substage/complete",
            post(handlers::complete_substage),
        )
        .route(
            "/entities/:id/substages/:substage/percentage",
            post(handlers::update_percentage),
        )
        // Timelines
        .route("/entities/:id/timeline", get(handlers::get_timeline))
        .route(
            "/entities/:id/timeline/regenerate",
            post(handlers::regenerate_timeline),
        )
        .route("/entities/:id/timeline/sync", post(handlers::sync_timeline))
        // Events
        .route("/events/stream", get(handlers::stream_events));

    let router = Router::new()
        .nest("/api/v1", api_routes)
        .layer(DefaultBodyLimit::max(server.max_body_size))
        .layer(TraceLayer::new_for_http());

    let router = if server.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
