//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Occurrence materialization and overrides
        .route("/occurrences", get(handlers::list_occurrences))
        .route(
            "/occurrences/{occurrence_id}/override",
            get(handlers::get_occurrence_override),
        )
        .route(
            "/occurrences/{occurrence_id}/notes",
            put(handlers::set_occurrence_notes),
        )
        .route(
            "/occurrences/{occurrence_id}/participants",
            put(handlers::set_occurrence_participants),
        )
        // Series administration
        .route("/series", get(handlers::list_series).post(handlers::create_series))
        .route("/series/{series_id}", axum::routing::delete(handlers::delete_series))
        .route("/series/{series_id}/revisions", post(handlers::revise_series))
        // Commitment ledger
        .route(
            "/students/{student_id}/series/{series_id}/commitment",
            get(handlers::get_commitment_status).post(handlers::update_commitment),
        )
        .route(
            "/students/{student_id}/series/{series_id}/commitments",
            get(handlers::get_commitment_history),
        )
        .route(
            "/students/{student_id}/commitments",
            post(handlers::bulk_update_commitments),
        )
        .route(
            "/commitments/{record_id}/split",
            post(handlers::split_commitment),
        );

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
