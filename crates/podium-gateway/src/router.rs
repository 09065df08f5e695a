//! Axum router construction for the gateway.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws` -- `WebSocket` event stream
/// - `GET /api/achievements` -- the achievement catalog
/// - `GET /api/settings` -- current global settings
/// - `GET /api/credits` -- caller's balance
/// - `GET /api/ranking` -- current standings
/// - `POST /api/votes` -- cast a vote
/// - the `/api/admin/*` mutation surface
///
/// CORS is configured to allow any origin for development. In
/// production this should be restricted.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws", get(ws::ws_events))
        // REST API
        .route("/api/achievements", get(handlers::list_achievements))
        .route("/api/settings", get(handlers::get_settings))
        .route("/api/credits", get(handlers::get_credits))
        .route("/api/ranking", get(handlers::get_ranking))
        .route("/api/votes", post(handlers::cast_vote))
        // Admin surface
        .route("/api/admin/voting/pause", post(admin::pause_voting))
        .route("/api/admin/voting/resume", post(admin::resume_voting))
        .route("/api/admin/credits/give", post(admin::give_all_credits))
        .route("/api/admin/credits/reset", post(admin::reset_all_credits))
        .route("/api/admin/votes/reset", post(admin::reset_all_votes))
        .route("/api/admin/settings", put(admin::update_settings))
        .route("/api/admin/accounts/{id}", delete(admin::delete_account))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
