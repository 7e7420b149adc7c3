//! Axum router construction for the Enroll API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled and responses marked non-cacheable, since rosters
//! change between any two requests.

use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use axum::http::header::CACHE_CONTROL;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the Enroll server.
///
/// The router includes:
/// - `GET /health` -- liveness and totals
/// - `GET /activities` -- all rosters
/// - `POST /activities/{activity}/signup` -- enroll
/// - `DELETE /activities/{activity}/unregister` -- withdraw
/// - `GET /ws/rosters` -- `WebSocket` roster event stream
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/activities", get(handlers::list_activities))
        .route("/activities/{activity}/signup", post(handlers::signup))
        .route(
            "/activities/{activity}/unregister",
            delete(handlers::unregister),
        )
        .route("/ws/rosters", get(ws::ws_rosters))
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
