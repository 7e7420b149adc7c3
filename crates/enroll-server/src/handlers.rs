//! REST endpoint handlers for the Enroll server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness and roster totals |
//! | `GET` | `/activities` | Every activity with its current roster |
//! | `POST` | `/activities/{activity}/signup?email=` | Enroll a participant |
//! | `DELETE` | `/activities/{activity}/unregister?email=` | Withdraw a participant |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use enroll_types::RosterSnapshot;
use tracing::debug;

use crate::service::{ErrorKind, ResponseEnvelope};
use crate::state::AppState;

/// Query parameters for the signup and unregister endpoints.
#[derive(Debug, serde::Deserialize)]
pub struct ParticipantQuery {
    /// The participant identifier. A missing value is treated as blank.
    pub email: Option<String>,
}

/// Liveness check with roster totals.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let snapshot = state.service.handle_list();
    Json(serde_json::json!({
        "status": "ok",
        "activities": snapshot.len(),
        "enrolled": snapshot.total_enrolled(),
    }))
}

/// List every activity, keyed by name, in catalog order.
pub async fn list_activities(State(state): State<Arc<AppState>>) -> Json<RosterSnapshot> {
    Json(state.service.handle_list())
}

/// Enroll the participant named by `email` in `activity`.
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Path(activity): Path<String>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> ResponseEnvelope {
    match query {
        Ok(Query(query)) => state
            .service
            .handle_register(&activity, query.email.as_deref().unwrap_or_default()),
        Err(rejection) => malformed_query(&rejection),
    }
}

/// Withdraw the participant named by `email` from `activity`.
pub async fn unregister(
    State(state): State<Arc<AppState>>,
    Path(activity): Path<String>,
    query: Result<Query<ParticipantQuery>, QueryRejection>,
) -> ResponseEnvelope {
    match query {
        Ok(Query(query)) => state
            .service
            .handle_unregister(&activity, query.email.as_deref().unwrap_or_default()),
        Err(rejection) => malformed_query(&rejection),
    }
}

/// A query string that does not deserialize (e.g. a repeated `email`) is
/// invalid input, reported in the same envelope as every other rejection.
fn malformed_query(rejection: &QueryRejection) -> ResponseEnvelope {
    debug!(error = %rejection, "Rejected malformed query string");
    ResponseEnvelope::Failure {
        error_kind: ErrorKind::InvalidInput,
        message: format!("Malformed query string: {}", rejection.body_text()),
    }
}
