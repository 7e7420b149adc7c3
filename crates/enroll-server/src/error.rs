//! HTTP mapping for registration outcomes.
//!
//! [`ResponseEnvelope`] is converted into an Axum response here. Success
//! is `200 OK` with `{"message": ...}`. Failures carry
//! `{"error_kind", "message", "detail", "status"}` with `404` for the
//! not-found class and `400` for every other client error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::service::{ResponseEnvelope, StatusClass};

impl StatusClass {
    /// The HTTP status code for this class.
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::ClientError => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ResponseEnvelope {
    fn into_response(self) -> Response {
        let status = self.status_class().http_status();

        let body = match self {
            Self::Success { message } => serde_json::json!({ "message": message }),
            Self::Failure {
                error_kind,
                message,
            } => serde_json::json!({
                "error_kind": error_kind,
                "message": message,
                "detail": message,
                "status": status.as_u16(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
