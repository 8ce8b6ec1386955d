//! Mapping of review failures onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use tracing::{error, warn};

use crate::types::ReviewError;

/// A failed `/analyze` call, rendered as `{error, ...}` JSON
#[derive(Debug)]
pub struct ApiError(pub ReviewError);

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status_and_body(&self) -> (StatusCode, Value) {
        match &self.0 {
            ReviewError::Validation(validation) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": validation.to_string() }),
            ),
            ReviewError::UpstreamRejected {
                agent,
                status,
                body,
            } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": format!("{} returned non-2xx", agent),
                    "status": status,
                    "data": body,
                }),
            ),
            ReviewError::UpstreamUnreachable {
                agent,
                message,
                timed_out,
            } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": format!("{} unreachable", agent),
                    "agent": agent.as_str(),
                    "detail": message,
                    "timed_out": timed_out,
                }),
            ),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Analyze failed", "detail": other.to_string() }),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        let err = &self.0;
        if err.is_client_error() {
            warn!("[/analyze] rejected request: {}", err);
        } else if err.is_upstream() {
            warn!("[/analyze] upstream failure: {}", body);
        } else {
            error!("[/analyze] {}", body);
        }
        (status, Json(body)).into_response()
    }
}
