use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::domain::DomainError;

/// Error returned by handlers; renders as `{"error": ...}`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self(DomainError::Internal(format!("background task failed: {e}")))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            DomainError::Validation(errors) => {
                let mut by_field: BTreeMap<&'static str, Vec<String>> = BTreeMap::new();
                for error in errors {
                    by_field.entry(error.field.as_str()).or_default().push(error.message);
                }
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(json!({ "error": "Validation failed", "errors": by_field })),
                )
                    .into_response()
            }
            DomainError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("Not found: {}", what) })),
            )
                .into_response(),
            e @ DomainError::MalformedXml(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))).into_response()
            }
            e => {
                tracing::error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
