use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::lifecycle::LifecycleError;
use crate::store::remote::RemoteError;
use crate::suggestions::SuggestError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Suggestion backend error: {0}")]
    Suggestions(#[from] SuggestError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<LifecycleError> for AppError {
    fn from(e: LifecycleError) -> AppError {
        match e {
            LifecycleError::NotFound(id) => AppError::NotFound(format!("Application {id}")),
            LifecycleError::Validation(field) => {
                AppError::Validation(format!("missing required field: {field}"))
            }
            LifecycleError::MutationInFlight(id) => {
                AppError::Conflict(format!("an update for application {id} is still in flight"))
            }
            LifecycleError::LocalStore(e) => AppError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "MUTATION_IN_FLIGHT", msg.clone()),
            AppError::Remote(e) => {
                tracing::error!("Remote store error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "REMOTE_STORE_ERROR",
                    "The remote store could not be reached".to_string(),
                )
            }
            AppError::Suggestions(e) => {
                tracing::error!("Suggestion backend error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SUGGESTIONS_ERROR",
                    "The suggestion backend could not be reached".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
