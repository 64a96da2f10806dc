//! Axum route handlers for the Applications API.
//!
//! Thin shims over the lifecycle manager: extract the identity, delegate,
//! let `AppError` translate typed failures. The `store`/`degraded` tags in
//! every response body are what the UI renders as "saved locally".

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::identity::Identity;
use crate::lifecycle::{Deleted, Listing, Saved};
use crate::models::application::{ApplicationDraft, ApplicationPatch, ApplicationStatus};
use crate::state::AppState;

/// GET /api/v1/applications
pub async fn handle_list(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Listing>, AppError> {
    let listing = state.lifecycle.list(&identity).await?;
    Ok(Json(listing))
}

/// POST /api/v1/applications
pub async fn handle_create(
    State(state): State<AppState>,
    identity: Identity,
    Json(draft): Json<ApplicationDraft>,
) -> Result<(StatusCode, Json<Saved>), AppError> {
    let saved = state.lifecycle.create(&identity, draft).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// POST /api/v1/applications/:id/advance
pub async fn handle_advance(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Saved>, AppError> {
    let saved = state.lifecycle.advance(&identity, id).await?;
    Ok(Json(saved))
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: ApplicationStatus,
}

/// PUT /api/v1/applications/:id/status
pub async fn handle_set_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(request): Json<SetStatusRequest>,
) -> Result<Json<Saved>, AppError> {
    let saved = state
        .lifecycle
        .set_status(&identity, id, request.status)
        .await?;
    Ok(Json(saved))
}

/// PATCH /api/v1/applications/:id
pub async fn handle_update_fields(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Json<Saved>, AppError> {
    let saved = state.lifecycle.update_fields(&identity, id, patch).await?;
    Ok(Json(saved))
}

/// DELETE /api/v1/applications/:id
///
/// Idempotent; the body still reports which store took the delete.
pub async fn handle_delete(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<Json<Deleted>, AppError> {
    let deleted = state.lifecycle.delete(&identity, id).await?;
    Ok(Json(deleted))
}
