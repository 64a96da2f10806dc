//! Axum route handlers for the template gallery.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::identity::Identity;
use crate::state::AppState;
use crate::templates::{export_placeholder, find_template, ExportFormat, Template, GALLERY};

/// GET /api/v1/templates
pub async fn handle_gallery() -> Json<Vec<Template>> {
    Json(GALLERY.to_vec())
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub template: &'static str,
    pub file: String,
}

/// POST /api/v1/templates/:id/export
pub async fn handle_export(
    State(state): State<AppState>,
    _identity: Identity,
    Path(template_id): Path<String>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, AppError> {
    let template = find_template(&template_id)
        .ok_or_else(|| AppError::NotFound(format!("Template {template_id}")))?;

    let path = export_placeholder(&state.config.export_dir, request.format)
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ExportResponse {
        template: template.id,
        file: path.display().to_string(),
    }))
}
