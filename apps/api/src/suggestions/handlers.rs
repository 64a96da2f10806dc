//! Axum route handlers for the Suggestions API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::identity::Identity;
use crate::suggestions::{SuggestRequest, Suggestion, QUICK_PROMPTS};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SuggestionsResponse {
    pub suggestions: Vec<Suggestion>,
}

/// POST /api/v1/suggestions
pub async fn handle_suggest(
    State(state): State<AppState>,
    _identity: Identity,
    Json(request): Json<SuggestRequest>,
) -> Result<Json<SuggestionsResponse>, AppError> {
    let suggestions = state.suggester.suggest(&request).await?;
    Ok(Json(SuggestionsResponse { suggestions }))
}

/// GET /api/v1/suggestions/prompts
pub async fn handle_quick_prompts() -> Json<Vec<&'static str>> {
    Json(QUICK_PROMPTS.to_vec())
}
