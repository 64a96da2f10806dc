pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::lifecycle::handlers as applications;
use crate::social::handlers as social;
use crate::state::AppState;
use crate::suggestions::handlers as suggestions;
use crate::templates::handlers as templates;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Applications API
        .route(
            "/api/v1/applications",
            get(applications::handle_list).post(applications::handle_create),
        )
        .route(
            "/api/v1/applications/:id/advance",
            post(applications::handle_advance),
        )
        .route(
            "/api/v1/applications/:id/status",
            put(applications::handle_set_status),
        )
        .route(
            "/api/v1/applications/:id",
            patch(applications::handle_update_fields).delete(applications::handle_delete),
        )
        // Suggestions API
        .route("/api/v1/suggestions", post(suggestions::handle_suggest))
        .route(
            "/api/v1/suggestions/prompts",
            get(suggestions::handle_quick_prompts),
        )
        // Social API
        .route("/api/v1/profiles/:user_id", get(social::handle_get_profile))
        .route("/api/v1/profile", put(social::handle_upsert_profile))
        .route("/api/v1/friends", get(social::handle_list_friends))
        .route(
            "/api/v1/friends/:friend_id",
            post(social::handle_request_friend),
        )
        .route(
            "/api/v1/friends/:id/accept",
            post(social::handle_accept_friend),
        )
        .route("/api/v1/friends/:id", delete(social::handle_remove_friend))
        .route("/api/v1/explore", get(social::handle_explore))
        .route(
            "/api/v1/explore/leaderboard",
            get(social::handle_leaderboard),
        )
        .route(
            "/api/v1/explore/:id/copy",
            post(social::handle_copy_application),
        )
        // Templates API
        .route("/api/v1/templates", get(templates::handle_gallery))
        .route(
            "/api/v1/templates/:id/export",
            post(templates::handle_export),
        )
        .with_state(state)
}
