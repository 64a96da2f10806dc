//! Axum route handlers for the social surface.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::identity::Identity;
use crate::lifecycle::Saved;
use crate::models::application::{Application, ApplicationDraft, ApplicationStatus};
use crate::models::profile::{FriendConnection, LeaderboardEntry, UserProfile};
use crate::social::{
    accept_friend, explore_feed, get_profile, leaderboard, list_friends, remove_friend,
    request_friend, upsert_profile, FeedItem, FriendsView, ProfileUpsert,
};
use crate::state::AppState;
use crate::store::remote::{eq, APPLICATIONS_TABLE};

/// GET /api/v1/profiles/:user_id
///
/// Private profiles are only visible to their owner.
pub async fn handle_get_profile(
    State(state): State<AppState>,
    identity: Identity,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = get_profile(&state.remote, user_id)
        .await?
        .filter(|p| p.is_public || p.user_id == identity.id)
        .ok_or_else(|| AppError::NotFound(format!("Profile for user {user_id}")))?;
    Ok(Json(profile))
}

/// PUT /api/v1/profile
pub async fn handle_upsert_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<ProfileUpsert>,
) -> Result<Json<UserProfile>, AppError> {
    if identity.ephemeral {
        return Err(AppError::Validation(
            "a local-only identity cannot publish a profile".to_string(),
        ));
    }
    if payload.username.trim().is_empty() || payload.display_name.trim().is_empty() {
        return Err(AppError::Validation(
            "username and display_name are required".to_string(),
        ));
    }
    let profile = upsert_profile(&state.remote, identity.id, payload).await?;
    Ok(Json(profile))
}

/// GET /api/v1/friends
pub async fn handle_list_friends(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<FriendsView>, AppError> {
    if identity.ephemeral {
        return Ok(Json(FriendsView::empty()));
    }
    let view = list_friends(&state.remote, identity.id).await?;
    Ok(Json(view))
}

/// POST /api/v1/friends/:friend_id
pub async fn handle_request_friend(
    State(state): State<AppState>,
    identity: Identity,
    Path(friend_id): Path<Uuid>,
) -> Result<(StatusCode, Json<FriendConnection>), AppError> {
    if identity.ephemeral {
        return Err(AppError::Validation(
            "a local-only identity cannot send friend requests".to_string(),
        ));
    }
    if friend_id == identity.id {
        return Err(AppError::Validation(
            "cannot send a friend request to yourself".to_string(),
        ));
    }
    let connection = request_friend(&state.remote, identity.id, friend_id).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

/// POST /api/v1/friends/:id/accept
pub async fn handle_accept_friend(
    State(state): State<AppState>,
    identity: Identity,
    Path(connection_id): Path<Uuid>,
) -> Result<Json<FriendConnection>, AppError> {
    let connection = accept_friend(&state.remote, identity.id, connection_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Friend request {connection_id}")))?;
    Ok(Json(connection))
}

/// DELETE /api/v1/friends/:id
pub async fn handle_remove_friend(
    State(state): State<AppState>,
    identity: Identity,
    Path(connection_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !identity.ephemeral {
        remove_friend(&state.remote, identity.id, connection_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ExploreQuery {
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
}

/// GET /api/v1/explore
pub async fn handle_explore(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<ExploreQuery>,
) -> Result<Json<Vec<FeedItem>>, AppError> {
    let items = explore_feed(&state.remote, query.search.as_deref(), query.status).await?;
    Ok(Json(items))
}

/// GET /api/v1/explore/leaderboard
pub async fn handle_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let entries = leaderboard(&state.remote).await?;
    Ok(Json(entries))
}

/// POST /api/v1/explore/:id/copy
///
/// Quick-adds someone else's public application into the caller's own
/// collection; the copy lands with status `copied`.
pub async fn handle_copy_application(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Saved>), AppError> {
    let mut rows: Vec<Application> = state
        .remote
        .select(
            APPLICATIONS_TABLE,
            &[eq("id", id), eq("is_public", true)],
            None,
            Some(1),
        )
        .await?;
    let source = rows
        .pop()
        .ok_or_else(|| AppError::NotFound(format!("Public application {id}")))?;

    let draft = ApplicationDraft {
        title: source.title,
        company: source.company,
        position: source.position,
        job_description: source.job_description,
        cv_content: source.cv_content,
        cv_data: Some(source.cv_data),
        is_public: Some(true),
        allow_comments: Some(true),
    };
    let created = state.lifecycle.create(&identity, draft).await?;
    let saved = state
        .lifecycle
        .set_status(&identity, created.application.id, ApplicationStatus::Copied)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}
