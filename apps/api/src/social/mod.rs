//! Social surface: public profiles, friend connections, the explore feed and
//! the application-count leaderboard.
//!
//! Everything here lives in the remote row store only — ephemeral identities
//! cannot publish, friend, or appear on the leaderboard. Feed filtering and
//! leaderboard ranking are plain in-process passes over the fetched lists.

pub mod handlers;

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::application::{Application, ApplicationStatus};
use crate::models::profile::{FriendConnection, FriendStatus, LeaderboardEntry, UserProfile};
use crate::store::remote::{any_of, eq, RemoteClient, RemoteError};

const USER_PROFILES_TABLE: &str = "user_profiles";
const FRIEND_CONNECTIONS_TABLE: &str = "friend_connections";
const APPLICATIONS_TABLE: &str = "applications";
const LEADERBOARD_SIZE: usize = 10;

// ────────────────────────────────────────────────────────────────────────────
// Profiles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpsert {
    pub username: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub location: Option<String>,
    pub university: Option<String>,
    pub major: Option<String>,
    pub graduation_year: Option<i32>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub website_url: Option<String>,
    pub is_public: Option<bool>,
}

pub async fn get_profile(
    remote: &RemoteClient,
    user_id: Uuid,
) -> Result<Option<UserProfile>, RemoteError> {
    let mut rows: Vec<UserProfile> = remote
        .select(
            USER_PROFILES_TABLE,
            &[eq("user_id", user_id)],
            None,
            Some(1),
        )
        .await?;
    Ok(rows.pop())
}

/// Creates or replaces the caller's profile row.
pub async fn upsert_profile(
    remote: &RemoteClient,
    user_id: Uuid,
    payload: ProfileUpsert,
) -> Result<UserProfile, RemoteError> {
    let now = Utc::now();
    let existing = get_profile(remote, user_id).await?;

    let profile = UserProfile {
        id: existing.as_ref().map(|p| p.id).unwrap_or_else(Uuid::new_v4),
        user_id,
        username: payload.username,
        display_name: payload.display_name,
        bio: payload.bio,
        avatar_url: payload.avatar_url,
        location: payload.location,
        university: payload.university,
        major: payload.major,
        graduation_year: payload.graduation_year,
        linkedin_url: payload.linkedin_url,
        github_url: payload.github_url,
        website_url: payload.website_url,
        is_public: payload.is_public.unwrap_or(true),
        created_at: existing.as_ref().map(|p| p.created_at).unwrap_or(now),
        updated_at: now,
    };

    if existing.is_some() {
        remote
            .update(USER_PROFILES_TABLE, &[eq("user_id", user_id)], &profile)
            .await?;
    } else {
        remote.insert(USER_PROFILES_TABLE, &profile).await?;
    }
    Ok(profile)
}

// ────────────────────────────────────────────────────────────────────────────
// Friends
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct FriendsView {
    /// Accepted connections, in either direction.
    pub friends: Vec<FriendConnection>,
    /// Incoming requests still waiting on the caller.
    pub pending: Vec<FriendConnection>,
}

impl FriendsView {
    pub fn empty() -> FriendsView {
        FriendsView {
            friends: Vec::new(),
            pending: Vec::new(),
        }
    }
}

pub async fn list_friends(
    remote: &RemoteClient,
    user_id: Uuid,
) -> Result<FriendsView, RemoteError> {
    let sent: Vec<FriendConnection> = remote
        .select(
            FRIEND_CONNECTIONS_TABLE,
            &[eq("user_id", user_id)],
            None,
            None,
        )
        .await?;
    let received: Vec<FriendConnection> = remote
        .select(
            FRIEND_CONNECTIONS_TABLE,
            &[eq("friend_id", user_id)],
            None,
            None,
        )
        .await?;

    let friends = sent
        .iter()
        .chain(received.iter())
        .filter(|c| c.status == FriendStatus::Accepted)
        .cloned()
        .collect();
    let pending = received
        .into_iter()
        .filter(|c| c.status == FriendStatus::Pending)
        .collect();

    Ok(FriendsView { friends, pending })
}

pub async fn request_friend(
    remote: &RemoteClient,
    user_id: Uuid,
    friend_id: Uuid,
) -> Result<FriendConnection, RemoteError> {
    let now = Utc::now();
    let connection = FriendConnection {
        id: Uuid::new_v4(),
        user_id,
        friend_id,
        status: FriendStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    remote.insert(FRIEND_CONNECTIONS_TABLE, &connection).await?;
    Ok(connection)
}

/// Marks a pending request as accepted. Only the recipient may accept, so the
/// caller is matched against `friend_id`; returns `None` when no such request
/// exists for them.
pub async fn accept_friend(
    remote: &RemoteClient,
    user_id: Uuid,
    connection_id: Uuid,
) -> Result<Option<FriendConnection>, RemoteError> {
    let mut rows: Vec<FriendConnection> = remote
        .select(
            FRIEND_CONNECTIONS_TABLE,
            &[eq("id", connection_id), eq("friend_id", user_id)],
            None,
            Some(1),
        )
        .await?;
    let Some(mut connection) = rows.pop() else {
        return Ok(None);
    };

    connection.status = FriendStatus::Accepted;
    connection.updated_at = Utc::now();
    remote
        .update(
            FRIEND_CONNECTIONS_TABLE,
            &[eq("id", connection_id)],
            &connection,
        )
        .await?;
    Ok(Some(connection))
}

/// Removes a connection the caller participates in. Idempotent.
pub async fn remove_friend(
    remote: &RemoteClient,
    user_id: Uuid,
    connection_id: Uuid,
) -> Result<(), RemoteError> {
    // Two scoped deletes instead of an OR filter; at most one matches.
    remote
        .delete(
            FRIEND_CONNECTIONS_TABLE,
            &[eq("id", connection_id), eq("user_id", user_id)],
        )
        .await?;
    remote
        .delete(
            FRIEND_CONNECTIONS_TABLE,
            &[eq("id", connection_id), eq("friend_id", user_id)],
        )
        .await?;
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Explore feed
// ────────────────────────────────────────────────────────────────────────────

/// A public application joined with its owner's display identity.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    #[serde(flatten)]
    pub application: Application,
    pub username: String,
    pub display_name: String,
}

pub async fn explore_feed(
    remote: &RemoteClient,
    search: Option<&str>,
    status: Option<ApplicationStatus>,
) -> Result<Vec<FeedItem>, RemoteError> {
    let applications: Vec<Application> = remote
        .select(
            APPLICATIONS_TABLE,
            &[eq("is_public", true)],
            Some("created_at.desc"),
            None,
        )
        .await?;

    let profiles = profiles_by_user(remote, &applications).await?;
    let items = applications
        .into_iter()
        .map(|application| {
            let profile = profiles.get(&application.owner_id);
            FeedItem {
                username: profile
                    .map(|p| p.username.clone())
                    .unwrap_or_else(|| "Unknown User".to_string()),
                display_name: profile
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| "Unknown User".to_string()),
                application,
            }
        })
        .collect();

    Ok(filter_feed(items, search, status))
}

/// In-process filtering over the already-fetched feed: free-text match on
/// company/position/title and the owner's names, plus an exact status match.
pub fn filter_feed(
    items: Vec<FeedItem>,
    search: Option<&str>,
    status: Option<ApplicationStatus>,
) -> Vec<FeedItem> {
    let needle = search.map(|s| s.to_lowercase()).unwrap_or_default();
    items
        .into_iter()
        .filter(|item| {
            let matches_search = needle.is_empty()
                || [
                    &item.application.company,
                    &item.application.position,
                    &item.application.title,
                    &item.username,
                    &item.display_name,
                ]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            let matches_status = status.map_or(true, |s| item.application.status == s);
            matches_search && matches_status
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Leaderboard
// ────────────────────────────────────────────────────────────────────────────

pub async fn leaderboard(remote: &RemoteClient) -> Result<Vec<LeaderboardEntry>, RemoteError> {
    let applications: Vec<Application> = remote
        .select(APPLICATIONS_TABLE, &[eq("is_public", true)], None, None)
        .await?;
    let profiles = profiles_by_user(remote, &applications).await?;

    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for application in &applications {
        *counts.entry(application.owner_id).or_default() += 1;
    }

    Ok(rank_leaderboard(counts, &profiles))
}

/// Ranks identities by public application count, descending, username as the
/// tie-break, truncated to the top 10. Identities without a profile are
/// skipped — there is nothing to display for them.
pub fn rank_leaderboard(
    counts: HashMap<Uuid, usize>,
    profiles: &HashMap<Uuid, UserProfile>,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = counts
        .into_iter()
        .filter_map(|(user_id, application_count)| {
            profiles.get(&user_id).map(|profile| LeaderboardEntry {
                user_id,
                username: profile.username.clone(),
                display_name: profile.display_name.clone(),
                application_count,
                rank: 0,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.application_count
            .cmp(&a.application_count)
            .then_with(|| a.username.cmp(&b.username))
    });
    entries.truncate(LEADERBOARD_SIZE);
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.rank = index + 1;
    }
    entries
}

async fn profiles_by_user(
    remote: &RemoteClient,
    applications: &[Application],
) -> Result<HashMap<Uuid, UserProfile>, RemoteError> {
    let mut owner_ids: Vec<Uuid> = applications.iter().map(|a| a.owner_id).collect();
    owner_ids.sort();
    owner_ids.dedup();
    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let profiles: Vec<UserProfile> = remote
        .select(
            USER_PROFILES_TABLE,
            &[any_of("user_id", &owner_ids)],
            None,
            None,
        )
        .await?;
    Ok(profiles.into_iter().map(|p| (p.user_id, p)).collect())
}
