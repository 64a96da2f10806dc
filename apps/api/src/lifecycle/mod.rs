//! Application Lifecycle Manager.
//!
//! The single authority for creating, listing, mutating and deleting
//! application records, and for deciding which store an operation hits:
//!
//! - ephemeral identities live entirely in the local fallback store;
//! - everyone else is served by the remote row store, degrading to the local
//!   cache when the remote is unreachable. Degradation is reported in the
//!   result (`store` + `degraded`), never raised as a hard failure.
//!
//! Infrastructure failures (remote unreachable, malformed cache) are absorbed
//! here; logical failures (`NotFound`, `Validation`, `MutationInFlight`)
//! propagate as typed errors for the HTTP layer to surface.

pub mod handlers;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::identity::Identity;
use crate::models::application::{
    Application, ApplicationDraft, ApplicationPatch, ApplicationStatus,
};
use crate::store::local::{LocalStore, LocalStoreError};
use crate::store::remote::ApplicationsStore;
use crate::store::StoreKind;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("application {0} not found")]
    NotFound(Uuid),

    #[error("missing required field: {0}")]
    Validation(&'static str),

    #[error("another update for application {0} is still in flight")]
    MutationInFlight(Uuid),

    #[error(transparent)]
    LocalStore(#[from] LocalStoreError),
}

/// Outcome of a successful mutation. `degraded` means the remote store was
/// the intended target but the local fallback took the write.
#[derive(Debug, Clone, Serialize)]
pub struct Saved {
    pub application: Application,
    pub store: StoreKind,
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub applications: Vec<Application>,
    pub store: StoreKind,
    pub degraded: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Deleted {
    pub store: StoreKind,
    pub degraded: bool,
}

pub struct LifecycleManager {
    remote: Arc<dyn ApplicationsStore>,
    local: LocalStore,
    /// Ids with a mutation currently outstanding. Two rapid advances on the
    /// same record must not race into a double-advance.
    in_flight: Mutex<HashSet<Uuid>>,
}

impl LifecycleManager {
    pub fn new(remote: Arc<dyn ApplicationsStore>, local: LocalStore) -> LifecycleManager {
        LifecycleManager {
            remote,
            local,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Owner-scoped listing, newest first. Fails soft: a remote error serves
    /// the local cache and flags the listing as degraded.
    pub async fn list(&self, identity: &Identity) -> Result<Listing, LifecycleError> {
        if identity.ephemeral {
            return Ok(Listing {
                applications: self.local.read(identity.id),
                store: StoreKind::Local,
                degraded: false,
            });
        }
        match self.remote.list(identity.id).await {
            Ok(applications) => {
                // Keep the fallback cache tracking the remote truth.
                if let Err(e) = self.local.write(identity.id, &applications) {
                    warn!("Failed to refresh local cache for {}: {e}", identity.id);
                }
                Ok(Listing {
                    applications,
                    store: StoreKind::Remote,
                    degraded: false,
                })
            }
            Err(e) => {
                warn!(
                    "Remote list failed ({e}); serving local cache for {}",
                    identity.id
                );
                Ok(Listing {
                    applications: self.local.read(identity.id),
                    store: StoreKind::Local,
                    degraded: true,
                })
            }
        }
    }

    /// Creates a record in `draft` status. Identifying fields are validated
    /// before any store is touched; a remote write failure degrades to a
    /// local write rather than losing the record.
    pub async fn create(
        &self,
        identity: &Identity,
        draft: ApplicationDraft,
    ) -> Result<Saved, LifecycleError> {
        if let Some(field) = draft.missing_field() {
            return Err(LifecycleError::Validation(field));
        }
        let application = Application::from_draft(identity.id, draft);

        if identity.ephemeral {
            self.local.upsert(&application)?;
            return Ok(Saved {
                application,
                store: StoreKind::Local,
                degraded: false,
            });
        }

        match self.remote.insert(&application).await {
            Ok(()) => {
                self.cache_upsert(&application);
                Ok(Saved {
                    application,
                    store: StoreKind::Remote,
                    degraded: false,
                })
            }
            Err(e) => {
                warn!(
                    "Remote create failed ({e}); saving application {} locally",
                    application.id
                );
                self.local.upsert(&application)?;
                Ok(Saved {
                    application,
                    store: StoreKind::Local,
                    degraded: true,
                })
            }
        }
    }

    /// Guarded forward transition. A no-op advance (already `accepted`)
    /// writes nothing and leaves `updated_at` untouched.
    pub async fn advance(&self, identity: &Identity, id: Uuid) -> Result<Saved, LifecycleError> {
        self.mutate(identity, id, |application| {
            let next = application.status.advanced();
            if next == application.status {
                false
            } else {
                application.status = next;
                application.updated_at = Utc::now();
                true
            }
        })
        .await
    }

    /// Unguarded overwrite to any status. Intentionally unrestricted — the
    /// advance/set asymmetry is product behavior.
    pub async fn set_status(
        &self,
        identity: &Identity,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Saved, LifecycleError> {
        self.mutate(identity, id, move |application| {
            application.status = status;
            application.updated_at = Utc::now();
            true
        })
        .await
    }

    /// Merges a partial field update. `id`, `owner_id` and `created_at` are
    /// not representable in the patch type.
    pub async fn update_fields(
        &self,
        identity: &Identity,
        id: Uuid,
        patch: ApplicationPatch,
    ) -> Result<Saved, LifecycleError> {
        self.mutate(identity, id, move |application| {
            application.apply_patch(patch);
            true
        })
        .await
    }

    /// Idempotent delete: removing an unknown id succeeds on both paths.
    pub async fn delete(&self, identity: &Identity, id: Uuid) -> Result<Deleted, LifecycleError> {
        let _guard = self.begin_mutation(id)?;

        if identity.ephemeral {
            self.local.remove(identity.id, id)?;
            return Ok(Deleted {
                store: StoreKind::Local,
                degraded: false,
            });
        }

        match self.remote.delete(identity.id, id).await {
            Ok(()) => {
                self.cache_remove(identity.id, id);
                Ok(Deleted {
                    store: StoreKind::Remote,
                    degraded: false,
                })
            }
            Err(e) => {
                warn!("Remote delete for application {id} failed ({e}); removing locally");
                self.local.remove(identity.id, id)?;
                Ok(Deleted {
                    store: StoreKind::Local,
                    degraded: true,
                })
            }
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    async fn mutate<F>(
        &self,
        identity: &Identity,
        id: Uuid,
        apply: F,
    ) -> Result<Saved, LifecycleError>
    where
        F: FnOnce(&mut Application) -> bool,
    {
        let _guard = self.begin_mutation(id)?;

        if identity.ephemeral {
            let mut applications = self.local.read(identity.id);
            let application = applications
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(LifecycleError::NotFound(id))?;
            let changed = apply(application);
            let application = application.clone();
            if changed {
                self.local.write(identity.id, &applications)?;
            }
            return Ok(Saved {
                application,
                store: StoreKind::Local,
                degraded: false,
            });
        }

        match self.remote.fetch(identity.id, id).await {
            Ok(Some(mut application)) => {
                if !apply(&mut application) {
                    return Ok(Saved {
                        application,
                        store: StoreKind::Remote,
                        degraded: false,
                    });
                }
                match self.remote.update(&application).await {
                    Ok(()) => {
                        self.cache_upsert(&application);
                        Ok(Saved {
                            application,
                            store: StoreKind::Remote,
                            degraded: false,
                        })
                    }
                    Err(e) => {
                        warn!("Remote update for application {id} failed ({e}); saving locally");
                        self.local.upsert(&application)?;
                        Ok(Saved {
                            application,
                            store: StoreKind::Local,
                            degraded: true,
                        })
                    }
                }
            }
            Ok(None) => Err(LifecycleError::NotFound(id)),
            Err(e) => {
                warn!("Remote store unreachable for application {id} ({e}); using local cache");
                let mut applications = self.local.read(identity.id);
                let application = applications
                    .iter_mut()
                    .find(|a| a.id == id)
                    .ok_or(LifecycleError::NotFound(id))?;
                let changed = apply(application);
                let application = application.clone();
                if changed {
                    self.local.write(identity.id, &applications)?;
                }
                Ok(Saved {
                    application,
                    store: StoreKind::Local,
                    degraded: true,
                })
            }
        }
    }

    fn begin_mutation(&self, id: Uuid) -> Result<InFlightGuard<'_>, LifecycleError> {
        let mut in_flight = self.in_flight.lock().expect("in-flight set poisoned");
        if !in_flight.insert(id) {
            return Err(LifecycleError::MutationInFlight(id));
        }
        Ok(InFlightGuard {
            in_flight: &self.in_flight,
            id,
        })
    }

    fn cache_upsert(&self, application: &Application) {
        if let Err(e) = self.local.upsert(application) {
            warn!(
                "Failed to refresh local cache entry {}: {e}",
                application.id
            );
        }
    }

    fn cache_remove(&self, owner_id: Uuid, id: Uuid) {
        if let Err(e) = self.local.remove(owner_id, id) {
            warn!("Failed to drop local cache entry {id}: {e}");
        }
    }
}

struct InFlightGuard<'a> {
    in_flight: &'a Mutex<HashSet<Uuid>>,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .expect("in-flight set poisoned")
            .remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::remote::RemoteError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// In-memory stand-in for the remote row store, with failure injection.
    #[derive(Default)]
    struct FakeRemote {
        rows: Mutex<Vec<Application>>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    impl FakeRemote {
        fn check(&self) -> Result<(), RemoteError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                Err(RemoteError::Api {
                    status: 503,
                    message: "service unavailable".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl ApplicationsStore for FakeRemote {
        async fn list(&self, owner_id: Uuid) -> Result<Vec<Application>, RemoteError> {
            self.check()?;
            let mut rows: Vec<Application> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.owner_id == owner_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(rows)
        }

        async fn fetch(
            &self,
            owner_id: Uuid,
            id: Uuid,
        ) -> Result<Option<Application>, RemoteError> {
            self.check()?;
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.owner_id == owner_id && a.id == id)
                .cloned())
        }

        async fn insert(&self, application: &Application) -> Result<(), RemoteError> {
            self.check()?;
            self.rows.lock().unwrap().push(application.clone());
            Ok(())
        }

        async fn update(&self, application: &Application) -> Result<(), RemoteError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.iter_mut().find(|a| a.id == application.id) {
                *row = application.clone();
            }
            Ok(())
        }

        async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<(), RemoteError> {
            self.check()?;
            self.rows
                .lock()
                .unwrap()
                .retain(|a| !(a.owner_id == owner_id && a.id == id));
            Ok(())
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        remote: Arc<FakeRemote>,
        manager: LifecycleManager,
        identity: Identity,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let local = LocalStore::open(dir.path()).expect("open local store");
        let remote = Arc::new(FakeRemote::default());
        let manager = LifecycleManager::new(remote.clone(), local);
        let identity = Identity {
            id: Uuid::new_v4(),
            ephemeral: false,
        };
        Fixture {
            _dir: dir,
            remote,
            manager,
            identity,
        }
    }

    fn draft(title: &str) -> ApplicationDraft {
        ApplicationDraft {
            title: title.to_string(),
            company: "Acme".to_string(),
            position: "Frontend Developer".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_starts_in_draft_with_unique_ids() {
        let fx = fixture();
        let first = fx.manager.create(&fx.identity, draft("one")).await.unwrap();
        let second = fx.manager.create(&fx.identity, draft("two")).await.unwrap();

        assert_eq!(first.application.status, ApplicationStatus::Draft);
        assert_eq!(second.application.status, ApplicationStatus::Draft);
        assert_ne!(first.application.id, second.application.id);
        assert_eq!(first.store, StoreKind::Remote);
        assert!(!first.degraded);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields_before_any_store_io() {
        let fx = fixture();
        let result = fx
            .manager
            .create(
                &fx.identity,
                ApplicationDraft {
                    title: "".to_string(),
                    company: "Acme".to_string(),
                    position: "Engineer".to_string(),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(LifecycleError::Validation("title"))));
        assert_eq!(fx.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_advances_walk_the_forward_table() {
        // draft → applied → interview → accepted, one hop per call.
        let fx = fixture();
        let saved = fx.manager.create(&fx.identity, draft("hop")).await.unwrap();
        let id = saved.application.id;

        let first = fx.manager.advance(&fx.identity, id).await.unwrap();
        assert_eq!(first.application.status, ApplicationStatus::Applied);
        let second = fx.manager.advance(&fx.identity, id).await.unwrap();
        assert_eq!(second.application.status, ApplicationStatus::Interview);
        let third = fx.manager.advance(&fx.identity, id).await.unwrap();
        assert_eq!(third.application.status, ApplicationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_advance_on_accepted_is_idempotent_without_updated_at_bump() {
        let fx = fixture();
        let saved = fx
            .manager
            .create(&fx.identity, draft("done"))
            .await
            .unwrap();
        let id = saved.application.id;
        let accepted = fx
            .manager
            .set_status(&fx.identity, id, ApplicationStatus::Accepted)
            .await
            .unwrap();
        let updated_at = accepted.application.updated_at;

        let noop = fx.manager.advance(&fx.identity, id).await.unwrap();
        assert_eq!(noop.application.status, ApplicationStatus::Accepted);
        assert_eq!(noop.application.updated_at, updated_at);
    }

    #[tokio::test]
    async fn test_rejection_reentry_end_to_end() {
        // create → advance ×2 → interview; reject; advance → applied again.
        let fx = fixture();
        let saved = fx
            .manager
            .create(&fx.identity, draft("FE Dev at Acme"))
            .await
            .unwrap();
        let id = saved.application.id;

        fx.manager.advance(&fx.identity, id).await.unwrap();
        let second = fx.manager.advance(&fx.identity, id).await.unwrap();
        assert_eq!(second.application.status, ApplicationStatus::Interview);

        fx.manager
            .set_status(&fx.identity, id, ApplicationStatus::Rejected)
            .await
            .unwrap();
        let reentry = fx.manager.advance(&fx.identity, id).await.unwrap();
        assert_eq!(reentry.application.status, ApplicationStatus::Applied);
    }

    #[tokio::test]
    async fn test_set_status_has_no_transition_restrictions() {
        let fx = fixture();
        let saved = fx
            .manager
            .create(&fx.identity, draft("jump"))
            .await
            .unwrap();
        let id = saved.application.id;

        fx.manager
            .set_status(&fx.identity, id, ApplicationStatus::Rejected)
            .await
            .unwrap();
        let accepted = fx
            .manager
            .set_status(&fx.identity, id, ApplicationStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.application.status, ApplicationStatus::Accepted);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_ok_on_both_paths() {
        let fx = fixture();
        let deleted = fx
            .manager
            .delete(&fx.identity, Uuid::new_v4())
            .await
            .unwrap();
        assert_eq!(deleted.store, StoreKind::Remote);

        let ephemeral = Identity {
            id: Uuid::new_v4(),
            ephemeral: true,
        };
        let deleted = fx.manager.delete(&ephemeral, Uuid::new_v4()).await.unwrap();
        assert_eq!(deleted.store, StoreKind::Local);
    }

    #[tokio::test]
    async fn test_create_degrades_to_local_and_remains_listed() {
        let fx = fixture();
        fx.remote.fail.store(true, Ordering::SeqCst);

        let saved = fx
            .manager
            .create(&fx.identity, draft("offline"))
            .await
            .unwrap();
        assert_eq!(saved.store, StoreKind::Local);
        assert!(saved.degraded);

        let listing = fx.manager.list(&fx.identity).await.unwrap();
        assert!(listing.degraded);
        assert_eq!(listing.store, StoreKind::Local);
        assert!(listing
            .applications
            .iter()
            .any(|a| a.id == saved.application.id));
    }

    #[tokio::test]
    async fn test_list_never_returns_foreign_records() {
        let fx = fixture();
        let stranger = Identity {
            id: Uuid::new_v4(),
            ephemeral: false,
        };
        fx.manager.create(&fx.identity, draft("mine")).await.unwrap();
        fx.manager
            .create(&stranger, draft("theirs"))
            .await
            .unwrap();

        let listing = fx.manager.list(&fx.identity).await.unwrap();
        assert_eq!(listing.applications.len(), 1);
        assert!(listing
            .applications
            .iter()
            .all(|a| a.owner_id == fx.identity.id));
    }

    #[tokio::test]
    async fn test_update_fields_preserves_identity_fields() {
        let fx = fixture();
        let saved = fx
            .manager
            .create(&fx.identity, draft("patch me"))
            .await
            .unwrap();
        let original = saved.application;

        let patched = fx
            .manager
            .update_fields(
                &fx.identity,
                original.id,
                ApplicationPatch {
                    company: Some("Acme Corp".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let listing = fx.manager.list(&fx.identity).await.unwrap();
        let merged = &listing.applications[0];
        assert_eq!(merged.company, "Acme Corp");
        assert_eq!(merged.title, "patch me");
        assert_eq!(merged.id, original.id);
        assert_eq!(merged.owner_id, original.owner_id);
        assert_eq!(merged.created_at, original.created_at);
        assert!(patched.application.updated_at >= original.updated_at);
    }

    #[tokio::test]
    async fn test_advance_unknown_id_is_not_found() {
        let fx = fixture();
        let missing = Uuid::new_v4();
        let result = fx.manager.advance(&fx.identity, missing).await;
        assert!(matches!(result, Err(LifecycleError::NotFound(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_ephemeral_identity_never_touches_remote() {
        let fx = fixture();
        let ephemeral = Identity {
            id: Uuid::new_v4(),
            ephemeral: true,
        };

        let saved = fx.manager.create(&ephemeral, draft("local")).await.unwrap();
        fx.manager
            .advance(&ephemeral, saved.application.id)
            .await
            .unwrap();
        fx.manager.list(&ephemeral).await.unwrap();
        fx.manager
            .delete(&ephemeral, saved.application.id)
            .await
            .unwrap();

        assert_eq!(fx.remote.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_mutation_for_same_id_is_rejected() {
        let fx = fixture();
        let saved = fx.manager.create(&fx.identity, draft("busy")).await.unwrap();
        let id = saved.application.id;

        let _outstanding = fx.manager.begin_mutation(id).unwrap();
        let result = fx.manager.advance(&fx.identity, id).await;
        assert!(matches!(
            result,
            Err(LifecycleError::MutationInFlight(busy)) if busy == id
        ));

        drop(_outstanding);
        fx.manager.advance(&fx.identity, id).await.unwrap();
    }
}
