//! Local fallback store.
//!
//! A synchronous key → JSON map on the filesystem: one file per owner under a
//! configured directory, holding the owner's entire application array. Every
//! write replaces the whole array; there is no partial-key addressing.
//!
//! Unreadable or unparseable contents are treated as an empty collection and
//! logged — a corrupt cache must never take the lifecycle manager down.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::models::application::Application;

#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("local store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("local store encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl AsRef<Path>) -> Result<LocalStore, LocalStoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(LocalStore { root })
    }

    fn key_path(&self, owner_id: Uuid) -> PathBuf {
        self.root.join(format!("applications-{owner_id}.json"))
    }

    /// Reads the owner's full collection. A missing key is an empty
    /// collection; a malformed one is recovered as empty.
    pub fn read(&self, owner_id: Uuid) -> Vec<Application> {
        let path = self.key_path(owner_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!("Failed to read local cache {}: {e}", path.display());
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(applications) => applications,
            Err(e) => {
                warn!(
                    "Malformed local cache {} ({e}); treating as empty",
                    path.display()
                );
                Vec::new()
            }
        }
    }

    /// Replaces the owner's full collection, newest first.
    pub fn write(
        &self,
        owner_id: Uuid,
        applications: &[Application],
    ) -> Result<(), LocalStoreError> {
        let mut applications = applications.to_vec();
        applications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let raw = serde_json::to_string_pretty(&applications)?;
        fs::write(self.key_path(owner_id), raw)?;
        Ok(())
    }

    /// Inserts or replaces one record, rewriting the whole array.
    pub fn upsert(&self, application: &Application) -> Result<(), LocalStoreError> {
        let mut applications = self.read(application.owner_id);
        applications.retain(|a| a.id != application.id);
        applications.push(application.clone());
        self.write(application.owner_id, &applications)
    }

    /// Removes one record if present. Removing an unknown id is not an error.
    pub fn remove(&self, owner_id: Uuid, id: Uuid) -> Result<(), LocalStoreError> {
        let mut applications = self.read(owner_id);
        let before = applications.len();
        applications.retain(|a| a.id != id);
        if applications.len() != before {
            self.write(owner_id, &applications)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationDraft;

    fn draft(title: &str) -> ApplicationDraft {
        ApplicationDraft {
            title: title.to_string(),
            company: "Acme".to_string(),
            position: "Engineer".to_string(),
            ..Default::default()
        }
    }

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::open(dir.path()).expect("open store");
        (dir, store)
    }

    #[test]
    fn test_missing_key_reads_empty() {
        let (_dir, store) = store();
        assert!(store.read(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_write_read_roundtrip_newest_first() {
        let (_dir, store) = store();
        let owner = Uuid::new_v4();
        let older = Application::from_draft(owner, draft("first"));
        std::thread::sleep(std::time::Duration::from_millis(5));
        let newer = Application::from_draft(owner, draft("second"));

        store.write(owner, &[older.clone(), newer.clone()]).unwrap();
        let read = store.read(owner);
        assert_eq!(read.len(), 2);
        assert_eq!(read[0].id, newer.id);
        assert_eq!(read[1].id, older.id);
    }

    #[test]
    fn test_malformed_cache_recovers_as_empty() {
        let (dir, store) = store();
        let owner = Uuid::new_v4();
        fs::write(
            dir.path().join(format!("applications-{owner}.json")),
            "{not json",
        )
        .unwrap();
        assert!(store.read(owner).is_empty());
    }

    #[test]
    fn test_upsert_replaces_by_id() {
        let (_dir, store) = store();
        let owner = Uuid::new_v4();
        let mut app = Application::from_draft(owner, draft("FE Dev"));
        store.upsert(&app).unwrap();

        app.company = "Acme Corp".to_string();
        store.upsert(&app).unwrap();

        let read = store.read(owner);
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].company, "Acme Corp");
    }

    #[test]
    fn test_remove_unknown_id_is_ok() {
        let (_dir, store) = store();
        let owner = Uuid::new_v4();
        store.remove(owner, Uuid::new_v4()).unwrap();
    }

    #[test]
    fn test_collections_are_scoped_per_owner() {
        let (_dir, store) = store();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store
            .upsert(&Application::from_draft(alice, draft("Alice's")))
            .unwrap();

        assert!(store.read(bob).is_empty());
        assert_eq!(store.read(alice).len(), 1);
    }
}
