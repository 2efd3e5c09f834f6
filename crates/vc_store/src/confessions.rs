//! Confession store collaborator.  Holds opaque envelopes only.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;
use vc_crypto::Envelope;

use crate::error::StoreError;
use crate::json_file::{load_or_default, save_atomic};
use crate::models::Confession;

#[async_trait]
pub trait ConfessionStore: Send + Sync {
    /// Store a new confession and return its id.  The store stamps `created_at`.
    async fn put(
        &self,
        recipient_id: &str,
        envelope: &Envelope,
        sender_label: &str,
    ) -> Result<String, StoreError>;

    /// All confessions for `recipient_id`, in no particular order.
    async fn list_by_recipient(&self, recipient_id: &str) -> Result<Vec<Confession>, StoreError>;
}

fn new_confession(recipient_id: &str, envelope: &Envelope, sender_label: &str) -> Confession {
    Confession {
        id: Uuid::new_v4().to_string(),
        recipient_id: recipient_id.to_string(),
        envelope: envelope.clone(),
        sender_label: sender_label.to_string(),
        created_at: Utc::now(),
    }
}

// ── Memory ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryConfessionStore {
    confessions: RwLock<Vec<Confession>>,
}

impl MemoryConfessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, e.g. one imported from elsewhere.
    pub fn insert(&self, confession: Confession) {
        self.confessions.write().push(confession);
    }
}

#[async_trait]
impl ConfessionStore for MemoryConfessionStore {
    async fn put(
        &self,
        recipient_id: &str,
        envelope: &Envelope,
        sender_label: &str,
    ) -> Result<String, StoreError> {
        let confession = new_confession(recipient_id, envelope, sender_label);
        let id = confession.id.clone();
        self.confessions.write().push(confession);
        debug!(recipient = recipient_id, id = %id, "stored confession");
        Ok(id)
    }

    async fn list_by_recipient(&self, recipient_id: &str) -> Result<Vec<Confession>, StoreError> {
        Ok(self
            .confessions
            .read()
            .iter()
            .filter(|c| c.recipient_id == recipient_id)
            .cloned()
            .collect())
    }
}

// ── JSON file ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FileConfessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileConfessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl ConfessionStore for FileConfessionStore {
    async fn put(
        &self,
        recipient_id: &str,
        envelope: &Envelope,
        sender_label: &str,
    ) -> Result<String, StoreError> {
        let _guard = self.write_lock.lock();
        let mut all: Vec<Confession> = load_or_default(&self.path)?;
        let confession = new_confession(recipient_id, envelope, sender_label);
        let id = confession.id.clone();
        all.push(confession);
        save_atomic(&self.path, &all)?;
        debug!(recipient = recipient_id, id = %id, "stored confession");
        Ok(id)
    }

    async fn list_by_recipient(&self, recipient_id: &str) -> Result<Vec<Confession>, StoreError> {
        let all: Vec<Confession> = load_or_default(&self.path)?;
        Ok(all
            .into_iter()
            .filter(|c| c.recipient_id == recipient_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn exercise(store: &dyn ConfessionStore) {
        let a = store.put("ada", &Envelope::from("A.A"), "Anonymous").await.unwrap();
        let b = store.put("bob", &Envelope::from("B.B"), "Carol").await.unwrap();
        let c = store.put("ada", &Envelope::from("C.C"), "Dan").await.unwrap();
        assert_ne!(a, c);

        let mut ada = store.list_by_recipient("ada").await.unwrap();
        ada.sort_by(|x, y| x.envelope.as_str().cmp(y.envelope.as_str()));
        assert_eq!(ada.len(), 2);
        assert_eq!(ada[0].id, a);
        assert_eq!(ada[1].sender_label, "Dan");

        let bob = store.list_by_recipient("bob").await.unwrap();
        assert_eq!(bob.len(), 1);
        assert_eq!(bob[0].id, b);
        assert!(store.list_by_recipient("eve").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_store_filters_by_recipient() {
        exercise(&MemoryConfessionStore::new()).await;
    }

    #[tokio::test]
    async fn file_store_filters_by_recipient() {
        let tmp = tempdir().unwrap();
        exercise(&FileConfessionStore::new(tmp.path().join("confessions.json"))).await;
    }
}
