//! Identity directory collaborator: recipient id → published public key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use tracing::info;

use crate::error::StoreError;
use crate::json_file::{load_or_default, save_atomic};
use crate::models::{DisplayMetadata, Profile};

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn get_profile(&self, recipient_id: &str) -> Result<Option<Profile>, StoreError>;

    /// Upsert the recipient's public key, merging display metadata.
    async fn publish_public_key(
        &self,
        recipient_id: &str,
        public_key_spki_b64: &str,
        display: DisplayMetadata,
    ) -> Result<(), StoreError>;

    /// Base64 SPKI of the recipient, if one was ever published.
    async fn get_public_key(&self, recipient_id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get_profile(recipient_id).await?.map(|p| p.public_key))
    }
}

fn upsert(
    profiles: &mut HashMap<String, Profile>,
    recipient_id: &str,
    public_key: &str,
    display: DisplayMetadata,
) {
    let now = Utc::now();
    match profiles.get_mut(recipient_id) {
        Some(existing) => existing.merge(public_key, display, now),
        None => {
            profiles.insert(
                recipient_id.to_string(),
                Profile::new(recipient_id, public_key, display, now),
            );
        }
    }
    info!(recipient = recipient_id, "published public key");
}

// ── Memory ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityDirectory for MemoryDirectory {
    async fn get_profile(&self, recipient_id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().get(recipient_id).cloned())
    }

    async fn publish_public_key(
        &self,
        recipient_id: &str,
        public_key_spki_b64: &str,
        display: DisplayMetadata,
    ) -> Result<(), StoreError> {
        upsert(
            &mut self.profiles.write(),
            recipient_id,
            public_key_spki_b64,
            display,
        );
        Ok(())
    }
}

// ── JSON file ─────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct FileDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileDirectory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl IdentityDirectory for FileDirectory {
    async fn get_profile(&self, recipient_id: &str) -> Result<Option<Profile>, StoreError> {
        let mut profiles: HashMap<String, Profile> = load_or_default(&self.path)?;
        Ok(profiles.remove(recipient_id))
    }

    async fn publish_public_key(
        &self,
        recipient_id: &str,
        public_key_spki_b64: &str,
        display: DisplayMetadata,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        let mut profiles: HashMap<String, Profile> = load_or_default(&self.path)?;
        upsert(&mut profiles, recipient_id, public_key_spki_b64, display);
        save_atomic(&self.path, &profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn exercise(dir: &dyn IdentityDirectory) {
        assert_eq!(dir.get_public_key("ada").await.unwrap(), None);

        dir.publish_public_key(
            "ada",
            "KEY1",
            DisplayMetadata {
                display_name: Some("Ada".into()),
                photo_url: None,
            },
        )
        .await
        .unwrap();
        dir.publish_public_key("ada", "KEY2", DisplayMetadata::default())
            .await
            .unwrap();

        let profile = dir.get_profile("ada").await.unwrap().unwrap();
        assert_eq!(profile.public_key, "KEY2");
        assert_eq!(profile.display.display_name.as_deref(), Some("Ada"));
        assert_eq!(dir.get_public_key("ada").await.unwrap().as_deref(), Some("KEY2"));
    }

    #[tokio::test]
    async fn memory_directory_upserts() {
        exercise(&MemoryDirectory::new()).await;
    }

    #[tokio::test]
    async fn file_directory_upserts() {
        let tmp = tempdir().unwrap();
        exercise(&FileDirectory::new(tmp.path().join("directory.json"))).await;
    }
}
