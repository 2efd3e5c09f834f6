//! Key custody for one recipient on one device.
//!
//! The private key is stored as base64 PKCS#8 in a single well-known slot of a
//! device-local `KeyValueStore`.  It is never removed implicitly (not even on
//! sign-out) so the same user on the same device can decrypt after signing in
//! again.  Two devices of the same identity hold unrelated keys unless the user
//! explicitly exports from one and imports into the other.
//!
//! Recovery policy
//! ---------------
//! A record that no longer decodes is replaced by a freshly generated pair.
//! Confessions sealed for the discarded key become undecryptable; the
//! replacement is logged and reported through
//! `ProvisionedKey::replaced_corrupt_record` so the caller can warn the user.

use std::sync::Arc;

use tracing::{debug, info, warn};
use vc_crypto::{KeyPair, PrivateKey, PublicKey};
use zeroize::Zeroizing;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// The one slot this device uses for its private key.
pub const PRIVATE_KEY_SLOT: &str = "valentine_private_key";

#[derive(Debug)]
pub struct ProvisionedKey {
    pub private_key: PrivateKey,
    /// Base64 SPKI of a freshly generated pair, to be (re)published.
    /// `None` when an existing record was reused.
    pub public_key_export: Option<String>,
    pub is_new: bool,
    /// An unreadable record was discarded to produce this key.
    pub replaced_corrupt_record: bool,
}

#[derive(Clone)]
pub struct KeyCustodian {
    store: Arc<dyn KeyValueStore>,
}

impl KeyCustodian {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Return the stored private key, or generate, persist and return a new
    /// pair when the slot is empty or unreadable.
    pub async fn ensure_key_pair(&self) -> Result<ProvisionedKey, StoreError> {
        let mut replaced_corrupt_record = false;

        if let Some(record) = self.store.get(PRIVATE_KEY_SLOT).await? {
            match PrivateKey::from_pkcs8_b64(&record) {
                Ok(private_key) => {
                    debug!("reusing stored private key");
                    return Ok(ProvisionedKey {
                        private_key,
                        public_key_export: None,
                        is_new: false,
                        replaced_corrupt_record: false,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "stored private key is invalid, regenerating");
                    replaced_corrupt_record = true;
                }
            }
        }

        let pair = KeyPair::generate()?;
        let record = pair.private_key.to_pkcs8_b64()?;
        let public_key_export = pair.public_key.to_spki_b64()?;
        self.store.set(PRIVATE_KEY_SLOT, &record).await?;
        info!(
            fingerprint = %pair.public_key.fingerprint()?,
            "generated new recipient key pair"
        );

        Ok(ProvisionedKey {
            private_key: pair.private_key,
            public_key_export: Some(public_key_export),
            is_new: true,
            replaced_corrupt_record,
        })
    }

    /// Whether a record exists.  Does not decode it.
    pub async fn has_key_material(&self) -> Result<bool, StoreError> {
        self.store.exists(PRIVATE_KEY_SLOT).await
    }

    /// Load the stored key without ever generating one.
    pub async fn private_key(&self) -> Result<PrivateKey, StoreError> {
        let record = self
            .store
            .get(PRIVATE_KEY_SLOT)
            .await?
            .ok_or(StoreError::KeyMaterialAbsent)?;
        Ok(PrivateKey::from_pkcs8_b64(&record)?)
    }

    /// Explicit export of the private record for transfer to another device.
    pub async fn export_private_key(&self) -> Result<Zeroizing<String>, StoreError> {
        Ok(self.private_key().await?.to_pkcs8_b64()?)
    }

    /// Replace the local record with an exported one.  The record is decoded
    /// first; an invalid import leaves the current slot untouched.
    pub async fn import_private_key(&self, record: &str) -> Result<PublicKey, StoreError> {
        let private_key = PrivateKey::from_pkcs8_b64(record)?;
        let normalized = private_key.to_pkcs8_b64()?;
        self.store.set(PRIVATE_KEY_SLOT, &normalized).await?;
        let public_key = private_key.public_key();
        info!(fingerprint = %public_key.fingerprint()?, "imported private key");
        Ok(public_key)
    }

    /// Forget the local key.  Only for an explicit user reset.
    pub async fn clear(&self) -> Result<(), StoreError> {
        warn!("clearing local private key");
        self.store.remove(PRIVATE_KEY_SLOT).await
    }
}
