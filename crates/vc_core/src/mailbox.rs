//! Mailbox coordinator.
//!
//! Sender path: look up the recipient's published key, seal the message,
//! hand the envelope to the confession store.  Nothing is retained here.
//!
//! Recipient path: once the time lock opens, load this device's private key
//! and decrypt every stored envelope independently.  A broken envelope becomes
//! a placeholder entry; it never aborts the batch.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};
use vc_crypto::{CryptoError, Envelope, EnvelopeCipher, PrivateKey};
use vc_store::models::{Confession, DisplayMetadata, ANONYMOUS_SENDER};
use vc_store::{ConfessionStore, IdentityDirectory, KeyCustodian, StoreError};

use crate::error::MailboxError;
use crate::timelock::TimeLock;

/// Shown in place of a confession that could not be opened.
pub const UNDECRYPTABLE_MESSAGE: &str = "[Unable to decrypt this message]";

/// A sealed confession ready for the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingConfession {
    pub envelope: Envelope,
    pub sender_label: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptedConfession {
    pub id: String,
    pub message: String,
    pub sender_label: String,
    pub created_at: DateTime<Utc>,
    pub error: bool,
}

/// Outcome of provisioning this device's key for an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionReport {
    pub is_new: bool,
    pub replaced_corrupt_record: bool,
    /// The directory was written during this call.
    pub published: bool,
    /// A different, previously published key was overwritten.  Confessions
    /// sealed for it cannot be opened on this device.
    pub replaced_published_key: bool,
    /// The directory holds a key from another device; it was left alone.
    pub device_key_differs: bool,
    pub fingerprint: String,
}

pub struct Mailbox {
    directory: Arc<dyn IdentityDirectory>,
    store: Arc<dyn ConfessionStore>,
    time_lock: TimeLock,
}

fn sender_or_anonymous(sender_label: Option<&str>) -> String {
    match sender_label.map(str::trim) {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => ANONYMOUS_SENDER.to_string(),
    }
}

impl Mailbox {
    pub fn new(
        directory: Arc<dyn IdentityDirectory>,
        store: Arc<dyn ConfessionStore>,
        time_lock: TimeLock,
    ) -> Self {
        Self {
            directory,
            store,
            time_lock,
        }
    }

    pub fn time_lock(&self) -> &TimeLock {
        &self.time_lock
    }

    // ── Sender side ──────────────────────────────────────────────────────────

    /// Seal `plaintext` for a recipient key in published SPKI form.
    pub fn submit(
        recipient_public_key: &str,
        plaintext: &str,
        sender_label: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<OutgoingConfession, CryptoError> {
        let envelope = EnvelopeCipher::encrypt_for(recipient_public_key, plaintext)?;
        Ok(OutgoingConfession {
            envelope,
            sender_label: sender_or_anonymous(sender_label),
            created_at: now,
        })
    }

    /// Full sender flow.  Returns the store id of the new confession.
    pub async fn send(
        &self,
        recipient_id: &str,
        message: &str,
        sender_label: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, MailboxError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(MailboxError::EmptyMessage);
        }
        let public_key = self
            .directory
            .get_public_key(recipient_id)
            .await?
            .ok_or_else(|| MailboxError::RecipientNotFound(recipient_id.to_string()))?;

        let outgoing = Self::submit(&public_key, message, sender_label, now)?;
        let id = self
            .store
            .put(recipient_id, &outgoing.envelope, &outgoing.sender_label)
            .await?;
        info!(recipient = recipient_id, id = %id, "confession sealed and stored");
        Ok(id)
    }

    // ── Recipient side ───────────────────────────────────────────────────────

    /// Decrypt every confession in input order.  The caller must already have
    /// checked the time lock.
    pub fn reveal_all(private_key: &PrivateKey, confessions: &[Confession]) -> Vec<DecryptedConfession> {
        confessions
            .par_iter()
            .map(|c| match EnvelopeCipher::decrypt(private_key, &c.envelope) {
                Ok(message) => DecryptedConfession {
                    id: c.id.clone(),
                    message,
                    sender_label: c.sender_label.clone(),
                    created_at: c.created_at,
                    error: false,
                },
                Err(e) => {
                    warn!(id = %c.id, error = %e, "failed to decrypt confession");
                    DecryptedConfession {
                        id: c.id.clone(),
                        message: UNDECRYPTABLE_MESSAGE.to_string(),
                        sender_label: c.sender_label.clone(),
                        created_at: c.created_at,
                        error: true,
                    }
                }
            })
            .collect()
    }

    /// Time-gated inbox: newest first, decrypted with this device's key.
    pub async fn open_inbox(
        &self,
        custodian: &KeyCustodian,
        recipient_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<DecryptedConfession>, MailboxError> {
        if !self.time_lock.is_unlocked(now) {
            return Err(MailboxError::Locked {
                unlock_at: self.time_lock.unlock_at(),
            });
        }

        let mut confessions = self.store.list_by_recipient(recipient_id).await?;
        if confessions.is_empty() {
            return Ok(Vec::new());
        }
        confessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        let private_key = match custodian.private_key().await {
            Ok(key) => key,
            Err(StoreError::KeyMaterialAbsent) | Err(StoreError::Crypto(_)) => {
                return Err(MailboxError::KeyMaterialAbsent)
            }
            Err(e) => return Err(e.into()),
        };

        debug!(count = confessions.len(), "revealing confessions");
        Ok(Self::reveal_all(&private_key, &confessions))
    }

    pub async fn confession_count(&self, recipient_id: &str) -> Result<usize, MailboxError> {
        Ok(self.store.list_by_recipient(recipient_id).await?.len())
    }

    // ── Identity ─────────────────────────────────────────────────────────────

    /// Make sure this device holds a key for `recipient_id` and that senders
    /// can find a matching public key.
    pub async fn provision(
        &self,
        custodian: &KeyCustodian,
        recipient_id: &str,
        display: DisplayMetadata,
    ) -> Result<ProvisionReport, MailboxError> {
        let published_key = self.directory.get_public_key(recipient_id).await?;
        let provisioned = custodian.ensure_key_pair().await?;
        let device_public = provisioned.private_key.public_key();
        let fingerprint = device_public.fingerprint()?;

        let mut report = ProvisionReport {
            is_new: provisioned.is_new,
            replaced_corrupt_record: provisioned.replaced_corrupt_record,
            published: false,
            replaced_published_key: false,
            device_key_differs: false,
            fingerprint,
        };

        match (&provisioned.public_key_export, published_key) {
            (Some(fresh), previous) => {
                if let Some(previous) = previous {
                    report.replaced_published_key = previous != *fresh;
                    if report.replaced_published_key {
                        warn!(
                            recipient = recipient_id,
                            "replacing published key; earlier confessions will not decrypt on this device"
                        );
                    }
                }
                self.directory
                    .publish_public_key(recipient_id, fresh, display)
                    .await?;
                report.published = true;
            }
            (None, None) => {
                let spki = device_public.to_spki_b64()?;
                self.directory
                    .publish_public_key(recipient_id, &spki, display)
                    .await?;
                report.published = true;
            }
            (None, Some(previous)) => {
                let matches = vc_crypto::PublicKey::from_spki_b64(&previous)
                    .map(|k| k == device_public)
                    .unwrap_or(false);
                if !matches {
                    warn!(
                        recipient = recipient_id,
                        "published key belongs to another device; confessions will not decrypt here"
                    );
                    report.device_key_differs = true;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_sender_is_anonymous() {
        assert_eq!(sender_or_anonymous(None), ANONYMOUS_SENDER);
        assert_eq!(sender_or_anonymous(Some("   ")), ANONYMOUS_SENDER);
        assert_eq!(sender_or_anonymous(Some("  Sam ")), "Sam");
    }

    #[test]
    fn submit_rejects_malformed_recipient_key() {
        let err = Mailbox::submit("nope", "hi", None, Utc::now()).unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }
}
