use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("Confessions stay sealed until {unlock_at}")]
    Locked { unlock_at: DateTime<Utc> },

    #[error("No published key for recipient {0}")]
    RecipientNotFound(String),

    #[error("Confession message is empty")]
    EmptyMessage,

    #[error("Private key not found on this device; confessions cannot be decrypted")]
    KeyMaterialAbsent,

    #[error("Crypto error: {0}")]
    Crypto(#[from] vc_crypto::CryptoError),

    #[error("Store error: {0}")]
    Store(#[source] vc_store::StoreError),
}

impl From<vc_store::StoreError> for MailboxError {
    fn from(e: vc_store::StoreError) -> Self {
        match e {
            vc_store::StoreError::KeyMaterialAbsent => MailboxError::KeyMaterialAbsent,
            other => MailboxError::Store(other),
        }
    }
}
