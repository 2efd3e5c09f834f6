//! Records owned by the external collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vc_crypto::Envelope;

/// Sender label used when a confession is submitted without a name.
pub const ANONYMOUS_SENDER: &str = "Anonymous";

/// One stored confession.  Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Confession {
    pub id: String,
    pub recipient_id: String,
    pub envelope: Envelope,
    #[serde(default = "anonymous")]
    pub sender_label: String,
    pub created_at: DateTime<Utc>,
}

fn anonymous() -> String {
    ANONYMOUS_SENDER.to_string()
}

/// Non-key profile fields published alongside a public key.  `None` fields
/// are left untouched by an upsert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

/// Directory entry for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    /// Base64 SPKI.
    pub public_key: String,
    #[serde(flatten)]
    pub display: DisplayMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: &str, public_key: &str, display: DisplayMetadata, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            public_key: public_key.to_string(),
            display,
            created_at: now,
            updated_at: now,
        }
    }

    /// Upsert: the key is replaced, display fields only where supplied.
    pub fn merge(&mut self, public_key: &str, display: DisplayMetadata, now: DateTime<Utc>) {
        self.public_key = public_key.to_string();
        if display.display_name.is_some() {
            self.display.display_name = display.display_name;
        }
        if display.photo_url.is_some() {
            self.display.photo_url = display.photo_url;
        }
        self.updated_at = now;
    }
}
