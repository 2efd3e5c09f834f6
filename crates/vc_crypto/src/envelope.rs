//! Hybrid envelope encryption.
//!
//! A confession is sealed with a fresh AES-256-GCM content key; the content
//! key is wrapped with the recipient's RSA-OAEP public key.
//!
//! Wire format (ASCII, exactly one separator):
//!   base64(wrapped content key, 256 bytes) "." base64(iv || ciphertext+tag)

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::aead;
use crate::error::CryptoError;
use crate::keys::{PrivateKey, PublicKey, WRAPPED_KEY_LEN};

pub const SEPARATOR: char = '.';

/// One encrypted confession in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Envelope(String);

impl Envelope {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Split and base64-decode both segments.
    /// Returns `(wrapped content key, iv || ciphertext+tag)`.
    pub fn decode(&self) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
        let mut parts = self.0.split(SEPARATOR);
        let (wrapped_b64, payload_b64) = match (parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(b), None) if !a.is_empty() && !b.is_empty() => (a, b),
            _ => {
                return Err(CryptoError::MalformedEnvelope(
                    "expected exactly two non-empty segments separated by '.'".into(),
                ))
            }
        };
        let wrapped = STANDARD
            .decode(wrapped_b64)
            .map_err(|e| CryptoError::MalformedEnvelope(format!("key segment: {e}")))?;
        let payload = STANDARD
            .decode(payload_b64)
            .map_err(|e| CryptoError::MalformedEnvelope(format!("payload segment: {e}")))?;
        Ok((wrapped, payload))
    }

    pub fn encode(wrapped_key: &[u8], payload: &[u8]) -> Self {
        Self(format!(
            "{}{SEPARATOR}{}",
            STANDARD.encode(wrapped_key),
            STANDARD.encode(payload)
        ))
    }
}

impl From<String> for Envelope {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Envelope {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stateless hybrid cipher.
pub struct EnvelopeCipher;

impl EnvelopeCipher {
    /// Seal `plaintext` for the holder of `public_key`.
    pub fn encrypt(public_key: &PublicKey, plaintext: &str) -> Result<Envelope, CryptoError> {
        let content_key = aead::generate_content_key();
        let payload = aead::encrypt(&content_key, plaintext.as_bytes())?;
        let wrapped = public_key.wrap_content_key(&content_key)?;
        trace!(
            plaintext_len = plaintext.len(),
            payload_len = payload.len(),
            "sealed envelope"
        );
        Ok(Envelope::encode(&wrapped, &payload))
    }

    /// Seal for a recipient whose key is still in its published SPKI form.
    pub fn encrypt_for(public_key_spki_b64: &str, plaintext: &str) -> Result<Envelope, CryptoError> {
        let public_key = PublicKey::from_spki_b64(public_key_spki_b64)?;
        Self::encrypt(&public_key, plaintext)
    }

    /// Open an envelope.  Fails fast; never returns partial plaintext.
    pub fn decrypt(private_key: &PrivateKey, envelope: &Envelope) -> Result<String, CryptoError> {
        let (wrapped, payload) = envelope.decode()?;
        if wrapped.len() != WRAPPED_KEY_LEN {
            return Err(CryptoError::MalformedEnvelope(format!(
                "wrapped key is {} bytes, expected {WRAPPED_KEY_LEN}",
                wrapped.len()
            )));
        }
        let content_key = private_key.unwrap_content_key(&wrapped)?;
        let plaintext = aead::decrypt(&content_key, &payload)?;
        Ok(String::from_utf8(plaintext.to_vec())?)
    }
}
