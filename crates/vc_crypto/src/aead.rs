//! Authenticated encryption for confession bodies
//!
//! Uses AES-256-GCM (96-bit nonce).
//! Key size: 32 bytes.  IV: 12 bytes (random).  Tag: 16 bytes.
//!
//! Ciphertext wire format:
//!   [ iv (12 bytes) | ciphertext + tag ]

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const KEY_LEN: usize = 32;
pub const IV_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Fresh random 256-bit content key.
pub fn generate_content_key() -> Zeroizing<[u8; KEY_LEN]> {
    let key = Aes256Gcm::generate_key(&mut OsRng);
    Zeroizing::new(key.into())
}

/// Encrypt `plaintext` under `key`, prepending a random 12-byte IV.
pub fn encrypt(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let iv = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&iv, plaintext)
        .map_err(|_| CryptoError::AeadEncrypt)?;

    let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt wire-format bytes (iv || ciphertext+tag).
pub fn decrypt(key: &[u8; KEY_LEN], data: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if data.len() < IV_LEN + TAG_LEN {
        return Err(CryptoError::MalformedEnvelope(format!(
            "payload is {} bytes, shorter than IV + tag",
            data.len()
        )));
    }
    let (iv, ct) = data.split_at(IV_LEN);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let plaintext = cipher
        .decrypt(Nonce::from_slice(iv), ct)
        .map_err(|_| CryptoError::TamperOrCorruption)?;

    Ok(Zeroizing::new(plaintext))
}
