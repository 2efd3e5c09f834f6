//! Recipient key material
//!
//! Each *recipient* has one RSA-2048 key pair used only to wrap per-message
//! content keys (RSA-OAEP, SHA-256 for both the label hash and MGF1).
//!
//! Wire encodings
//! --------------
//! - Public half: standard base64 of the SPKI DER document.  Published to the
//!   identity directory.
//! - Private half: standard base64 of the PKCS#8 DER document.  Stays in the
//!   device-local key slot unless explicitly exported.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::aead::KEY_LEN;
use crate::error::CryptoError;

pub const MODULUS_BITS: usize = 2048;
/// Size of a wrapped content key: one RSA block.
pub const WRAPPED_KEY_LEN: usize = MODULUS_BITS / 8;

fn oaep() -> Oaep {
    Oaep::new::<Sha256>()
}

// ── Public key ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

impl PublicKey {
    /// Parse a base64 SPKI record as published in the identity directory.
    pub fn from_spki_b64(s: &str) -> Result<Self, CryptoError> {
        let der = STANDARD
            .decode(s.trim())
            .map_err(|e| CryptoError::Encoding(format!("public key base64: {e}")))?;
        let key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| CryptoError::Encoding(format!("public key SPKI: {e}")))?;
        if key.size() != WRAPPED_KEY_LEN {
            return Err(CryptoError::Encoding(format!(
                "public key must be {MODULUS_BITS}-bit, got {}-bit",
                key.size() * 8
            )));
        }
        Ok(Self(key))
    }

    pub fn to_spki_b64(&self) -> Result<String, CryptoError> {
        let doc = self
            .0
            .to_public_key_der()
            .map_err(|e| CryptoError::Encoding(format!("public key SPKI: {e}")))?;
        Ok(STANDARD.encode(doc.as_bytes()))
    }

    /// RSA-OAEP encrypt a raw content key for this recipient.
    pub fn wrap_content_key(&self, key: &[u8; KEY_LEN]) -> Result<Vec<u8>, CryptoError> {
        self.0
            .encrypt(&mut OsRng, oaep(), key)
            .map_err(|e| CryptoError::KeyWrap(e.to_string()))
    }

    /// Human-readable fingerprint: SHA-256 of the SPKI DER, truncated to
    /// 16 bytes, hex-encoded in groups of 4.
    pub fn fingerprint(&self) -> Result<String, CryptoError> {
        let doc = self
            .0
            .to_public_key_der()
            .map_err(|e| CryptoError::Encoding(format!("public key SPKI: {e}")))?;
        let digest = Sha256::digest(doc.as_bytes());
        let hex = hex::encode(&digest[..16]);
        Ok(hex
            .chars()
            .collect::<Vec<_>>()
            .chunks(4)
            .map(|c| c.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join(" "))
    }
}

// ── Private key ───────────────────────────────────────────────────────────────

/// Recipient private key.  Read-only once imported or generated; the inner
/// `RsaPrivateKey` zeroizes its limbs on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(RsaPrivateKey);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

impl PrivateKey {
    /// Parse a base64 PKCS#8 record from the local key slot.
    pub fn from_pkcs8_b64(s: &str) -> Result<Self, CryptoError> {
        let der = Zeroizing::new(
            STANDARD
                .decode(s.trim())
                .map_err(|e| CryptoError::Encoding(format!("private key base64: {e}")))?,
        );
        let key = RsaPrivateKey::from_pkcs8_der(&der)
            .map_err(|e| CryptoError::Encoding(format!("private key PKCS#8: {e}")))?;
        if key.size() != WRAPPED_KEY_LEN {
            return Err(CryptoError::Encoding(format!(
                "private key must be {MODULUS_BITS}-bit, got {}-bit",
                key.size() * 8
            )));
        }
        Ok(Self(key))
    }

    pub fn to_pkcs8_b64(&self) -> Result<Zeroizing<String>, CryptoError> {
        let doc = self
            .0
            .to_pkcs8_der()
            .map_err(|e| CryptoError::Encoding(format!("private key PKCS#8: {e}")))?;
        Ok(Zeroizing::new(STANDARD.encode(doc.as_bytes())))
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// RSA-OAEP decrypt a wrapped content key.  Any failure here means the
    /// envelope was addressed to a different key pair.
    pub fn unwrap_content_key(
        &self,
        wrapped: &[u8],
    ) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        let raw = Zeroizing::new(
            self.0
                .decrypt(oaep(), wrapped)
                .map_err(|_| CryptoError::KeyMismatch)?,
        );
        if raw.len() != KEY_LEN {
            return Err(CryptoError::KeyMismatch);
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&raw);
        Ok(key)
    }
}

// ── Key pair ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

impl KeyPair {
    pub fn generate() -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut OsRng, MODULUS_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public_key = PublicKey(private.to_public_key());
        Ok(Self {
            public_key,
            private_key: PrivateKey(private),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    fn pair() -> &'static KeyPair {
        static PAIR: OnceLock<KeyPair> = OnceLock::new();
        PAIR.get_or_init(|| KeyPair::generate().unwrap())
    }

    #[test]
    fn spki_export_import() {
        let b64 = pair().public_key.to_spki_b64().unwrap();
        let parsed = PublicKey::from_spki_b64(&b64).unwrap();
        assert_eq!(parsed, pair().public_key);
    }

    #[test]
    fn pkcs8_export_import() {
        let b64 = pair().private_key.to_pkcs8_b64().unwrap();
        let parsed = PrivateKey::from_pkcs8_b64(&b64).unwrap();
        assert_eq!(parsed, pair().private_key);
        assert_eq!(parsed.public_key(), pair().public_key);
    }

    #[test]
    fn garbage_public_key_is_encoding_error() {
        assert!(matches!(
            PublicKey::from_spki_b64("not base64!"),
            Err(CryptoError::Encoding(_))
        ));
        assert!(matches!(
            PublicKey::from_spki_b64("AAAA"),
            Err(CryptoError::Encoding(_))
        ));
    }

    #[test]
    fn private_key_is_not_a_public_key() {
        let private_b64 = pair().private_key.to_pkcs8_b64().unwrap();
        assert!(matches!(
            PublicKey::from_spki_b64(&private_b64),
            Err(CryptoError::Encoding(_))
        ));
    }

    #[test]
    fn wrap_unwrap_content_key() {
        let key = [7u8; KEY_LEN];
        let wrapped = pair().public_key.wrap_content_key(&key).unwrap();
        assert_eq!(wrapped.len(), WRAPPED_KEY_LEN);
        let unwrapped = pair().private_key.unwrap_content_key(&wrapped).unwrap();
        assert_eq!(*unwrapped, key);
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = pair().public_key.fingerprint().unwrap();
        let b = pair().public_key.fingerprint().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.split(' ').count(), 8);
    }

    #[test]
    fn fingerprint_is_grouped_sha256_prefix() {
        let public = &pair().public_key;
        let der = public.0.to_public_key_der().unwrap();
        let expected = hex::encode(&Sha256::digest(der.as_bytes())[..16]);
        let fp = public.fingerprint().unwrap();
        assert_eq!(fp.replace(' ', ""), expected);
        assert!(fp.split(' ').all(|g| g.len() == 4
            && g.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())));
    }

    #[test]
    fn debug_redacts_private_key() {
        assert_eq!(format!("{:?}", pair().private_key), "PrivateKey(<redacted>)");
    }
}
