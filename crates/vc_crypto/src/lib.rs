//! vc_crypto — Valentine Confessions envelope encryption
//!
//! # Design principles
//! - NO custom crypto; RSA-OAEP and AES-GCM come from the RustCrypto crates.
//! - One fresh content key and IV per message, never reused.
//! - Every failure mode is a distinct `CryptoError` variant; nothing is swallowed.
//!
//! # Module layout
//! - `aead`      — AES-256-GCM encrypt/decrypt helpers (IV-prefixed wire format)
//! - `keys`      — RSA-2048 key pair, SPKI / PKCS#8 base64 import and export
//! - `envelope`  — hybrid envelope cipher and the `A.B` wire format
//! - `error`     — unified error type

pub mod aead;
pub mod envelope;
pub mod error;
pub mod keys;

pub use envelope::{Envelope, EnvelopeCipher};
pub use error::CryptoError;
pub use keys::{KeyPair, PrivateKey, PublicKey};
