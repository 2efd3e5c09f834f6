use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Malformed key material: {0}")]
    Encoding(String),

    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("Content key unwrap failed (private key does not match the recipient key)")]
    KeyMismatch,

    #[error("Envelope failed authentication: tampered or corrupted")]
    TamperOrCorruption,

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("Content key wrap failed: {0}")]
    KeyWrap(String),

    #[error("Decrypted message is not valid UTF-8")]
    PlaintextEncoding(#[from] std::string::FromUtf8Error),
}
