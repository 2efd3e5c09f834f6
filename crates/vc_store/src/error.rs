use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialisation error: {0}")]
    Serialisation(#[from] serde_json::Error),

    #[error("OS keyring error: {0}")]
    Keyring(String),

    #[error("Crypto error: {0}")]
    Crypto(#[from] vc_crypto::CryptoError),

    #[error("No private key stored on this device")]
    KeyMaterialAbsent,
}
