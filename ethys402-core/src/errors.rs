/// Error types for ETHYS core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed agent identity fields (unknown kind, wrong address length, ...).
    #[error("Invalid agent identity: {0}")]
    InvalidIdentity(String),

    /// Malformed signing key.
    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    /// The signer refused or failed to produce a signature.
    #[error("Signing error: {0}")]
    SigningError(#[from] alloy_signer::Error),

    /// JSON serialization/deserialization errors.
    #[error("Serde JSON error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    /// UTF-8 decoding errors.
    #[error("UTF-8 decode error: {0}")]
    Utf8DecodeError(#[from] std::string::FromUtf8Error),
}

/// A specialized `Result` type for ETHYS core operations.
pub type Result<T> = std::result::Result<T, Error>;
