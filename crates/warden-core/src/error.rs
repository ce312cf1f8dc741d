//! Error types for the Warden system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WardenError {
    /// Wrong password or unknown identity. The two cases are deliberately
    /// indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity is already registered")]
    DuplicateIdentity,

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Credential store error: {0}")]
    Store(String),

    #[error("Secret provider error: {0}")]
    SecretProvider(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),
}

impl WardenError {
    /// Whether this error stems from a collaborator or the runtime rather
    /// than from the caller's input. Transport layers map these to a
    /// server-side failure, never to a bad-credentials response.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            WardenError::Store(_) | WardenError::SecretProvider(_) | WardenError::Crypto(_)
        )
    }
}

pub type WardenResult<T> = Result<T, WardenError>;
