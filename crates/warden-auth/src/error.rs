//! Authentication error types.

use thiserror::Error;
use warden_core::error::WardenError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("entropy source failure: {0}")]
    Entropy(String),

    #[error("token encoding failed: {0}")]
    TokenEncoding(String),

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for WardenError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => WardenError::InvalidCredentials,
            AuthError::Entropy(_) | AuthError::TokenEncoding(_) | AuthError::Crypto(_) => {
                WardenError::Crypto(err.to_string())
            }
        }
    }
}
