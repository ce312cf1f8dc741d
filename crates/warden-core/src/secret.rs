//! Signing key supply.

use secrecy::{ExposeSecret, SecretBox};

use crate::error::{WardenError, WardenResult};

/// Token signing key material. Redacted in `Debug` and zeroized on drop.
pub type SigningKey = SecretBox<[u8]>;

pub trait SecretProvider: Send + Sync {
    /// Fetch the current signing key. Called once per operation; callers
    /// drop the key as soon as the operation finishes.
    fn signing_key(&self) -> impl Future<Output = WardenResult<SigningKey>> + Send;
}

/// A provider holding a key loaded once at startup.
pub struct StaticSecretProvider {
    key: SigningKey,
}

impl StaticSecretProvider {
    pub fn new(key: impl Into<Vec<u8>>) -> WardenResult<Self> {
        let key: Vec<u8> = key.into();
        if key.is_empty() {
            return Err(WardenError::SecretProvider("signing key is empty".into()));
        }
        Ok(Self {
            key: SecretBox::new(key.into_boxed_slice()),
        })
    }
}

impl SecretProvider for StaticSecretProvider {
    async fn signing_key(&self) -> WardenResult<SigningKey> {
        Ok(SecretBox::new(Box::from(self.key.expose_secret())))
    }
}
