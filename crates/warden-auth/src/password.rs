//! Salted password derivation and verification using Argon2id.
//!
//! Digests are raw 64-byte Argon2id outputs keyed by a per-credential
//! random salt. Derivation is deterministic for a given password, salt,
//! pepper and parameter set.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::TryRngCore;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Derived digest length in bytes (512 bits).
pub const DIGEST_LEN: usize = 64;

/// Shortest salt accepted by the configuration.
pub const MIN_SALT_LEN: usize = 16;

/// Derives and verifies salted password digests.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    salt_len: usize,
    pepper: Option<String>,
}

impl PasswordHasher {
    pub fn new(config: &AuthConfig) -> Result<Self, AuthError> {
        if config.salt_len < MIN_SALT_LEN {
            return Err(AuthError::Crypto(format!(
                "salt length {} is below the minimum of {MIN_SALT_LEN}",
                config.salt_len
            )));
        }
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            Some(DIGEST_LEN),
        )
        .map_err(|e| AuthError::Crypto(format!("argon2 params error: {e}")))?;

        Ok(Self {
            params,
            salt_len: config.salt_len,
            pepper: config.pepper.clone(),
        })
    }

    /// Derive the digest of `password` under `salt`.
    pub fn hash(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, AuthError> {
        let peppered: String;
        let input = match self.pepper.as_deref() {
            Some(p) => {
                peppered = format!("{p}{password}");
                peppered.as_bytes()
            }
            None => password.as_bytes(),
        };

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        let mut digest = vec![0u8; DIGEST_LEN];
        argon2
            .hash_password_into(input, salt, &mut digest)
            .map_err(|e| AuthError::Crypto(format!("password hash error: {e}")))?;
        Ok(digest)
    }

    /// Recompute the digest and compare it to `expected` in constant time.
    pub fn verify(&self, password: &str, salt: &[u8], expected: &[u8]) -> Result<bool, AuthError> {
        let actual = self.hash(password, salt)?;
        Ok(actual.as_slice().ct_eq(expected).into())
    }

    /// Fresh salt from the operating system CSPRNG.
    pub fn generate_salt(&self) -> Result<Vec<u8>, AuthError> {
        let mut salt = vec![0u8; self.salt_len];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| AuthError::Entropy(e.to_string()))?;
        Ok(salt)
    }
}
