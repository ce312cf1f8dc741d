//! Authentication service: registration, login, logout and account
//! deletion.
//!
//! Session issuance lives in [`crate::issuer`] and token authorization in
//! [`crate::authorizer`]; both are further `impl` blocks on
//! [`AuthService`].

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::credential::CredentialRecord;
use warden_core::repository::CredentialStore;
use warden_core::secret::SecretProvider;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password::PasswordHasher;

/// Salt used for the decoy derivation when an identity does not exist.
const DECOY_SALT: [u8; 16] = [0u8; 16];

/// Successful login result.
pub struct LoginOutput {
    /// Signed session token to hand back to the caller.
    pub token: String,
    /// When the server-side session stops being accepted.
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for LoginOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginOutput")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authentication service.
///
/// Generic over the credential store and secret provider so that the
/// auth layer has no dependency on the database crate. Holds no mutable
/// state of its own; every operation goes through the store.
pub struct AuthService<S: CredentialStore, P: SecretProvider> {
    pub(crate) store: S,
    pub(crate) secrets: P,
    pub(crate) hasher: PasswordHasher,
    pub(crate) session_lifetime: Duration,
    pub(crate) config: AuthConfig,
}

impl<S: CredentialStore, P: SecretProvider> AuthService<S, P> {
    pub fn new(store: S, secrets: P, config: AuthConfig) -> WardenResult<Self> {
        let hasher = PasswordHasher::new(&config)?;
        let session_lifetime = config.session_lifetime()?;
        Ok(Self {
            store,
            secrets,
            hasher,
            session_lifetime,
            config,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Create a credential for a new identity with no active session.
    pub async fn register(&self, identity: &str, password: &str) -> WardenResult<()> {
        let identity = validate_input(identity, password)?;

        if self.store.get(identity).await?.is_some() {
            warn!(identity, "Registration rejected: identity exists");
            return Err(WardenError::DuplicateIdentity);
        }

        let salt = self.hasher.generate_salt()?;
        let password_hash = self.hasher.hash(password, &salt)?;

        // `create` reports DuplicateIdentity for a concurrent registration
        // that committed after the lookup above, whether the store saw a
        // unique-key error or a write conflict.
        self.store
            .create(CredentialRecord::new(identity, password_hash, salt))
            .await?;

        info!(identity, "Identity registered");
        Ok(())
    }

    /// Verify credentials and issue a new session, replacing any previous
    /// one for this identity.
    pub async fn login(&self, identity: &str, password: &str) -> WardenResult<LoginOutput> {
        let identity = presented_identity(identity, password)?;
        let record = self.verify_credentials(identity, password).await?;
        let output = self.issue_session(identity, &record.password_hash).await?;
        info!(identity, expires_at = %output.expires_at, "Login succeeded");
        Ok(output)
    }

    /// Clear the session binding. Logging out twice is not an error.
    pub async fn logout(&self, identity: &str) -> WardenResult<()> {
        let identity = identity.trim();
        self.store.clear_session(identity).await?;
        info!(identity, "Logged out");
        Ok(())
    }

    /// Re-verify credentials, then remove the record entirely.
    pub async fn delete_account(&self, identity: &str, password: &str) -> WardenResult<()> {
        let identity = presented_identity(identity, password)?;
        self.verify_credentials(identity, password).await?;
        self.store.delete(identity).await?;
        info!(identity, "Account deleted");
        Ok(())
    }

    /// Eagerly clear expired session bindings. Authorization already
    /// rejects them, so this only reclaims storage.
    pub async fn purge_expired_sessions(&self) -> WardenResult<u64> {
        let purged = self.store.purge_expired_sessions(Utc::now()).await?;
        if purged > 0 {
            info!(purged, "Purged expired sessions");
        }
        Ok(purged)
    }

    /// Look up `identity` and check `password`. Unknown identities and
    /// wrong passwords both yield `InvalidCredentials`, and both pay for
    /// one key derivation.
    async fn verify_credentials(
        &self,
        identity: &str,
        password: &str,
    ) -> WardenResult<CredentialRecord> {
        let Some(record) = self.store.get(identity).await? else {
            // Only the time spent matters; the digest is never compared.
            let _decoy = self.hasher.hash(password, &DECOY_SALT);
            warn!(identity, "Credential check failed");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !self
            .hasher
            .verify(password, &record.salt, &record.password_hash)?
        {
            warn!(identity, "Credential check failed");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(record)
    }
}

fn validate_input<'a>(identity: &'a str, password: &str) -> WardenResult<&'a str> {
    let identity = identity.trim();
    if identity.is_empty() {
        return Err(WardenError::Validation {
            message: "identity must not be empty".into(),
        });
    }
    if password.is_empty() {
        return Err(WardenError::Validation {
            message: "password must not be empty".into(),
        });
    }
    Ok(identity)
}

/// Input check for operations that verify existing credentials. Empty
/// input can never match a stored credential, so it is reported the same
/// way as a wrong password.
fn presented_identity<'a>(identity: &'a str, password: &str) -> WardenResult<&'a str> {
    validate_input(identity, password).map_err(|_| AuthError::InvalidCredentials.into())
}
