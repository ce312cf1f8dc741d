//! Session issuance.

use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::debug;
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::session::SessionBinding;
use warden_core::repository::CredentialStore;
use warden_core::secret::SecretProvider;

use crate::service::{AuthService, LoginOutput};
use crate::token;

impl<S: CredentialStore, P: SecretProvider> AuthService<S, P> {
    /// Mint a session for `identity` and return its signed token.
    ///
    /// The caller must already have verified the password;
    /// `verified_password_digest` is the stored digest it was checked
    /// against. The new binding unconditionally replaces any previous one,
    /// so every earlier token for this identity stops authorizing. The
    /// token is only returned once the binding write has succeeded.
    pub async fn issue_session(
        &self,
        identity: &str,
        verified_password_digest: &[u8],
    ) -> WardenResult<LoginOutput> {
        let session_secret = token::generate_session_secret()?;
        let expires_at = Utc::now()
            .checked_add_signed(self.session_lifetime)
            .ok_or_else(|| WardenError::Validation {
                message: "session expiry is out of range".into(),
            })?;

        let token = {
            let key = self.secrets.signing_key().await?;
            token::encode_session_token(
                identity,
                verified_password_digest,
                &session_secret,
                key.expose_secret(),
                &self.config,
            )?
        };

        self.store
            .set_session(
                identity,
                SessionBinding {
                    secret_hash: token::fingerprint(session_secret.as_bytes()),
                    expires_at,
                },
            )
            .await?;

        debug!(identity, %expires_at, "Session binding written");
        Ok(LoginOutput { token, expires_at })
    }
}
