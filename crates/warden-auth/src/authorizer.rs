//! Bearer token authorization.
//!
//! Checks run in a fixed order: token shape, then signature, then payload,
//! and only then the store. Garbage or forged tokens are rejected before
//! any store I/O, so the store cannot be used to enumerate identities.

use std::fmt;

use chrono::Utc;
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;
use tracing::debug;
use warden_core::error::WardenResult;
use warden_core::repository::CredentialStore;
use warden_core::secret::SecretProvider;

use crate::service::AuthService;
use crate::token::{self, TokenRejection};

/// Internal reason for a denial. For logs and tests only; callers at the
/// transport boundary should see an opaque deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MalformedToken,
    InvalidSignature,
    MalformedPayload,
    UnknownIdentity,
    NotLoggedIn,
    SessionMismatch,
    SessionExpired,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::MalformedToken => "malformed_token",
            DenyReason::InvalidSignature => "invalid_signature",
            DenyReason::MalformedPayload => "malformed_payload",
            DenyReason::UnknownIdentity => "unknown_identity",
            DenyReason::NotLoggedIn => "not_logged_in",
            DenyReason::SessionMismatch => "session_mismatch",
            DenyReason::SessionExpired => "session_expired",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Outcome of authorizing a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow { identity: String },
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    /// The authorized identity, if allowed.
    pub fn identity(&self) -> Option<&str> {
        match self {
            Decision::Allow { identity } => Some(identity),
            Decision::Deny(_) => None,
        }
    }
}

impl<S: CredentialStore, P: SecretProvider> AuthService<S, P> {
    /// Validate a presented bearer token against the stored session.
    ///
    /// Verification failures become `Ok(Decision::Deny(_))`. Store and
    /// secret provider failures are returned as `Err` and must not be
    /// treated as a denial. Never mutates state.
    pub async fn authorize(&self, bearer_token: &str) -> WardenResult<Decision> {
        let Some(raw) = token::parse_bearer(bearer_token, &self.config.bearer_scheme) else {
            return Ok(deny(DenyReason::MalformedToken));
        };

        let decoded = {
            let key = self.secrets.signing_key().await?;
            token::decode_session_token(raw, key.expose_secret(), &self.config)
        };
        let payload = match decoded {
            Ok(payload) => payload,
            Err(TokenRejection::InvalidSignature) => {
                return Ok(deny(DenyReason::InvalidSignature));
            }
            Err(TokenRejection::MalformedPayload) => {
                return Ok(deny(DenyReason::MalformedPayload));
            }
        };

        let Some(record) = self.store.get(&payload.identity).await? else {
            return Ok(deny(DenyReason::UnknownIdentity));
        };
        let Some(binding) = record.session else {
            return Ok(deny(DenyReason::NotLoggedIn));
        };

        let presented = token::fingerprint(payload.session_secret.as_bytes());
        let matches: bool = presented
            .as_bytes()
            .ct_eq(binding.secret_hash.as_bytes())
            .into();
        if !matches {
            return Ok(deny(DenyReason::SessionMismatch));
        }

        if binding.is_expired_at(Utc::now()) {
            return Ok(deny(DenyReason::SessionExpired));
        }

        debug!(identity = %payload.identity, "Authorization allowed");
        Ok(Decision::Allow {
            identity: payload.identity,
        })
    }
}

fn deny(reason: DenyReason) -> Decision {
    debug!(%reason, "Authorization denied");
    Decision::Deny(reason)
}
