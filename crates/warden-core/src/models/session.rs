//! Session binding domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-held proof that one session secret is currently valid for an
/// identity.
///
/// There is at most one binding per identity; every login replaces the
/// previous one, which is how earlier tokens get invalidated.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBinding {
    /// SHA-256 hex fingerprint of the session secret carried in the token.
    pub secret_hash: String,
    /// The session is valid strictly before this instant.
    pub expires_at: DateTime<Utc>,
}

impl SessionBinding {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for SessionBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBinding")
            .field("secret_hash", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
