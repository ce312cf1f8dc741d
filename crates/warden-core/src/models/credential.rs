//! Credential record domain model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::session::SessionBinding;

/// The stored credential for one identity.
///
/// `password_hash` and `salt` are raw bytes; storage adapters decide how
/// to encode them at rest.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub identity: String,
    pub password_hash: Vec<u8>,
    pub salt: Vec<u8>,
    /// Present only while the identity is logged in.
    pub session: Option<SessionBinding>,
}

impl CredentialRecord {
    /// A freshly registered credential with no session.
    pub fn new(identity: impl Into<String>, password_hash: Vec<u8>, salt: Vec<u8>) -> Self {
        Self {
            identity: identity.into(),
            password_hash,
            salt,
            session: None,
        }
    }
}

impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("identity", &self.identity)
            .field("password_hash", &"[REDACTED]")
            .field("salt", &"[REDACTED]")
            .field("session", &self.session)
            .finish()
    }
}
