//! Authentication configuration.

use std::fmt;

use chrono::Duration;
use warden_core::error::{WardenError, WardenResult};

/// Configuration for the authentication service.
#[derive(Clone)]
pub struct AuthConfig {
    /// Session lifetime in seconds (default: 7_776_000 = 90 days).
    pub session_lifetime_secs: u64,
    /// Token issuer (`iss` claim).
    pub token_issuer: String,
    /// Transport scheme label stripped from presented tokens.
    pub bearer_scheme: String,
    /// Salt length in bytes for newly registered credentials.
    pub salt_len: usize,
    /// Argon2id memory cost in KiB.
    pub argon2_memory_kib: u32,
    /// Argon2id iteration count.
    pub argon2_iterations: u32,
    /// Argon2id lanes.
    pub argon2_parallelism: u32,
    /// Optional pepper prepended to passwords before derivation.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_lifetime_secs: 7_776_000,
            token_issuer: "warden".into(),
            bearer_scheme: "Bearer".into(),
            salt_len: 16,
            // OWASP ASVS recommended: m=19456 (19 MiB), t=2, p=1
            argon2_memory_kib: 19_456,
            argon2_iterations: 2,
            argon2_parallelism: 1,
            pepper: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("session_lifetime_secs", &self.session_lifetime_secs)
            .field("token_issuer", &self.token_issuer)
            .field("bearer_scheme", &self.bearer_scheme)
            .field("salt_len", &self.salt_len)
            .field("argon2_memory_kib", &self.argon2_memory_kib)
            .field("argon2_iterations", &self.argon2_iterations)
            .field("argon2_parallelism", &self.argon2_parallelism)
            .field("pepper", &self.pepper.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthConfig {
    /// The session lifetime as a duration, rejecting values chrono cannot
    /// represent.
    pub fn session_lifetime(&self) -> WardenResult<Duration> {
        i64::try_from(self.session_lifetime_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| WardenError::Validation {
                message: format!(
                    "session lifetime of {} seconds is out of range",
                    self.session_lifetime_secs
                ),
            })
    }
}
