//! Signed session token encoding and verification, plus session secret
//! generation.
//!
//! Tokens are HS512 JWTs keyed by the secret provider's signing key. They
//! carry no expiry of their own; the server-side session binding is
//! authoritative.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::TryRngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::AuthConfig;
use crate::error::AuthError;

const TOKEN_ALGORITHM: Algorithm = Algorithm::HS512;

/// Raw session secret length in bytes (256 bits).
const SESSION_SECRET_BYTES: usize = 32;

/// Claims written into every session token.
#[derive(Serialize)]
struct SessionTokenClaims<'a> {
    /// Subject: the identity.
    sub: &'a str,
    /// Fingerprint of the password digest at issuance.
    pwd: String,
    /// Session secret.
    sid: &'a str,
    iss: &'a str,
    iat: i64,
}

/// Claims as read back; every field is optional so that a missing one is
/// reported as a payload problem rather than a signature problem.
#[derive(Deserialize)]
struct PresentedClaims {
    sub: Option<String>,
    pwd: Option<String>,
    sid: Option<String>,
}

/// Verified contents of a session token.
pub struct TokenPayload {
    pub identity: String,
    pub password_fingerprint: String,
    pub session_secret: String,
}

impl fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPayload")
            .field("identity", &self.identity)
            .field("password_fingerprint", &"[REDACTED]")
            .field("session_secret", &"[REDACTED]")
            .finish()
    }
}

/// Why a presented token could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    /// Bad signature, unexpected algorithm, or an unreadable header.
    InvalidSignature,
    /// Signature is valid but the claims are incomplete or unreadable.
    MalformedPayload,
}

/// Strip the transport scheme (e.g. `Bearer `) and check the token has
/// the three base64url segments of a compact JWS. Returns `None` for
/// anything structurally malformed.
pub fn parse_bearer<'a>(raw: &'a str, scheme: &str) -> Option<&'a str> {
    let trimmed = raw.trim();
    let token = match trimmed.split_once(char::is_whitespace) {
        Some((label, rest)) if label.eq_ignore_ascii_case(scheme) => rest.trim(),
        Some(_) => return None,
        None => trimmed,
    };

    let mut segments = 0;
    for segment in token.split('.') {
        segments += 1;
        if segment.is_empty()
            || !segment
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return None;
        }
    }
    (segments == 3).then_some(token)
}

/// Sign a session token binding `identity` to a password digest and a
/// session secret.
pub fn encode_session_token(
    identity: &str,
    password_digest: &[u8],
    session_secret: &str,
    signing_key: &[u8],
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let claims = SessionTokenClaims {
        sub: identity,
        pwd: fingerprint(password_digest),
        sid: session_secret,
        iss: &config.token_issuer,
        iat: Utc::now().timestamp(),
    };

    let key = EncodingKey::from_secret(signing_key);
    jsonwebtoken::encode(&Header::new(TOKEN_ALGORITHM), &claims, &key)
        .map_err(|e| AuthError::TokenEncoding(e.to_string()))
}

/// Verify the signature of `token` and extract its payload.
///
/// The header is checked before anything else so that payload errors can
/// only be reported for tokens whose signature verified.
pub fn decode_session_token(
    token: &str,
    signing_key: &[u8],
    config: &AuthConfig,
) -> Result<TokenPayload, TokenRejection> {
    let header = jsonwebtoken::decode_header(token).map_err(|_| TokenRejection::InvalidSignature)?;
    if header.alg != TOKEN_ALGORITHM {
        return Err(TokenRejection::InvalidSignature);
    }

    let mut validation = Validation::new(TOKEN_ALGORITHM);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    validation.set_issuer(&[&config.token_issuer]);

    let key = DecodingKey::from_secret(signing_key);
    let claims = jsonwebtoken::decode::<PresentedClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) | ErrorKind::InvalidIssuer => {
                TokenRejection::MalformedPayload
            }
            _ => TokenRejection::InvalidSignature,
        })?;

    match (non_empty(claims.sub), non_empty(claims.pwd), non_empty(claims.sid)) {
        (Some(identity), Some(password_fingerprint), Some(session_secret)) => Ok(TokenPayload {
            identity,
            password_fingerprint,
            session_secret,
        }),
        _ => Err(TokenRejection::MalformedPayload),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Generate a session secret: 32 bytes from the OS CSPRNG, base64url
/// encoded without padding.
pub fn generate_session_secret() -> Result<String, AuthError> {
    let mut bytes = [0u8; SESSION_SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| AuthError::Entropy(e.to_string()))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// SHA-256 of `data`, hex-encoded.
///
/// Used for the session secret fingerprint kept in the store and for the
/// password digest fingerprint embedded in tokens.
pub fn fingerprint(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
