//! Warden Auth: salted password hashing, session issuance and
//! server-validated token authorization.

pub mod authorizer;
pub mod config;
pub mod error;
pub mod issuer;
pub mod password;
pub mod service;
pub mod token;

pub use authorizer::{Decision, DenyReason};
pub use config::AuthConfig;
pub use error::AuthError;
pub use password::PasswordHasher;
pub use service::{AuthService, LoginOutput};
