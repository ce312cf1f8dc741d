//! Domain models for Warden.

pub mod credential;
pub mod session;
