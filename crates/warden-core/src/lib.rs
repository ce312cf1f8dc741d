//! Warden Core: shared domain types, error taxonomy and the
//! collaborator traits the authentication layer depends on.

pub mod error;
pub mod models;
pub mod repository;
pub mod secret;
