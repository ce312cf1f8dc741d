//! Warden Database: SurrealDB connection management and the
//! credential store implementation.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - The [`CredentialStore`](warden_core::repository::CredentialStore)
//!   implementation ([`repository::SurrealCredentialStore`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use schema::run_migrations;
