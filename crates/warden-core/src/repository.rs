//! Credential store trait definition.
//!
//! The store is the only shared mutable state in Warden. Implementations
//! must make every single-record read and write atomic; nothing here
//! requires multi-record transactions.

use chrono::{DateTime, Utc};

use crate::error::WardenResult;
use crate::models::credential::CredentialRecord;
use crate::models::session::SessionBinding;

pub trait CredentialStore: Send + Sync {
    /// Fetch the record for `identity`. A missing record is `Ok(None)`;
    /// `Err` always means the store itself failed.
    fn get(
        &self,
        identity: &str,
    ) -> impl Future<Output = WardenResult<Option<CredentialRecord>>> + Send;

    /// Insert a new record. Fails with
    /// [`WardenError::DuplicateIdentity`](crate::error::WardenError::DuplicateIdentity)
    /// if the identity already exists.
    fn create(&self, record: CredentialRecord) -> impl Future<Output = WardenResult<()>> + Send;

    /// Insert or fully replace the record for `identity`.
    fn put(
        &self,
        identity: &str,
        record: CredentialRecord,
    ) -> impl Future<Output = WardenResult<()>> + Send;

    /// Replace the session binding of an existing record. Last write wins.
    fn set_session(
        &self,
        identity: &str,
        binding: SessionBinding,
    ) -> impl Future<Output = WardenResult<()>> + Send;

    /// Remove the session binding. Idempotent, and never creates a record.
    fn clear_session(&self, identity: &str) -> impl Future<Output = WardenResult<()>> + Send;

    /// Remove the record entirely. Idempotent.
    fn delete(&self, identity: &str) -> impl Future<Output = WardenResult<()>> + Send;

    /// Clear every binding that expired at or before `now`, returning how
    /// many were cleared.
    fn purge_expired_sessions(
        &self,
        now: DateTime<Utc>,
    ) -> impl Future<Output = WardenResult<u64>> + Send;
}
