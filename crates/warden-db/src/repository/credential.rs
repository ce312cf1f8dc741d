//! SurrealDB implementation of [`CredentialStore`].
//!
//! One `credential` record per identity, keyed by the identity itself, so
//! every operation touches exactly one record and relies on SurrealDB's
//! single-record atomicity.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use warden_core::error::WardenResult;
use warden_core::models::credential::CredentialRecord;
use warden_core::models::session::SessionBinding;
use warden_core::repository::CredentialStore;

use crate::error::DbError;

const ENTITY: &str = "credential";

/// DB-side row. Digest and salt are hex strings.
#[derive(SurrealValue)]
struct CredentialRow {
    identity: String,
    password_hash: String,
    salt: String,
    session_secret_hash: Option<String>,
    session_expires_at: Option<DateTime<Utc>>,
}

impl CredentialRow {
    fn try_into_record(self) -> Result<CredentialRecord, DbError> {
        let password_hash = hex::decode(&self.password_hash)
            .map_err(|e| DbError::Corrupt(format!("invalid password hash encoding: {e}")))?;
        let salt = hex::decode(&self.salt)
            .map_err(|e| DbError::Corrupt(format!("invalid salt encoding: {e}")))?;
        let session = match (self.session_secret_hash, self.session_expires_at) {
            (Some(secret_hash), Some(expires_at)) => Some(SessionBinding {
                secret_hash,
                expires_at,
            }),
            _ => None,
        };
        Ok(CredentialRecord {
            identity: self.identity,
            password_hash,
            salt,
            session,
        })
    }
}

/// Map a failed write, recognising unique-key conflicts.
fn classify_write_error(err: surrealdb::Error, identity: &str) -> DbError {
    let message = err.to_string();
    if message.contains("already exists") || message.contains("already contains") {
        already_exists(identity)
    } else {
        DbError::Query(message)
    }
}

fn already_exists(identity: &str) -> DbError {
    DbError::AlreadyExists {
        entity: ENTITY.into(),
        id: identity.to_string(),
    }
}

/// SurrealDB implementation of the credential store.
#[derive(Clone)]
pub struct SurrealCredentialStore<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCredentialStore<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CredentialStore for SurrealCredentialStore<C> {
    async fn get(&self, identity: &str) -> WardenResult<Option<CredentialRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('credential', $identity)")
            .bind(("identity", identity.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_record()?)),
            None => Ok(None),
        }
    }

    async fn create(&self, record: CredentialRecord) -> WardenResult<()> {
        let identity = record.identity.clone();
        let (session_secret_hash, session_expires_at) = split_session(record.session);

        let outcome = self
            .db
            .query(
                "CREATE type::record('credential', $identity) SET \
                 identity = $identity, \
                 password_hash = $password_hash, \
                 salt = $salt, \
                 session_secret_hash = $session_secret_hash, \
                 session_expires_at = $session_expires_at",
            )
            .bind(("identity", identity.clone()))
            .bind(("password_hash", hex::encode(&record.password_hash)))
            .bind(("salt", hex::encode(&record.salt)))
            .bind(("session_secret_hash", session_secret_hash))
            .bind(("session_expires_at", session_expires_at))
            .await
            .and_then(|response| response.check());

        let Err(err) = outcome else {
            return Ok(());
        };

        match classify_write_error(err, &identity) {
            duplicate @ DbError::AlreadyExists { .. } => Err(duplicate.into()),
            // A concurrent CREATE for the same identity loses with a write
            // conflict rather than a unique-key error. If the record is
            // there now, the other registration won.
            other => match self.get(&identity).await {
                Ok(Some(_)) => {
                    debug!(identity = %identity, "Create lost a concurrent write for an existing record");
                    Err(already_exists(&identity).into())
                }
                _ => Err(other.into()),
            },
        }
    }

    async fn put(&self, identity: &str, record: CredentialRecord) -> WardenResult<()> {
        let (session_secret_hash, session_expires_at) = split_session(record.session);

        let result = self
            .db
            .query(
                "UPSERT type::record('credential', $identity) SET \
                 identity = $identity, \
                 password_hash = $password_hash, \
                 salt = $salt, \
                 session_secret_hash = $session_secret_hash, \
                 session_expires_at = $session_expires_at, \
                 updated_at = time::now()",
            )
            .bind(("identity", identity.to_string()))
            .bind(("password_hash", hex::encode(&record.password_hash)))
            .bind(("salt", hex::encode(&record.salt)))
            .bind(("session_secret_hash", session_secret_hash))
            .bind(("session_expires_at", session_expires_at))
            .await
            .map_err(DbError::from)?;

        result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn set_session(&self, identity: &str, binding: SessionBinding) -> WardenResult<()> {
        let mut result = self
            .db
            .query(
                "UPDATE type::record('credential', $identity) SET \
                 session_secret_hash = $session_secret_hash, \
                 session_expires_at = $session_expires_at, \
                 updated_at = time::now()",
            )
            .bind(("identity", identity.to_string()))
            .bind(("session_secret_hash", binding.secret_hash))
            .bind(("session_expires_at", binding.expires_at))
            .await
            .map_err(DbError::from)?;

        // UPDATE on a missing record is a no-op; a session must never be
        // reported as persisted when nothing was written.
        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: ENTITY.into(),
                id: identity.to_string(),
            }
            .into());
        }

        Ok(())
    }

    async fn clear_session(&self, identity: &str) -> WardenResult<()> {
        self.db
            .query(
                "UPDATE type::record('credential', $identity) SET \
                 session_secret_hash = NONE, \
                 session_expires_at = NONE, \
                 updated_at = time::now()",
            )
            .bind(("identity", identity.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, identity: &str) -> WardenResult<()> {
        self.db
            .query("DELETE type::record('credential', $identity)")
            .bind(("identity", identity.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> WardenResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE credential SET \
                 session_secret_hash = NONE, \
                 session_expires_at = NONE, \
                 updated_at = time::now() \
                 WHERE session_expires_at != NONE AND session_expires_at <= $now",
            )
            .bind(("now", now))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }
}

fn split_session(session: Option<SessionBinding>) -> (Option<String>, Option<DateTime<Utc>>) {
    match session {
        Some(binding) => (Some(binding.secret_hash), Some(binding.expires_at)),
        None => (None, None),
    }
}
