//! Authorization ordering and failure propagation, using hand-rolled
//! credential stores and secret providers.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::SecretBox;
use warden_auth::{AuthConfig, AuthService, Decision, DenyReason};
use warden_core::error::{WardenError, WardenResult};
use warden_core::models::credential::CredentialRecord;
use warden_core::models::session::SessionBinding;
use warden_core::repository::CredentialStore;
use warden_core::secret::{SecretProvider, SigningKey, StaticSecretProvider};

const KEY_A: &[u8] = b"signing-key-a-0123456789abcdef0123";
const KEY_B: &[u8] = b"signing-key-b-0123456789abcdef0123";

fn test_config() -> AuthConfig {
    AuthConfig {
        argon2_memory_kib: 1024,
        ..Default::default()
    }
}

/// In-memory store; optionally fails every session write.
#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
    fail_session_writes: AtomicBool,
}

impl CredentialStore for MemoryStore {
    async fn get(&self, identity: &str) -> WardenResult<Option<CredentialRecord>> {
        Ok(self.records.lock().unwrap().get(identity).cloned())
    }

    async fn create(&self, record: CredentialRecord) -> WardenResult<()> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&record.identity) {
            return Err(WardenError::DuplicateIdentity);
        }
        records.insert(record.identity.clone(), record);
        Ok(())
    }

    async fn put(&self, identity: &str, record: CredentialRecord) -> WardenResult<()> {
        self.records
            .lock()
            .unwrap()
            .insert(identity.to_string(), record);
        Ok(())
    }

    async fn set_session(&self, identity: &str, binding: SessionBinding) -> WardenResult<()> {
        if self.fail_session_writes.load(Ordering::SeqCst) {
            return Err(WardenError::Store("write rejected".into()));
        }
        match self.records.lock().unwrap().get_mut(identity) {
            Some(record) => {
                record.session = Some(binding);
                Ok(())
            }
            None => Err(WardenError::Store("record vanished".into())),
        }
    }

    async fn clear_session(&self, identity: &str) -> WardenResult<()> {
        if let Some(record) = self.records.lock().unwrap().get_mut(identity) {
            record.session = None;
        }
        Ok(())
    }

    async fn delete(&self, identity: &str) -> WardenResult<()> {
        self.records.lock().unwrap().remove(identity);
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> WardenResult<u64> {
        let mut purged = 0;
        for record in self.records.lock().unwrap().values_mut() {
            if record.session.as_ref().is_some_and(|s| s.is_expired_at(now)) {
                record.session = None;
                purged += 1;
            }
        }
        Ok(purged)
    }
}

/// Panics on any access: proves a code path never reaches the store.
struct PanickingStore;

impl CredentialStore for PanickingStore {
    async fn get(&self, _: &str) -> WardenResult<Option<CredentialRecord>> {
        panic!("store must not be queried")
    }
    async fn create(&self, _: CredentialRecord) -> WardenResult<()> {
        panic!("store must not be queried")
    }
    async fn put(&self, _: &str, _: CredentialRecord) -> WardenResult<()> {
        panic!("store must not be queried")
    }
    async fn set_session(&self, _: &str, _: SessionBinding) -> WardenResult<()> {
        panic!("store must not be queried")
    }
    async fn clear_session(&self, _: &str) -> WardenResult<()> {
        panic!("store must not be queried")
    }
    async fn delete(&self, _: &str) -> WardenResult<()> {
        panic!("store must not be queried")
    }
    async fn purge_expired_sessions(&self, _: DateTime<Utc>) -> WardenResult<u64> {
        panic!("store must not be queried")
    }
}

/// Every call fails like an unreachable database.
struct UnavailableStore;

impl CredentialStore for UnavailableStore {
    async fn get(&self, _: &str) -> WardenResult<Option<CredentialRecord>> {
        Err(WardenError::Store("connection refused".into()))
    }
    async fn create(&self, _: CredentialRecord) -> WardenResult<()> {
        Err(WardenError::Store("connection refused".into()))
    }
    async fn put(&self, _: &str, _: CredentialRecord) -> WardenResult<()> {
        Err(WardenError::Store("connection refused".into()))
    }
    async fn set_session(&self, _: &str, _: SessionBinding) -> WardenResult<()> {
        Err(WardenError::Store("connection refused".into()))
    }
    async fn clear_session(&self, _: &str) -> WardenResult<()> {
        Err(WardenError::Store("connection refused".into()))
    }
    async fn delete(&self, _: &str) -> WardenResult<()> {
        Err(WardenError::Store("connection refused".into()))
    }
    async fn purge_expired_sessions(&self, _: DateTime<Utc>) -> WardenResult<u64> {
        Err(WardenError::Store("connection refused".into()))
    }
}

/// Secret provider whose backend is down.
struct UnavailableSecrets;

impl SecretProvider for UnavailableSecrets {
    async fn signing_key(&self) -> WardenResult<SigningKey> {
        Err(WardenError::SecretProvider("parameter store timeout".into()))
    }
}

/// Provider that always hands out one fixed key.
struct FixedKey(&'static [u8]);

impl SecretProvider for FixedKey {
    async fn signing_key(&self) -> WardenResult<SigningKey> {
        Ok(SecretBox::new(Box::from(self.0)))
    }
}

fn service<S: CredentialStore, P: SecretProvider>(store: S, secrets: P) -> AuthService<S, P> {
    AuthService::new(store, secrets, test_config()).unwrap()
}

/// Register and log in on a memory store signed with `key`, returning the
/// token.
async fn issued_token(key: &'static [u8]) -> String {
    let svc = service(MemoryStore::default(), FixedKey(key));
    svc.register("a@x.com", "p1").await.unwrap();
    svc.login("a@x.com", "p1").await.unwrap().token
}

fn sign_claims(claims: serde_json::Value, key: &[u8]) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(key),
    )
    .unwrap()
}

#[tokio::test]
async fn foreign_key_is_rejected_before_store_access() {
    let token = issued_token(KEY_A).await;
    let svc = service(PanickingStore, FixedKey(KEY_B));

    assert_eq!(
        svc.authorize(&token).await.unwrap(),
        Decision::Deny(DenyReason::InvalidSignature)
    );
}

#[tokio::test]
async fn malformed_token_is_rejected_before_store_access() {
    let svc = service(PanickingStore, FixedKey(KEY_A));
    assert_eq!(
        svc.authorize("Bearer garbage").await.unwrap(),
        Decision::Deny(DenyReason::MalformedToken)
    );
}

#[tokio::test]
async fn incomplete_payload_is_rejected_before_store_access() {
    let svc = service(PanickingStore, FixedKey(KEY_A));
    let token = sign_claims(
        serde_json::json!({"sub": "a@x.com", "pwd": "abc", "iss": "warden"}),
        KEY_A,
    );

    assert_eq!(
        svc.authorize(&token).await.unwrap(),
        Decision::Deny(DenyReason::MalformedPayload)
    );
}

#[tokio::test]
async fn unknown_identity_is_denied() {
    let svc = service(MemoryStore::default(), FixedKey(KEY_A));
    let token = sign_claims(
        serde_json::json!({"sub": "ghost@x.com", "pwd": "abc", "sid": "s", "iss": "warden"}),
        KEY_A,
    );

    assert_eq!(
        svc.authorize(&token).await.unwrap(),
        Decision::Deny(DenyReason::UnknownIdentity)
    );
}

#[tokio::test]
async fn forged_session_secret_is_a_mismatch() {
    let svc = service(MemoryStore::default(), FixedKey(KEY_A));
    svc.register("a@x.com", "p1").await.unwrap();
    svc.login("a@x.com", "p1").await.unwrap();

    let token = sign_claims(
        serde_json::json!({"sub": "a@x.com", "pwd": "abc", "sid": "guessed", "iss": "warden"}),
        KEY_A,
    );
    assert_eq!(
        svc.authorize(&token).await.unwrap(),
        Decision::Deny(DenyReason::SessionMismatch)
    );
}

#[tokio::test]
async fn store_failure_during_authorize_is_an_error_not_a_denial() {
    let token = issued_token(KEY_A).await;
    let svc = service(UnavailableStore, FixedKey(KEY_A));

    let err = svc.authorize(&token).await.unwrap_err();
    assert!(matches!(err, WardenError::Store(_)));
    assert!(err.is_infrastructure());
}

#[tokio::test]
async fn store_failure_during_login_is_not_invalid_credentials() {
    let svc = service(UnavailableStore, FixedKey(KEY_A));
    let err = svc.login("a@x.com", "p1").await.unwrap_err();
    assert!(matches!(err, WardenError::Store(_)));

    let err = svc.register("a@x.com", "p1").await.unwrap_err();
    assert!(matches!(err, WardenError::Store(_)));

    let err = svc.logout("a@x.com").await.unwrap_err();
    assert!(matches!(err, WardenError::Store(_)));
}

#[tokio::test]
async fn failed_session_write_returns_no_token() {
    let store = MemoryStore::default();
    let svc = service(store, FixedKey(KEY_A));
    svc.register("a@x.com", "p1").await.unwrap();
    let earlier = svc.login("a@x.com", "p1").await.unwrap().token;

    svc.store().fail_session_writes.store(true, Ordering::SeqCst);
    let err = svc.login("a@x.com", "p1").await.unwrap_err();
    assert!(matches!(err, WardenError::Store(_)));

    // The previous binding is still the live one.
    assert!(svc.authorize(&earlier).await.unwrap().is_allowed());
}

#[tokio::test]
async fn secret_provider_failure_propagates() {
    let svc = service(MemoryStore::default(), UnavailableSecrets);
    svc.register("a@x.com", "p1").await.unwrap();

    let err = svc.login("a@x.com", "p1").await.unwrap_err();
    assert!(matches!(err, WardenError::SecretProvider(_)));
    let record = svc.store().get("a@x.com").await.unwrap().unwrap();
    assert!(record.session.is_none(), "no binding without a token");

    let token = issued_token(KEY_A).await;
    let err = svc.authorize(&token).await.unwrap_err();
    assert!(matches!(err, WardenError::SecretProvider(_)));
}

#[tokio::test]
async fn static_provider_round_trip() {
    let svc = service(
        MemoryStore::default(),
        StaticSecretProvider::new(KEY_A).unwrap(),
    );
    svc.register("a@x.com", "p1").await.unwrap();
    let token = svc.login("a@x.com", "p1").await.unwrap().token;
    assert_eq!(svc.authorize(&token).await.unwrap().identity(), Some("a@x.com"));

    // A service holding a different key rejects it.
    let other = service(PanickingStore, FixedKey(KEY_B));
    assert_eq!(
        other.authorize(&token).await.unwrap(),
        Decision::Deny(DenyReason::InvalidSignature)
    );
}
