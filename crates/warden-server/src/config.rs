//! Command-line and `WARDEN_*` environment configuration.

use std::fmt;
use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;
use thiserror::Error;
use warden_auth::AuthConfig;
use warden_db::DbConfig;

pub const ARG_DB_URL: &str = "db-url";
pub const ARG_DB_NAMESPACE: &str = "db-namespace";
pub const ARG_DB_DATABASE: &str = "db-database";
pub const ARG_DB_USER: &str = "db-user";
pub const ARG_DB_PASSWORD: &str = "db-password";
pub const ARG_SESSION_LIFETIME_SECS: &str = "session-lifetime-secs";
pub const ARG_TOKEN_ISSUER: &str = "token-issuer";
pub const ARG_PASSWORD_PEPPER: &str = "password-pepper";
pub const ARG_SIGNING_KEY: &str = "signing-key";
pub const ARG_PURGE_INTERVAL_SECS: &str = "purge-interval-secs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required argument: --{0}")]
    Missing(&'static str),
}

#[must_use]
pub fn new() -> Command {
    Command::new("warden")
        .about("Credential verification and session authorization")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new(ARG_DB_URL)
                .long(ARG_DB_URL)
                .help("SurrealDB endpoint")
                .env("WARDEN_DB_URL"),
        )
        .arg(
            Arg::new(ARG_DB_NAMESPACE)
                .long(ARG_DB_NAMESPACE)
                .env("WARDEN_DB_NAMESPACE"),
        )
        .arg(
            Arg::new(ARG_DB_DATABASE)
                .long(ARG_DB_DATABASE)
                .env("WARDEN_DB_DATABASE"),
        )
        .arg(
            Arg::new(ARG_DB_USER)
                .long(ARG_DB_USER)
                .env("WARDEN_DB_USER"),
        )
        .arg(
            Arg::new(ARG_DB_PASSWORD)
                .long(ARG_DB_PASSWORD)
                .env("WARDEN_DB_PASSWORD")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SESSION_LIFETIME_SECS)
                .long(ARG_SESSION_LIFETIME_SECS)
                .help("How long a login session stays valid, in seconds")
                .env("WARDEN_SESSION_LIFETIME_SECS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new(ARG_TOKEN_ISSUER)
                .long(ARG_TOKEN_ISSUER)
                .help("Issuer claim written into session tokens")
                .env("WARDEN_TOKEN_ISSUER"),
        )
        .arg(
            Arg::new(ARG_PASSWORD_PEPPER)
                .long(ARG_PASSWORD_PEPPER)
                .help("Optional pepper mixed into every password hash")
                .env("WARDEN_PASSWORD_PEPPER")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_SIGNING_KEY)
                .long(ARG_SIGNING_KEY)
                .help("Session token signing key")
                .env("WARDEN_SIGNING_KEY")
                .hide_env_values(true)
                .required(true)
                .value_parser(NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new(ARG_PURGE_INTERVAL_SECS)
                .long(ARG_PURGE_INTERVAL_SECS)
                .help("Seconds between expired session sweeps")
                .env("WARDEN_PURGE_INTERVAL_SECS")
                .default_value("3600")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

/// Everything the server needs to wire its collaborators.
pub struct ServerConfig {
    pub db: DbConfig,
    pub auth: AuthConfig,
    pub signing_key: SecretString,
    pub purge_interval: Duration,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("db", &self.db)
            .field("auth", &self.auth)
            .field("signing_key", &"***")
            .field("purge_interval", &self.purge_interval)
            .finish()
    }
}

impl ServerConfig {
    /// Build from matches produced by [`new`]. Settings left unset fall
    /// back to the `DbConfig` and `AuthConfig` defaults.
    ///
    /// # Errors
    /// Returns an error if a required argument is absent.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let db_defaults = DbConfig::default();
        let db = DbConfig {
            url: string(matches, ARG_DB_URL).unwrap_or(db_defaults.url),
            namespace: string(matches, ARG_DB_NAMESPACE).unwrap_or(db_defaults.namespace),
            database: string(matches, ARG_DB_DATABASE).unwrap_or(db_defaults.database),
            username: string(matches, ARG_DB_USER).unwrap_or(db_defaults.username),
            password: string(matches, ARG_DB_PASSWORD).unwrap_or(db_defaults.password),
        };

        let auth_defaults = AuthConfig::default();
        let auth = AuthConfig {
            session_lifetime_secs: number(matches, ARG_SESSION_LIFETIME_SECS)
                .unwrap_or(auth_defaults.session_lifetime_secs),
            token_issuer: string(matches, ARG_TOKEN_ISSUER).unwrap_or(auth_defaults.token_issuer),
            pepper: string(matches, ARG_PASSWORD_PEPPER),
            ..auth_defaults
        };

        let signing_key = string(matches, ARG_SIGNING_KEY)
            .map(SecretString::from)
            .ok_or(ConfigError::Missing(ARG_SIGNING_KEY))?;
        let purge_interval = number(matches, ARG_PURGE_INTERVAL_SECS)
            .map(Duration::from_secs)
            .ok_or(ConfigError::Missing(ARG_PURGE_INTERVAL_SECS))?;

        Ok(Self {
            db,
            auth,
            signing_key,
            purge_interval,
        })
    }
}

fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches.get_one::<String>(id).cloned()
}

fn number(matches: &ArgMatches, id: &str) -> Option<u64> {
    matches.get_one::<u64>(id).copied()
}
