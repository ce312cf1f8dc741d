//! Warden Server: wires the credential store, secret provider and
//! authentication service, then keeps expired sessions purged until
//! shutdown.

mod config;

use secrecy::ExposeSecret;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use warden_auth::AuthService;
use warden_core::secret::StaticSecretProvider;
use warden_db::DbManager;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warden=info".parse()?))
        .json()
        .init();

    info!("Starting Warden...");

    let matches = config::new().get_matches();
    let config = ServerConfig::from_matches(&matches)?;
    let db = DbManager::connect(&config.db).await?;
    let store = db.credential_store();
    let secrets = StaticSecretProvider::new(config.signing_key.expose_secret().as_bytes())?;
    let service = AuthService::new(store, secrets, config.auth)?;

    info!(
        purge_interval_secs = config.purge_interval.as_secs(),
        "Warden ready"
    );

    let mut ticker = tokio::time::interval(config.purge_interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = service.purge_expired_sessions().await {
                    error!(error = %e, "Expired session purge failed");
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("Warden stopped.");
    Ok(())
}
