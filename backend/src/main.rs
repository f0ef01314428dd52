//! Backend entry-point: loads settings, prepares the database, and serves
//! the delivery zones API.

mod server;

use std::io;
use std::sync::Arc;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, fmt};

use delivery_zones::inbound::http::admin_auth::AdminCredentials;
use delivery_zones::inbound::http::health::HealthState;
use delivery_zones::outbound::directory::HttpPincodeDirectory;
use delivery_zones::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use delivery_zones::settings::DeliverySettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = DeliverySettings::load_from_iter(std::env::args_os()).map_err(|e| {
        error!(error = %e, "failed to load settings");
        io::Error::other(format!("failed to load settings: {e}"))
    })?;

    let database_url = settings
        .database_url()
        .ok_or_else(|| io::Error::other("DELIVERY_DATABASE_URL must be set"))?
        .to_owned();
    run_pending_migrations(&database_url)
        .await
        .map_err(|e| io::Error::other(format!("database migration failed: {e}")))?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|e| io::Error::other(format!("database pool setup failed: {e}")))?;

    let endpoint = settings
        .directory_url()
        .map_err(|e| io::Error::other(format!("invalid directory URL: {e}")))?;
    let directory = HttpPincodeDirectory::new(
        endpoint,
        settings.directory_api_key().map(str::to_owned),
        settings.directory_timeout(),
    )
    .map_err(|e| io::Error::other(format!("directory client setup failed: {e}")))?;

    let config = ServerConfig::new(settings.bind_addr(), pool, Arc::new(directory))
        .with_lookup(settings.directory_lookup())
        .with_cache_ttl(settings.cache_ttl())
        .with_admin(AdminCredentials::from_token(settings.admin_token()));

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
