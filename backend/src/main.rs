//! Backend entry-point: loads settings, connects backing services and serves
//! the REST API.

mod server;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, create_server};
use shiptrack::domain::AccountServiceConfig;
use shiptrack::inbound::http::health::HealthState;
use shiptrack::outbound::cache::connect_redis;
use shiptrack::outbound::notify::HttpMailRelay;
use shiptrack::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use shiptrack::outbound::security::{BuildMode, key_fingerprint, signing_key_from_env};
use shiptrack::settings::AppSettings;

const MAIL_RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        AppSettings::load().map_err(|error| eyre!("failed to load configuration: {error}"))?;
    let config = build_server_config(&settings).await?;

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config).wrap_err("failed to start HTTP server")?;
    server.await.wrap_err("HTTP server stopped with an error")
}

async fn build_server_config(settings: &AppSettings) -> Result<ServerConfig> {
    let env = DefaultEnv::new();
    let signing_key = signing_key_from_env(&env, BuildMode::from_debug_assertions())
        .wrap_err("failed to load signing key")?;
    info!(fingerprint = %key_fingerprint(&signing_key), "signing key loaded");

    let accounts = AccountServiceConfig {
        public_base_url: settings.public_base_url()?,
        access_token_ttl: settings.access_token_ttl()?,
    };
    let mut config = ServerConfig::new(settings.bind_addr()?, signing_key, accounts)
        .with_queue_capacity(settings.notification_queue_capacity());

    if let Some(database_url) = settings.database_url.as_deref() {
        if settings.run_migrations() {
            let applied = run_pending_migrations(database_url).await?;
            info!(applied, "database migrations applied");
        }
        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
        )
        .await?;
        config = config.with_db_pool(pool);
    }

    if let Some(redis_url) = settings.redis_url.as_deref() {
        let pool = connect_redis(redis_url, settings.db_max_connections()).await?;
        config = config.with_redis_pool(pool);
    }

    if let Some(endpoint) = settings.mail_relay_url()? {
        info!(%endpoint, "delivering notifications through the mail relay");
        let relay = HttpMailRelay::new(endpoint, settings.mail_sender(), MAIL_RELAY_TIMEOUT)
            .wrap_err("failed to build mail relay client")?;
        config = config.with_mail_transport(Arc::new(relay));
    }

    Ok(config)
}
