//! Backend entry-point: loads settings, opens the optional database pool and
//! runs the HTTP server.

use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use citizens_backend::inbound::http::health::HealthState;
use citizens_backend::outbound::persistence::{DbPool, PoolConfig};
use citizens_backend::server::{ServerConfig, create_server};
use citizens_backend::settings::AppSettings;

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
        AppSettings::load().map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let allow_dev_secret = cfg!(debug_assertions);
    if allow_dev_secret && settings.jwt_secret().is_none() {
        warn!("CITIZENS_JWT_SECRET unset; using the development signing secret");
    }
    let mut config = ServerConfig::from_settings(&settings, allow_dev_secret)?;

    if let Some(url) = settings.database_url.as_deref() {
        let pool_config = PoolConfig::new(url)
            .with_max_size(settings.db_max_connections())
            .with_connection_timeout(Duration::from_secs(10));
        let pool = DbPool::new(pool_config)
            .await
            .wrap_err("failed to connect to the database")?;
        info!("database pool ready");
        config = config.with_db_pool(pool);
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(citizens_backend::server::initialize_metrics());
    }

    let health_state = web::Data::new(HealthState::new());
    let bound = create_server(health_state.clone(), config)?;
    let result = bound.server.await;
    health_state.mark_unhealthy();
    result.wrap_err("server terminated abnormally")
}
