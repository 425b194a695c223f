//! Backend entry-point: loads settings, prepares persistence and serves the
//! REST, WebSocket and documentation endpoints.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use mentorship::inbound::http::health::HealthState;
use mentorship::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, ServerSettings, ServiceOptions, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|err| std::io::Error::other(format!("load settings: {err}")))?;
    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(bind_addr, ServiceOptions::from_settings(&settings)?);

    if let Some(url) = settings.database_url() {
        run_pending_migrations(url)
            .await
            .map_err(|err| std::io::Error::other(format!("run migrations: {err}")))?;
        let pool = DbPool::new(PoolConfig::new(url))
            .await
            .map_err(|err| std::io::Error::other(format!("connect database: {err}")))?;
        config = config.with_db_pool(pool);
    }

    #[cfg(feature = "metrics")]
    {
        config = config.with_metrics(Some(server::make_metrics()?));
    }

    let health_state = web::Data::new(HealthState::new());
    info!(%bind_addr, "starting mentorship server");
    create_server(health_state, config)?.await
}
