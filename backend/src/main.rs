//! Backend entry-point: loads settings, prepares storage and serves the API.

mod server;

use actix_web::cookie::SameSite;
use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use groups_backend::inbound::http::health::HealthState;
use groups_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, ServerSettings, create_server, seed_demo_roster};

fn to_io(err: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(err.to_string())
}

async fn connect(pool_config: PoolConfig) -> std::io::Result<DbPool> {
    let url = pool_config.database_url().to_owned();
    let applied = tokio::task::spawn_blocking(move || run_pending_migrations(&url))
        .await
        .map_err(to_io)?
        .map_err(to_io)?;
    info!(applied, "database migrations complete");
    DbPool::new(pool_config).await.map_err(to_io)
}

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

    let settings = ServerSettings::load_from_env().map_err(to_io)?;
    let bind_addr = settings.bind_addr().map_err(to_io)?;
    let key = settings.session_key().map_err(to_io)?;

    let mut config = ServerConfig::new(key, settings.cookie_secure(), SameSite::Lax, bind_addr);
    match settings.pool_config() {
        Some(pool_config) => config = config.with_db_pool(connect(pool_config).await?),
        None => warn!("no database URL configured; state is kept in memory"),
    }

    if settings.seed_demo_roster() {
        seed_demo_roster(&config, settings.demo_password()).await?;
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(%bind_addr, "server listening");
    let result = server.await;
    health_state.mark_draining();
    result
}
