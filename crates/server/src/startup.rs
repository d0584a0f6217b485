use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use chrono::Duration;
use configs::{AppConfig, AuthSettings, ServerConfig};
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::auth::{
    hasher::HashCost,
    repo::seaorm::SeaOrmAccountStore,
    repository::AccountStore,
    AuthConfig,
};

use crate::errors::StartupError;
use crate::routes::{self, auth::ServerState};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Map the `[auth]` config section onto the service's settings.
pub fn auth_config(s: &AuthSettings) -> AuthConfig {
    AuthConfig {
        jwt_secret: s.jwt_secret.clone(),
        token_ttl: Duration::days(s.token_ttl_days),
        hash_cost: HashCost {
            memory_kib: s.hash.memory_kib,
            iterations: s.hash.iterations,
            parallelism: s.hash.parallelism,
        },
    }
}

fn bind_addr(s: &ServerConfig) -> Result<SocketAddr, StartupError> {
    format!("{}:{}", s.host, s.port)
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {}:{}: {e}", s.host, s.port)))
}

/// Router over an arbitrary store; used by startup and by tests with the in-memory store.
pub fn build_app(store: Arc<dyn AccountStore>, cfg: AuthConfig) -> Result<Router, StartupError> {
    let state = ServerState::new(store, cfg).map_err(|e| StartupError::InvalidConfig(e.to_string()))?;
    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: connect, migrate, and serve with an already validated config.
pub async fn run_with_config(cfg: AppConfig) -> anyhow::Result<()> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    migration::Migrator::up(&db, None).await?;
    info!("migrations applied");

    let store: Arc<dyn AccountStore> = Arc::new(SeaOrmAccountStore::new(db));
    let app = build_app(store, auth_config(&cfg.auth))?;

    let addr = bind_addr(&cfg.server)?;
    info!(%addr, "starting account auth server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
