mod accounts;
mod assessments;
mod careers;
mod config;
mod db;
mod errors;
mod extract;
mod models;
mod roadmaps;
mod routes;
mod state;
mod store;

#[cfg(test)]
mod test_support;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::accounts::manager::ensure_superuser;
use crate::accounts::tokens::TokenIssuer;
use crate::config::{Config, StorageBackend};
use crate::db::{create_pool, run_migrations};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting CareerPath API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;

    if let (Some(email), Some(password)) = (&config.superuser_email, &config.superuser_password) {
        let created = ensure_superuser(store.as_ref(), email, password)
            .await
            .map_err(|e| anyhow::anyhow!("superuser bootstrap failed: {e}"))?;
        if created {
            info!("Created superuser {email}");
        }
    }

    let tokens = TokenIssuer::from_config(&config);
    info!(
        "Token issuer ready (access {}m, refresh {}d)",
        config.access_token_ttl_minutes, config.refresh_token_ttl_days
    );

    // Build app state
    let state = AppState {
        store,
        tokens,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Connects and migrates Postgres, or falls back to process memory.
async fn build_store(config: &Config) -> Result<Arc<dyn Store>> {
    match config.storage_backend {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres backend")?;
            let pool = create_pool(url, config.database_max_connections).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
