use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use habitrewards_api::cache::spawn_cache_purge_worker;
use habitrewards_api::config::Config;
use habitrewards_api::db::{create_pool, PgSource};
use habitrewards_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "habitrewards_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        utc_offset_minutes = config.analytics.calendar.offset_minutes(),
        cache_ttl_secs = config.analytics.cache_ttl_secs,
        "Configuration loaded"
    );

    // Database
    let db = create_pool(&config.database_url, config.database_max_connections)
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("Failed to run database migrations")?;

    tracing::info!("Database migrations applied");

    let state = AppState::new(Arc::new(PgSource::new(db)), config.clone());

    spawn_cache_purge_worker(
        state.cache.clone(),
        Duration::from_secs(config.analytics.cache_ttl_secs.max(1) * 2),
    );

    let app = build_router(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
