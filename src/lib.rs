use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod analytics;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;

use cache::ReportCache;
use config::Config;
use db::AnalyticsSource;

#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn AnalyticsSource>,
    pub config: Arc<Config>,
    pub cache: ReportCache,
}

impl AppState {
    pub fn new(source: Arc<dyn AnalyticsSource>, config: Arc<Config>) -> Self {
        let ttl = std::time::Duration::from_secs(config.analytics.cache_ttl_secs);
        Self {
            source,
            config,
            cache: ReportCache::new(ttl),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        // Analytics
        .route("/api/analytics/daily", get(handlers::analytics::get_daily_stats))
        .route("/api/analytics/weekly", get(handlers::analytics::get_weekly_stats))
        .route("/api/analytics/streak", get(handlers::analytics::get_streak))
        .route(
            "/api/analytics/rewards",
            get(handlers::analytics::get_reward_overview),
        )
        .route("/api/analytics/dashboard", get(handlers::analytics::get_dashboard))
        .route("/api/analytics/compute", post(handlers::analytics::compute_report))
        .route("/api/analytics/refresh", post(handlers::analytics::refresh))
        // Progress views
        .route(
            "/api/rewards/progress",
            get(handlers::progress::get_reward_progress),
        )
        .route("/api/habits/today", get(handlers::progress::get_habits_today))
        .layer(middleware::from_fn(cache::conditional_get))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let mut origins: Vec<HeaderValue> = Vec::new();
    match config.frontend_url.parse::<HeaderValue>() {
        Ok(hv) => origins.push(hv),
        Err(_) => tracing::warn!(url = %config.frontend_url, "FRONTEND_URL is not a valid origin"),
    }
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::IF_NONE_MATCH,
        ])
        .expose_headers([header::ETAG])
        .allow_credentials(true)
}
