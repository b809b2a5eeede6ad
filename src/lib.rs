//! FullCircle journaling backend: posting streaks, achievement badges and the yearly
//! recap slideshow, served over HTTP on top of a pluggable [`db::Store`].

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use clock::Clock;
use config::Config;
use db::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
}

pub fn app(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz));

    let protected_routes = Router::new()
        // Streaks
        .route("/api/me/streak", get(handlers::streaks::get_my_streak))
        // Badges
        .route("/api/badges", get(handlers::badges::list_catalog))
        .route("/api/me/badges", get(handlers::badges::list_my_badges))
        .route("/api/me/badges/check", post(handlers::badges::check_my_badges))
        // Year recap
        .route("/api/recap/:year", get(handlers::recap::get_recap))
        .route("/api/recap/:year/slides", get(handlers::recap::get_recap_slides))
        .route(
            "/api/recap/:year/slides/:index",
            get(handlers::recap::get_recap_slide),
        )
        .route("/api/recap/:year/share", get(handlers::recap::get_recap_share))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let mut origins: Vec<HeaderValue> = Vec::new();
    match state.config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => origins.push(origin),
        Err(_) => tracing::warn!(url = %state.config.frontend_url, "Ignoring invalid FRONTEND_URL"),
    }
    // In dev, also allow LAN access (e.g. testing from another device)
    if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
        for o in extra.split(',') {
            if let Ok(hv) = o.trim().parse::<HeaderValue>() {
                origins.push(hv);
            }
        }
    }

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
