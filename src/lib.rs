pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<auth::AuthService>,
}

/// Builds the full application router with state applied. Middleware layers
/// (tracing, compression, CORS) are added by the binary so tests can exercise
/// the bare router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::catalog::home))
        .route("/health", get(health_check))
        .route("/status", get(api_status))
        .nest("/products", handlers::catalog::products_routes())
        .nest("/categories", handlers::catalog::categories_routes())
        .nest("/cart", handlers::cart::cart_routes())
        .nest("/wishlist", handlers::wishlist::wishlist_routes())
        .nest("/orders", handlers::orders::orders_routes())
        .merge(handlers::checkout::checkout_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
}

/// Liveness plus a database ping.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "database": "connected" })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database": e.to_string() })),
        ),
    }
}

async fn api_status() -> impl IntoResponse {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
