//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - Host-facing routes that drive the storage adapter
//! - The adapter's `serve` strategy as middleware
//! - Error responses

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use ghost_qiniu_core::storage::QiniuStorage;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Qiniu storage adapter.
    pub storage: Arc<QiniuStorage>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .nest("/content/images", routes::content::routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
