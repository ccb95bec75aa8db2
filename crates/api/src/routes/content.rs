//! Stored file routes, answered through the adapter's `serve` strategy.

use axum::{
    Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use ghost_qiniu_core::storage::StorageAdapter;
use serde_json::json;

use crate::{AppState, middleware::serve_layer};

/// Creates the content routes wrapped in the adapter's serve middleware.
pub fn routes(state: &AppState) -> Router<AppState> {
    let router = Router::new().route("/{*path}", get(not_stored_locally));
    serve_layer(state.storage.serve(), router)
}

/// Reached once the serve middleware defers: nothing is stored locally.
async fn not_stored_locally(Path(path): Path<String>) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "NOT_FOUND",
            "message": format!("{path} is served from the storage domain")
        })),
    )
}
