//! Middleware implementing the adapter's `serve` strategy.

use axum::{Router, extract::Request, middleware::Next, response::Response};
use ghost_qiniu_core::storage::Serve;

/// Hands the request to the next handler without touching it.
///
/// Stored files live on the bucket's public domain, so there is nothing to
/// serve locally.
pub async fn pass_through(request: Request, next: Next) -> Response {
    next.run(request).await
}

/// Wrap `router` with the middleware for `serve`.
pub fn serve_layer<S>(serve: Serve, router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    match serve {
        Serve::PassThrough => router.layer(axum::middleware::from_fn(pass_through)),
    }
}
