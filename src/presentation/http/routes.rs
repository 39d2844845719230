//! Route Configuration
//!
//! Configures the HTTP routes served by the bootstrap layer.

use axum::{middleware, routing::get, Router};
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, SessionManagerLayer};

use super::handlers;
use crate::presentation::middleware::enforce_https;
use crate::startup::Server;

/// Create the main router
pub fn create_router(server: Server) -> Router {
    let router = Router::new()
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness));

    with_sessions(router, &server)
        // Redirect plain HTTP when the environment demands HTTPS
        .layer(middleware::from_fn_with_state(
            server.force_https,
            enforce_https,
        ))
        .with_state(server)
}

/// Wrap `router` in the Redis-backed session layer.
///
/// Handlers extract [`tower_sessions::Session`]; the record is only loaded
/// from Redis when a handler touches it.
pub fn with_sessions<S>(router: Router<S>, server: &Server) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let store = server.session_store.clone();
    let options = store.options().clone();
    let max_age = i64::try_from(options.max_age).unwrap_or(i64::MAX);

    let layer = SessionManagerLayer::new(store.clone())
        .with_name(options.cookie_name)
        .with_secure(options.secure)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(max_age)))
        .with_signed(store.signing_key().clone());

    router.layer(layer)
}
