//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    middleware,
    routing::get,
    Router,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::cron_auth_middleware;
use crate::server::routes::{health_handler, poll_comments_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router
///
/// `cron_secret` guards the sweep endpoint only; `/health` stays open.
pub fn build_app(pool: PgPool, deps: Arc<ServerDeps>, cron_secret: Option<String>) -> Router {
    let app_state = AppState {
        db_pool: pool,
        deps,
    };

    let secret: Option<Arc<str>> = cron_secret.map(Arc::from);
    let cron_routes = Router::new()
        .route(
            "/cron/poll-comments",
            get(poll_comments_handler).post(poll_comments_handler),
        )
        .route_layer(middleware::from_fn(move |req, next| {
            cron_auth_middleware(secret.clone(), req, next)
        }));

    Router::new()
        .route("/health", get(health_handler))
        .merge(cron_routes)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
}
