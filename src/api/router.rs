use axum::middleware;
use axum::routing::{any, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes, Bearer token required when API_TOKEN is set
    let protected = Router::new()
        // Trade feed
        .route("/api/trades", get(handlers::trades::list))
        .route("/api/feed/status", get(handlers::feed::status))
        .route("/api/feed/filter", post(handlers::feed::set_filter))
        .route("/api/feed/retry", post(handlers::feed::retry))
        // Events
        .route("/api/events", get(handlers::events::list))
        // Same-origin pass-through to the upstream hosts
        .route("/api/polymarket/*path", any(handlers::proxy::gamma))
        .route("/api/data/*path", any(handlers::proxy::data))
        // WebSocket
        .route("/ws", get(handlers::ws::handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
