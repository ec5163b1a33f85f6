//! Router Configuration
//!
//! This module provides the main router creation function that combines
//! all route configurations into a single Axum router.
//!
//! # Route Groups
//!
//! 1. Public routes: signup, login, health, and the WebSocket gateway
//!    (which authenticates its own handshake token)
//! 2. Protected routes: everything else, behind the auth middleware

use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::backend::middleware::auth::auth_middleware;
use crate::backend::realtime::gateway::ws_handler;
use crate::backend::routes::api_routes::{protected_api_routes, public_api_routes};
use crate::backend::routes::message_routes::message_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let protected = message_routes()
        .merge(protected_api_routes())
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    let public = public_api_routes()
        .route("/ws", axum::routing::get(ws_handler))
        .route("/health", axum::routing::get(|| async { "ok" }));

    public
        .merge(protected)
        .fallback(|| async { "404 Not Found" })
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
