//! Server Initialization
//!
//! This module handles the initialization and setup of the Axum HTTP
//! server: state creation, database loading, and route configuration.
//!
//! # Initialization Process
//!
//! 1. Create the realtime state (hub, rooms, presence, membership cache)
//! 2. Load the database pool (optional; the server runs degraded without)
//! 3. Create the push client
//! 4. Create and configure the router
//! 5. Start the periodic membership-cache eviction task

use axum::Router;

use crate::backend::notify::PushClient;
use crate::backend::realtime::RealtimeState;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_database;
use crate::backend::server::state::AppState;

/// Create and configure the Axum application
pub async fn create_app() -> Router<()> {
    tracing::info!("Initializing ripple backend server");

    let realtime = RealtimeState::new();
    let db_pool = load_database().await;
    let push = PushClient::from_env();

    let app_state = AppState {
        db_pool,
        realtime,
        push,
    };

    let app = create_router(app_state.clone());

    // Periodically drop expired membership-cache entries so a
    // long-running gateway does not accumulate dead keys
    let cache = app_state.realtime.membership_cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            cache.evict_expired();
            tracing::debug!("Evicted expired membership cache entries");
        }
    });

    tracing::info!("Router configured");

    app
}
