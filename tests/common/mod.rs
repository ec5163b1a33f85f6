//! Common test utilities and helpers
//!
//! This module provides shared utilities for the integration suites:
//! - Database test fixtures
//! - Authentication test helpers
//! - Custom assertion macros

pub mod assertions;
pub mod auth_helpers;
pub mod database;

use ripple::backend::notify::PushClient;
use ripple::backend::realtime::RealtimeState;
use ripple::backend::server::state::AppState;
use sqlx::PgPool;

/// Application state over a test database.
///
/// The push endpoint points at a closed port; fan-out is fire-and-forget
/// and its failures are logged only, so tests are unaffected.
pub fn test_state(pool: &PgPool) -> AppState {
    AppState {
        db_pool: Some(pool.clone()),
        realtime: RealtimeState::new(),
        push: PushClient::new("http://127.0.0.1:9/push"),
    }
}
