//! Application State Management
//!
//! This module defines the application state structure and implements the
//! `FromRef` traits for Axum state extraction.
//!
//! # Thread Safety
//!
//! All state is designed to be shared across handlers:
//! - The realtime state is a bundle of `Arc`-backed registries
//! - The broadcast sender inside it is thread-safe and cloneable
//! - The pool is `Option<PgPool>`: handlers answer 503 when the database
//!   is not configured

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::notify::PushClient;
use crate::backend::realtime::RealtimeState;

/// Application state shared by every handler and the gateway
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    ///
    /// `None` if the database is not configured (e.g. `DATABASE_URL` is
    /// not set). Handlers check for `None` before using the database.
    pub db_pool: Option<PgPool>,

    /// Realtime layer: broadcast hub, rooms, presence, membership cache
    pub realtime: RealtimeState,

    /// Push delivery client used by the notification dispatcher
    pub push: PushClient,
}

/// Allow handlers to extract `Option<PgPool>` directly
impl FromRef<AppState> for Option<PgPool> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

/// Allow handlers to extract the realtime state directly
impl FromRef<AppState> for RealtimeState {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.realtime.clone()
    }
}

/// Allow handlers to extract the push client directly
impl FromRef<AppState> for PushClient {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.push.clone()
    }
}
