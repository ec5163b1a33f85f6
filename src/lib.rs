//! Ripple - Chat Backend
//!
//! Ripple is a chat application backend providing direct messages, group
//! chats, and Discord-style communities with channels, built on Axum and
//! PostgreSQL with a WebSocket realtime layer.
//!
//! # Overview
//!
//! This library provides:
//! - REST API for message lifecycle (send, edit, soft-delete, react, read, pin)
//! - Membership-based authorization for every chat operation
//! - WebSocket gateway with rooms, presence, and typing indicators
//! - Push notification fan-out to members absent from a room
//! - Communities with channels, invites, and ownership rules
//! - Friend requests that materialize into direct chats
//!
//! # Module Structure
//!
//! - **`shared`** - Wire-level types used by handlers, the gateway, and tests
//!   - Chat, message, and community models
//!   - Realtime event types (client and server frames)
//!
//! - **`backend`** - Server-side code
//!   - Axum HTTP server, routes, and middleware
//!   - Membership decisions and the gateway's authorization cache
//!   - Message lifecycle engine and persistence
//!   - WebSocket gateway, presence, room registry
//!   - Push notification dispatch

pub mod backend;
pub mod shared;
