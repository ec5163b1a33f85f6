//! Backend Module
//!
//! This module contains all server-side code for the ripple chat backend.
//! It provides an Axum HTTP server, a WebSocket realtime gateway, and
//! PostgreSQL persistence.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`server`** - Server initialization, application state, configuration
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`middleware`** - Bearer-token authentication middleware
//! - **`auth`** - JWT sessions, user persistence, signup/login handlers
//! - **`membership`** - Chat access decisions and the gateway's TTL cache
//! - **`messages`** - Message lifecycle engine, persistence, HTTP surface
//! - **`realtime`** - Broadcast hub, rooms, presence, WebSocket gateway
//! - **`notify`** - Push fan-out decisions and delivery
//! - **`chats`** - Direct/group chat CRUD and rosters
//! - **`communities`** - Communities, channels, ownership, invites
//! - **`friends`** - Friend requests
//! - **`error`** - API error taxonomy
//!
//! # Data Flow
//!
//! An HTTP write (send/edit/delete/react/read/pin) flows:
//! route handler -> membership check -> lifecycle engine -> durable write
//! -> room broadcast -> push fan-out to absent members.
//!
//! A socket-originated event flows: gateway -> membership check (cached)
//! -> room broadcast. The socket `send_message` echo does not persist;
//! the HTTP path is the authoritative write path.

pub mod auth;
pub mod chats;
pub mod communities;
pub mod error;
pub mod friends;
pub mod membership;
pub mod messages;
pub mod middleware;
pub mod notify;
pub mod realtime;
pub mod routes;
pub mod server;
