//! Shared Module
//!
//! This module contains types shared between the HTTP handlers, the realtime
//! gateway, and the test suites. All types are designed for serialization
//! and transmission over HTTP or the WebSocket protocol.

/// Chat container model (direct / group / channel)
pub mod chat;

/// Community and membership models
pub mod community;

/// Realtime protocol frames (client and server events)
pub mod event;

/// Message models and hydrated views
pub mod message;

/// Re-export commonly used types for convenience
pub use chat::{Chat, ChatKind};
pub use community::{Community, CommunityMember};
pub use event::{ClientEvent, RoomEvent, Scope, ServerEvent};
pub use message::{MessageType, MessageView, ReactionGroup, ReplyPreview, SenderInfo};
