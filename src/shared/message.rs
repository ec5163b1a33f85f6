//! Message Models
//!
//! Represents messages and the hydrated shape returned to clients: sender
//! info, reply context, the current reaction set, and pin state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of message content
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Plain text message
    Text,
    /// Image attachment
    Image,
    /// Video attachment
    Video,
    /// Generic file attachment
    File,
    /// Voice note
    Voice,
    /// Animated GIF
    Gif,
    /// Sticker
    Sticker,
}

impl Default for MessageType {
    fn default() -> Self {
        MessageType::Text
    }
}

impl MessageType {
    /// Label stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Text => "text",
            MessageType::Image => "image",
            MessageType::Video => "video",
            MessageType::File => "file",
            MessageType::Voice => "voice",
            MessageType::Gif => "gif",
            MessageType::Sticker => "sticker",
        }
    }

    /// Parse a stored label; `None` for anything outside the fixed set
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(MessageType::Text),
            "image" => Some(MessageType::Image),
            "video" => Some(MessageType::Video),
            "file" => Some(MessageType::File),
            "voice" => Some(MessageType::Voice),
            "gif" => Some(MessageType::Gif),
            "sticker" => Some(MessageType::Sticker),
            _ => None,
        }
    }
}

/// Sender information embedded in a hydrated message.
///
/// Absent when the author was removed after posting; clients render an
/// anonymous sender instead of failing the read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SenderInfo {
    /// Sender's user ID
    pub id: Uuid,
    /// Sender's unique handle
    pub username: String,
    /// Display name, if set
    pub display_name: Option<String>,
    /// Avatar URL, if set
    pub avatar_url: Option<String>,
}

impl SenderInfo {
    /// Name to show in notification titles and reply previews
    pub fn visible_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// Reply context rendered inline with a message.
///
/// Built from the replied-to message's original content; still renders when
/// that message has since been soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyPreview {
    /// The replied-to message
    pub message_id: Uuid,
    /// Snippet of the original content
    pub content: Option<String>,
    /// Name of the original sender; `None` when the author was removed
    pub sender_name: Option<String>,
    /// Whether the replied-to message is soft-deleted
    pub deleted: bool,
}

/// One emoji's reactions on a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReactionGroup {
    /// The emoji
    pub emoji: String,
    /// Users who applied it
    pub user_ids: Vec<Uuid>,
}

/// Fully hydrated message shape as returned over HTTP and broadcast to rooms
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageView {
    /// Unique message ID
    pub id: Uuid,
    /// Chat this message belongs to
    pub chat_id: Uuid,
    /// Sender info; `None` renders as an anonymous sender
    pub sender: Option<SenderInfo>,
    /// Content; omitted once the message is soft-deleted
    pub content: Option<String>,
    /// Type of content
    pub message_type: MessageType,
    /// Structured metadata blob (dimensions, durations, upload refs, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    /// Reply context, when this message replies to another
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyPreview>,
    /// Current reaction set, grouped by emoji
    pub reactions: Vec<ReactionGroup>,
    /// Whether the message is currently pinned
    pub pinned: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last edit timestamp
    pub edited_at: Option<DateTime<Utc>>,
    /// Soft-delete timestamp; terminal once set
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_labels() {
        for label in ["text", "image", "video", "file", "voice", "gif", "sticker"] {
            let parsed = MessageType::from_str(label).unwrap();
            assert_eq!(parsed.as_str(), label);
        }
    }

    #[test]
    fn test_message_type_rejects_unknown() {
        assert_eq!(MessageType::from_str("poll"), None);
        assert_eq!(MessageType::from_str(""), None);
    }

    #[test]
    fn test_visible_name_prefers_display_name() {
        let mut sender = SenderInfo {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            display_name: Some("Ada L.".to_string()),
            avatar_url: None,
        };
        assert_eq!(sender.visible_name(), "Ada L.");
        sender.display_name = None;
        assert_eq!(sender.visible_name(), "ada");
    }
}
