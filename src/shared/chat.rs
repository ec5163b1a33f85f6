//! Chat Container Model
//!
//! A chat is any container of messages: a direct conversation, a named
//! group, or a channel belonging to a community. The three kinds differ in
//! where membership lives: direct and group chats own an explicit roster,
//! while a channel inherits the roster of its parent community.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of a chat, carrying only the fields meaningful to it.
///
/// A channel has no roster of its own; membership questions are answered by
/// the parent community. Direct and group chats have no community; their
/// roster lives in `chat_members`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatKind {
    /// One-to-one conversation with an explicit two-person roster
    Direct,
    /// Named multi-person conversation with an explicit roster
    Group,
    /// Community channel; membership inherited from the community
    Channel {
        /// The community this channel belongs to
        community_id: Uuid,
    },
}

impl ChatKind {
    /// Kind label stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatKind::Direct => "direct",
            ChatKind::Group => "group",
            ChatKind::Channel { .. } => "channel",
        }
    }

    /// Reconstruct the kind from its stored label and community reference.
    ///
    /// Returns `None` when the pair violates the invariant that exactly
    /// channels carry a community reference.
    pub fn from_parts(kind: &str, community_id: Option<Uuid>) -> Option<Self> {
        match (kind, community_id) {
            ("direct", None) => Some(ChatKind::Direct),
            ("group", None) => Some(ChatKind::Group),
            ("channel", Some(community_id)) => Some(ChatKind::Channel { community_id }),
            _ => None,
        }
    }
}

/// A message container
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    /// Unique chat ID
    pub id: Uuid,
    /// Display name; `None` for direct chats
    pub name: Option<String>,
    /// Kind with its kind-specific fields
    #[serde(flatten)]
    pub kind: ChatKind,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// The community a channel belongs to, if this chat is a channel
    pub fn community_id(&self) -> Option<Uuid> {
        match self.kind {
            ChatKind::Channel { community_id } => Some(community_id),
            _ => None,
        }
    }
}

/// A roster row for a direct or group chat
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMember {
    /// Chat the membership belongs to
    pub chat_id: Uuid,
    /// The member
    pub user_id: Uuid,
    /// Per-chat nickname override
    pub nickname: Option<String>,
    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        let community_id = Uuid::new_v4();
        assert_eq!(ChatKind::from_parts("direct", None), Some(ChatKind::Direct));
        assert_eq!(ChatKind::from_parts("group", None), Some(ChatKind::Group));
        assert_eq!(
            ChatKind::from_parts("channel", Some(community_id)),
            Some(ChatKind::Channel { community_id })
        );
    }

    #[test]
    fn test_kind_rejects_inconsistent_rows() {
        // A channel without a community, or a roster chat with one, is
        // a corrupt row and must not decode.
        assert_eq!(ChatKind::from_parts("channel", None), None);
        assert_eq!(ChatKind::from_parts("direct", Some(Uuid::new_v4())), None);
        assert_eq!(ChatKind::from_parts("group", Some(Uuid::new_v4())), None);
        assert_eq!(ChatKind::from_parts("broadcast", None), None);
    }

    #[test]
    fn test_community_id_accessor() {
        let community_id = Uuid::new_v4();
        let channel = Chat {
            id: Uuid::new_v4(),
            name: Some("general".to_string()),
            kind: ChatKind::Channel { community_id },
            created_at: Utc::now(),
        };
        assert_eq!(channel.community_id(), Some(community_id));

        let direct = Chat {
            id: Uuid::new_v4(),
            name: None,
            kind: ChatKind::Direct,
            created_at: Utc::now(),
        };
        assert_eq!(direct.community_id(), None);
    }

    #[test]
    fn test_chat_serializes_with_flattened_kind() {
        let chat = Chat {
            id: Uuid::new_v4(),
            name: Some("rust".to_string()),
            kind: ChatKind::Channel {
                community_id: Uuid::new_v4(),
            },
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["kind"], "channel");
        assert!(json["community_id"].is_string());
    }
}
