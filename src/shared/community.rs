//! Community Model
//!
//! A community ("server" in Discord vocabulary) groups channels under a
//! shared roster and a single owner. Channels never carry their own roster;
//! membership checks for a channel resolve against the community roster.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A community owning zero or more channel chats
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Community {
    /// Unique community ID
    pub id: Uuid,
    /// Display name
    pub name: String,
    /// The owning user; ownership moves only via explicit transfer
    pub owner_id: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// A community roster row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommunityMember {
    /// Community the membership belongs to
    pub community_id: Uuid,
    /// The member
    pub user_id: Uuid,
    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

/// An invite granting community membership on redemption
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Invite {
    /// Short shareable code
    pub code: String,
    /// Target community
    pub community_id: Uuid,
    /// Who created the invite
    pub created_by: Option<Uuid>,
    /// Maximum number of redemptions; `None` is unlimited
    pub max_uses: Option<i32>,
    /// Redemptions so far
    pub uses: i32,
    /// Expiry; `None` never expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Invite {
    /// Whether the invite can still be redeemed at `now`
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        if let Some(expires_at) = self.expires_at {
            if now >= expires_at {
                return false;
            }
        }
        match self.max_uses {
            Some(max) => self.uses < max,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invite(max_uses: Option<i32>, uses: i32, expires_at: Option<DateTime<Utc>>) -> Invite {
        Invite {
            code: "abc123".to_string(),
            community_id: Uuid::new_v4(),
            created_by: Some(Uuid::new_v4()),
            max_uses,
            uses,
            expires_at,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_unlimited_invite_is_redeemable() {
        assert!(invite(None, 1000, None).is_redeemable(Utc::now()));
    }

    #[test]
    fn test_exhausted_invite_is_not_redeemable() {
        assert!(invite(Some(1), 0, None).is_redeemable(Utc::now()));
        assert!(!invite(Some(1), 1, None).is_redeemable(Utc::now()));
    }

    #[test]
    fn test_expired_invite_is_not_redeemable() {
        let now = Utc::now();
        assert!(invite(None, 0, Some(now + Duration::hours(1))).is_redeemable(now));
        assert!(!invite(None, 0, Some(now - Duration::hours(1))).is_redeemable(now));
    }
}
