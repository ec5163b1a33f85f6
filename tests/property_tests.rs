//! Property-based tests
//!
//! Uses proptest to verify sanitization and protocol invariants over
//! random inputs.

use proptest::prelude::*;

use ripple::backend::messages::engine::clamp_limit;
use ripple::backend::messages::sanitize::{sanitize_text, strip_html, MAX_CONTENT_UNITS};
use ripple::shared::event::ClientEvent;

proptest! {
    #[test]
    fn test_stripped_text_never_contains_tags(input in ".*") {
        let stripped = strip_html(&input);
        prop_assert!(!stripped.contains('<'));
    }

    #[test]
    fn test_strip_is_idempotent(input in ".*") {
        let once = strip_html(&input);
        prop_assert_eq!(strip_html(&once), once.clone());
    }

    #[test]
    fn test_sanitized_text_respects_ceiling(input in ".*") {
        if let Ok(cleaned) = sanitize_text(&input) {
            prop_assert!(!cleaned.is_empty());
            prop_assert!(cleaned.encode_utf16().count() <= MAX_CONTENT_UNITS);
        }
    }

    #[test]
    fn test_plain_text_survives_sanitization(input in "[a-zA-Z0-9 .,!?]{1,200}") {
        // No markup, no surrounding whitespace: content passes unchanged
        let trimmed = input.trim().to_string();
        prop_assume!(!trimmed.is_empty());
        prop_assert_eq!(sanitize_text(&trimmed).unwrap(), trimmed);
    }

    #[test]
    fn test_clamp_limit_stays_in_range(limit in any::<Option<i64>>()) {
        let clamped = clamp_limit(limit);
        prop_assert!((1..=100).contains(&clamped));
    }

    #[test]
    fn test_client_event_roundtrip(bytes in any::<[u8; 16]>()) {
        let chat_id = uuid::Uuid::from_bytes(bytes);
        for event in [
            ClientEvent::JoinChat { chat_id },
            ClientEvent::LeaveChat { chat_id },
            ClientEvent::Typing { chat_id },
            ClientEvent::StopTyping { chat_id },
        ] {
            let json = serde_json::to_string(&event).unwrap();
            let parsed: ClientEvent = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, event);
        }
    }
}
