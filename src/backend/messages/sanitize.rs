//! Content Sanitization
//!
//! Strips HTML markup from text content before storage and enforces the
//! length ceiling. Text that is empty after stripping is rejected, so a
//! message consisting only of markup never reaches the store.

use crate::backend::error::ApiError;

/// Length ceiling for text content, measured in UTF-16 code units to match
/// what clients count
pub const MAX_CONTENT_UNITS: usize = 4000;

/// Remove HTML tags from the input and trim surrounding whitespace.
///
/// Unterminated tags are dropped to the end of input rather than kept,
/// so `"<script"` sanitizes to empty.
pub fn strip_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

/// Sanitize and validate text message content.
///
/// # Errors
///
/// * `InvalidInput` when the content is empty after stripping
/// * `InvalidInput` when the content exceeds the length ceiling
pub fn sanitize_text(input: &str) -> Result<String, ApiError> {
    let cleaned = strip_html(input);
    if cleaned.is_empty() {
        return Err(ApiError::invalid("message content cannot be empty"));
    }
    if cleaned.encode_utf16().count() > MAX_CONTENT_UNITS {
        return Err(ApiError::invalid("message content too long"));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        assert_eq!(sanitize_text("hello world").unwrap(), "hello world");
    }

    #[test]
    fn test_tags_are_stripped() {
        assert_eq!(strip_html("<b>bold</b> move"), "bold move");
        assert_eq!(strip_html("a <a href=\"x\">link</a>"), "a link");
    }

    #[test]
    fn test_unterminated_tag_is_dropped() {
        assert_eq!(strip_html("hi <script"), "hi");
    }

    #[test]
    fn test_markup_only_content_is_rejected() {
        assert!(sanitize_text("<b></b>").is_err());
        assert!(sanitize_text("   ").is_err());
        assert!(sanitize_text("").is_err());
    }

    #[test]
    fn test_length_ceiling() {
        let at_limit = "x".repeat(MAX_CONTENT_UNITS);
        assert!(sanitize_text(&at_limit).is_ok());

        let over = "x".repeat(MAX_CONTENT_UNITS + 1);
        assert!(sanitize_text(&over).is_err());
    }

    #[test]
    fn test_length_counts_utf16_units() {
        // Each astral-plane char is two UTF-16 units
        let over = "𝄞".repeat(MAX_CONTENT_UNITS / 2 + 1);
        assert!(sanitize_text(&over).is_err());
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert_eq!(sanitize_text("  hi  ").unwrap(), "hi");
    }
}
