//! Compiled regex patterns for normalization and sanitization.
//!
//! All patterns are compiled once at startup using `LazyLock` for efficiency.
//! Patterns are organized by their purpose in the pipeline.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

use crate::sanitizer::MARKER_PLACEHOLDER;

// =============================================================================
// CSS Value Safety
// =============================================================================

/// Constructs that can execute script or pull remote resources from CSS.
/// Matching is case-insensitive and tolerates whitespace before `(`.
pub static DANGEROUS_CSS_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)javascript:|expression\s*\(|@import|url\s*\(|behavior:|-moz-binding")
        .expect("DANGEROUS_CSS_VALUE regex")
});

/// Signed number with an optional length unit, nothing else.
pub static SAFE_DIMENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?\d+(\.\d+)?(px|em|rem|%|pt|cm|mm|in|vh|vw)?$")
        .expect("SAFE_DIMENSION regex")
});

/// Style names usable verbatim as a CSS class selector.
pub static CSS_CLASS_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("CSS_CLASS_NAME regex")
});

// =============================================================================
// Text Normalization
// =============================================================================
//
// Applied to text nodes, never to serialized markup, so attribute values and
// preformatted content are out of reach.

/// Horizontal whitespace at the end of a line.
pub static TRAILING_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[ \t\r\x0C]+\n").expect("TRAILING_WHITESPACE regex")
});

/// Three or more line breaks, i.e. two or more blank lines.
pub static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\n{3,}").expect("BLANK_LINES regex")
});

/// A run of in-flight page-break placeholders together with the whitespace
/// around it.
pub static MARKER_RUN: LazyLock<Regex> = LazyLock::new(|| {
    let marker = regex::escape(MARKER_PLACEHOLDER);
    Regex::new(&format!(r"[ \t\r\n\x0C]*(?:{marker}[ \t\r\n\x0C]*)+")).expect("MARKER_RUN regex")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_run_absorbs_whitespace() {
        let text = format!("a \n{MARKER_PLACEHOLDER}\n\n {MARKER_PLACEHOLDER}b");
        assert_eq!(MARKER_RUN.find_iter(&text).count(), 1);
        assert_eq!(
            MARKER_RUN.replace_all(&text, "|"),
            "a|b"
        );
    }

    #[test]
    fn test_marker_run_keeps_nbsp() {
        let text = format!("\u{a0}{MARKER_PLACEHOLDER}");
        assert_eq!(MARKER_RUN.replace_all(&text, "|"), "\u{a0}|");
    }

    #[test]
    fn test_css_class_name() {
        assert!(CSS_CLASS_NAME.is_match("Heading_20_1"));
        assert!(CSS_CLASS_NAME.is_match("P-2"));
        assert!(!CSS_CLASS_NAME.is_match("a.b"));
        assert!(!CSS_CLASS_NAME.is_match("x{y"));
        assert!(!CSS_CLASS_NAME.is_match(""));
    }

    #[test]
    fn test_blank_lines_and_trailing_whitespace() {
        let stripped = TRAILING_WHITESPACE.replace_all("a  \n \t\n\n\nb\nc", "\n");
        assert_eq!(stripped, "a\n\n\n\nb\nc");
        assert_eq!(BLANK_LINES.replace_all(&stripped, "\n\n"), "a\n\nb\nc");
    }
}
