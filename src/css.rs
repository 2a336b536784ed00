//! Inline CSS declaration handling.
//!
//! A `style` attribute is tokenized into `property: value` declarations.
//! Semicolons inside quoted strings or parentheses do not end a declaration,
//! so `font-family: "a;b"` stays one declaration instead of two fragments.

use crate::patterns::{DANGEROUS_CSS_VALUE, SAFE_DIMENSION};

/// Properties whose values must be a plain number with an optional safe unit.
pub static GEOMETRIC_PROPERTIES: [&str; 4] = ["width", "height", "margin", "padding"];

/// One `property: value` pair, both trimmed. `property` keeps its source case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub property: &'a str,
    pub value: &'a str,
}

impl Declaration<'_> {
    /// `property: value` with the property lowercased.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("{}: {}", self.property.to_ascii_lowercase(), self.value)
    }
}

/// Split a style string on top-level semicolons.
///
/// Empty and whitespace-only segments are dropped.
#[must_use]
pub fn split_declarations(style: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut depth = 0usize;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in style.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (c, quote) {
            ('\\', _) => escaped = true,
            (q, Some(open)) if q == open => quote = None,
            (_, Some(_)) => {}
            ('"' | '\'', None) => quote = Some(c),
            ('(', None) => depth += 1,
            (')', None) => depth = depth.saturating_sub(1),
            (';', None) if depth == 0 => {
                parts.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&style[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Parse a style string into declarations. Segments without a `:` are skipped.
#[must_use]
pub fn parse_declarations(style: &str) -> Vec<Declaration<'_>> {
    split_declarations(style)
        .into_iter()
        .filter_map(|segment| {
            let (property, value) = segment.split_once(':')?;
            let property = property.trim();
            if property.is_empty() {
                return None;
            }
            Some(Declaration {
                property,
                value: value.trim(),
            })
        })
        .collect()
}

/// Whether `value` is safe for `property`.
///
/// Rejects script-bearing constructs anywhere, and anything but a signed
/// number with an optional length unit for geometric properties.
#[must_use]
pub fn is_safe_value(property: &str, value: &str) -> bool {
    if DANGEROUS_CSS_VALUE.is_match(value) {
        return false;
    }
    let property = property.to_ascii_lowercase();
    if GEOMETRIC_PROPERTIES.contains(&property.as_str()) {
        return SAFE_DIMENSION.is_match(value);
    }
    true
}

/// Filter a style attribute value down to allowed, safe declarations.
///
/// Survivors keep their original order. Returns `None` when nothing survives,
/// meaning the attribute should be dropped.
pub fn filter_style(style: &str, allows: impl Fn(&str) -> bool) -> Option<String> {
    let kept: Vec<String> = parse_declarations(style)
        .into_iter()
        .filter(|d| allows(&d.property.to_ascii_lowercase()) && is_safe_value(d.property, d.value))
        .map(|d| d.to_css())
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_quotes_and_parens() {
        assert_eq!(
            split_declarations(r#"font-family: "a;b", serif; color: rgb(1;2;3) ; ;width:1px"#),
            vec![r#"font-family: "a;b", serif"#, "color: rgb(1;2;3)", "width:1px"]
        );
    }

    #[test]
    fn test_split_unterminated_quote_swallows_rest() {
        assert_eq!(
            split_declarations("content: 'x; color: red"),
            vec!["content: 'x; color: red"]
        );
    }

    #[test]
    fn test_parse_skips_segments_without_colon() {
        let decls = parse_declarations("color: red; bogus; : nothing; Width : 5px");
        assert_eq!(
            decls,
            vec![
                Declaration { property: "color", value: "red" },
                Declaration { property: "Width", value: "5px" },
            ]
        );
    }

    #[test]
    fn test_dangerous_values_rejected() {
        for value in [
            "javascript:alert(1)",
            "expression (alert(1))",
            "url(http://evil)",
            "URL (x)",
            "@import 'x'",
            "behavior: url(x.htc)",
            "-moz-binding",
        ] {
            assert!(!is_safe_value("color", value), "{value} should be rejected");
        }
        assert!(is_safe_value("color", "#ff0000"));
    }

    #[test]
    fn test_geometric_values() {
        assert!(is_safe_value("width", "10px"));
        assert!(is_safe_value("HEIGHT", "-1.5em"));
        assert!(is_safe_value("margin", "+2cm"));
        assert!(is_safe_value("padding", "50%"));
        assert!(is_safe_value("width", "0"));
        assert!(!is_safe_value("width", "10 px"));
        assert!(!is_safe_value("margin", "0 auto"));
        assert!(!is_safe_value("width", "calc(100% - 2px)"));
        // margin-left is not geometric in this sense
        assert!(is_safe_value("margin-left", "auto"));
    }

    #[test]
    fn test_filter_style() {
        let allowed = |p: &str| matches!(p, "color" | "width" | "font-weight");

        assert_eq!(
            filter_style("COLOR: red; position: absolute; width: 10px", allowed),
            Some("color: red; width: 10px".to_string())
        );
        assert_eq!(filter_style("width: javascript:alert(1)", allowed), None);
        assert_eq!(filter_style("", allowed), None);
    }
}
