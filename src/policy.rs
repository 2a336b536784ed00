//! Sanitization allowlist.
//!
//! A [`Policy`] is the immutable triple the sanitizer enforces: which tags
//! survive, which attributes each tag may keep, and which CSS properties
//! inline styles may carry.

use std::collections::{HashMap, HashSet};

/// Key in [`Policy::attributes`] whose entries apply to every tag.
pub const WILDCARD: &str = "*";

/// Tags kept by the default policy.
pub static DEFAULT_ALLOWED_TAGS: [&str; 36] = [
    "p", "br", "span", "div", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "strong",
    "b", "em", "i", "u", "s", "strike", "a", "img", "blockquote", "code", "pre", "table",
    "thead", "tbody", "tfoot", "tr", "td", "th", "caption", "sup", "sub", "hr",
];

/// Per-tag attributes kept by the default policy.
pub static DEFAULT_ALLOWED_ATTRIBUTES: [(&str, &[&str]); 6] = [
    (WILDCARD, &["class", "style", "id"]),
    ("a", &["href", "title", "target", "rel"]),
    ("img", &["src", "alt", "title", "width", "height"]),
    ("table", &["border", "cellpadding", "cellspacing"]),
    ("td", &["colspan", "rowspan", "align", "valign"]),
    ("th", &["colspan", "rowspan", "align", "valign"]),
];

/// CSS properties kept by the default policy.
pub static DEFAULT_ALLOWED_STYLES: [&str; 16] = [
    "color",
    "background-color",
    "font-size",
    "font-family",
    "font-weight",
    "font-style",
    "text-decoration",
    "text-align",
    "margin",
    "padding",
    "border",
    "width",
    "height",
    "display",
    "float",
    "clear",
];

/// Allowed tags, attributes and styles.
///
/// Names are stored lowercase; lookups lowercase their argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub tags: HashSet<String>,
    pub attributes: HashMap<String, HashSet<String>>,
    pub styles: HashSet<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(
            DEFAULT_ALLOWED_TAGS.iter().copied(),
            DEFAULT_ALLOWED_ATTRIBUTES
                .iter()
                .map(|(tag, attrs)| (*tag, attrs.iter().copied())),
            DEFAULT_ALLOWED_STYLES.iter().copied(),
        )
    }
}

impl Policy {
    /// Build a policy from explicit sets.
    pub fn new<'a, T, A, I, S>(tags: T, attributes: A, styles: S) -> Self
    where
        T: IntoIterator<Item = &'a str>,
        A: IntoIterator<Item = (&'a str, I)>,
        I: IntoIterator<Item = &'a str>,
        S: IntoIterator<Item = &'a str>,
    {
        let mut attr_map: HashMap<String, HashSet<String>> = HashMap::new();
        for (tag, attrs) in attributes {
            attr_map
                .entry(tag.to_ascii_lowercase())
                .or_default()
                .extend(attrs.into_iter().map(str::to_ascii_lowercase));
        }
        Self {
            tags: tags.into_iter().map(str::to_ascii_lowercase).collect(),
            attributes: attr_map,
            styles: styles.into_iter().map(str::to_ascii_lowercase).collect(),
        }
    }

    /// Default attributes and styles with a caller-chosen tag set.
    ///
    /// Blank entries are ignored, so a comma-separated list can be passed
    /// through `split(',')` directly.
    #[must_use]
    pub fn with_tags<'a>(tags: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            tags: tags
                .into_iter()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_ascii_lowercase)
                .collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag.to_ascii_lowercase())
    }

    /// Whether `attr` may stay on `tag`: the tag's own set plus the wildcard set.
    #[must_use]
    pub fn allows_attribute(&self, tag: &str, attr: &str) -> bool {
        let attr = attr.to_ascii_lowercase();
        let in_set = |key: &str| {
            self.attributes
                .get(key)
                .is_some_and(|set| set.contains(&attr))
        };
        in_set(&tag.to_ascii_lowercase()) || in_set(WILDCARD)
    }

    #[must_use]
    pub fn allows_style(&self, property: &str) -> bool {
        self.styles.contains(&property.trim().to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_contents() {
        let policy = Policy::default();

        assert_eq!(policy.tags.len(), 36);
        assert!(policy.allows_tag("p"));
        assert!(policy.allows_tag("HR"));
        assert!(policy.allows_tag("sub"));
        assert!(!policy.allows_tag("script"));
        assert_eq!(policy.styles.len(), 16);
    }

    #[test]
    fn test_wildcard_attributes_apply_everywhere() {
        let policy = Policy::default();

        assert!(policy.allows_attribute("p", "style"));
        assert!(policy.allows_attribute("img", "class"));
        assert!(policy.allows_attribute("img", "SRC"));
        assert!(!policy.allows_attribute("p", "src"));
        assert!(!policy.allows_attribute("a", "onclick"));
    }

    #[test]
    fn test_with_tags_narrows_tags_only() {
        let policy = Policy::with_tags("p, strong ,,em".split(','));

        assert_eq!(policy.tags.len(), 3);
        assert!(policy.allows_tag("strong"));
        assert!(!policy.allows_tag("table"));
        assert!(policy.allows_attribute("a", "href"));
        assert!(policy.allows_style("color"));
    }

    #[test]
    fn test_allows_style_is_case_insensitive() {
        let policy = Policy::default();
        assert!(policy.allows_style("Font-Weight"));
        assert!(!policy.allows_style("position"));
    }
}
