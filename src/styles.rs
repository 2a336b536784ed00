//! Style resolution.
//!
//! Flattens `style:style` definitions from `content.xml` (automatic styles)
//! and `styles.xml` (common styles) into one name → CSS table. The mapping is
//! fixed: only the properties below are ever produced.
//!
//! | ODF attribute                          | CSS                            |
//! |----------------------------------------|--------------------------------|
//! | `fo:font-weight="bold"`                | `font-weight: bold`            |
//! | `fo:font-style="italic"`               | `font-style: italic`           |
//! | `style:text-underline-style` ≠ `none`  | `text-decoration: underline`   |
//! | `fo:font-size`, `fo:color`             | passed through                 |
//! | `fo:text-align`, `fo:margin-left`      | passed through                 |
//! | `fo:break-before="page"`               | `page-break-before: always`    |
//! | `fo:break-after="page"`                | `page-break-after: always`     |

use std::collections::BTreeMap;

use log::debug;

use crate::css::is_safe_value;
use crate::etree::{Element, Namespace};
use crate::patterns::CSS_CLASS_NAME;

pub const FONT_WEIGHT: &str = "font-weight";
pub const FONT_STYLE: &str = "font-style";
pub const TEXT_DECORATION: &str = "text-decoration";
pub const FONT_SIZE: &str = "font-size";
pub const COLOR: &str = "color";
pub const TEXT_ALIGN: &str = "text-align";
pub const MARGIN_LEFT: &str = "margin-left";
pub const PAGE_BREAK_BEFORE: &str = "page-break-before";
pub const PAGE_BREAK_AFTER: &str = "page-break-after";

/// CSS declarations of one style, in extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssProperties(Vec<(&'static str, String)>);

impl CssProperties {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing an earlier value in place.
    pub fn set(&mut self, property: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self.0.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => self.0.push((property, value)),
        }
    }

    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(p, v)| (*p, v.as_str()))
    }

    #[must_use]
    pub fn is_bold(&self) -> bool {
        self.get(FONT_WEIGHT) == Some("bold")
    }

    #[must_use]
    pub fn is_italic(&self) -> bool {
        self.get(FONT_STYLE) == Some("italic")
    }

    #[must_use]
    pub fn is_underlined(&self) -> bool {
        self.get(TEXT_DECORATION) == Some("underline")
    }

    /// Inline `style` attribute value, `"k: v; k: v"`. Includes page-break
    /// declarations; the page-break normalizer consumes them downstream.
    #[must_use]
    pub fn to_inline(&self) -> String {
        self.iter()
            .map(|(p, v)| format!("{p}: {v}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Resolved styles keyed by style name.
pub type StyleTable = BTreeMap<String, CssProperties>;

/// Build the style table from the content tree and the optional styles tree.
///
/// Content styles are read first, so a same-named definition in `styles.xml`
/// wins.
#[must_use]
pub fn resolve_styles(content: &Element, styles: Option<&Element>) -> StyleTable {
    let mut table = StyleTable::new();
    for tree in std::iter::once(content).chain(styles) {
        for style in tree.find_all(&Namespace::Style, "style") {
            if let Some(name) = style.attr(Namespace::Style, "name") {
                table.insert(name.to_string(), extract_properties(style));
            }
        }
    }
    table
}

/// CSS for one `style:style` element.
#[must_use]
pub fn extract_properties(style: &Element) -> CssProperties {
    let mut css = CssProperties::new();

    if let Some(text) = style.find(&Namespace::Style, "text-properties") {
        if text.attr(Namespace::Fo, "font-weight") == Some("bold") {
            css.set(FONT_WEIGHT, "bold");
        }
        if text.attr(Namespace::Fo, "font-style") == Some("italic") {
            css.set(FONT_STYLE, "italic");
        }
        if let Some(underline) = text.attr(Namespace::Style, "text-underline-style") {
            if !underline.is_empty() && underline != "none" {
                css.set(TEXT_DECORATION, "underline");
            }
        }
        if let Some(size) = non_empty(text.attr(Namespace::Fo, "font-size")) {
            css.set(FONT_SIZE, size);
        }
        if let Some(color) = non_empty(text.attr(Namespace::Fo, "color")) {
            css.set(COLOR, color);
        }
    }

    if let Some(para) = style.find(&Namespace::Style, "paragraph-properties") {
        if let Some(align) = non_empty(para.attr(Namespace::Fo, "text-align")) {
            css.set(TEXT_ALIGN, align);
        }
        if let Some(margin) = non_empty(para.attr(Namespace::Fo, "margin-left")) {
            css.set(MARGIN_LEFT, margin);
        }
        if para.attr(Namespace::Fo, "break-before") == Some("page") {
            css.set(PAGE_BREAK_BEFORE, "always");
        }
        if para.attr(Namespace::Fo, "break-after") == Some("page") {
            css.set(PAGE_BREAK_AFTER, "always");
        }
    }

    css
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Stylesheet for the resolved table: one `.name { ... }` rule per style.
///
/// Page-break properties are expressed structurally by the marker and never
/// re-emitted as CSS. Names that are not plain class identifiers and values
/// that could leave their declaration are dropped. Styles with nothing left
/// are skipped.
#[must_use]
pub fn generate_css(table: &StyleTable) -> String {
    table
        .iter()
        .filter(|(name, _)| {
            let valid = CSS_CLASS_NAME.is_match(name);
            if !valid {
                debug!("Style name {name:?} is not a CSS class name, omitted from stylesheet");
            }
            valid
        })
        .filter_map(|(name, props)| {
            let decls: Vec<String> = props
                .iter()
                .filter(|(p, _)| *p != PAGE_BREAK_BEFORE && *p != PAGE_BREAK_AFTER)
                .filter(|(p, v)| is_safe_value(p, v) && stays_in_declaration(v))
                .map(|(p, v)| format!("{p}: {v}"))
                .collect();
            if decls.is_empty() {
                None
            } else {
                Some(format!(".{name} {{ {}; }}", decls.join("; ")))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether `value` cannot end its declaration, rule or style element early.
fn stays_in_declaration(value: &str) -> bool {
    const BREAKOUT: &[char] = &['{', '}', ';', '<', '>', '\\', '\n', '\r'];
    !value.contains(BREAKOUT)
        && !value.contains("/*")
        && value.matches('"').count() % 2 == 0
        && value.matches('\'').count() % 2 == 0
}
