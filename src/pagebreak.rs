//! Page-break normalization.
//!
//! Word processors and HTML converters spell "new page here" in many ways.
//! [`normalize_pagebreaks`] rewrites all of them into [`PAGEBREAK_MARKER`]:
//!
//! 1. Known literal snippets are replaced verbatim, most specific first.
//! 2. Any remaining element whose inline style carries
//!    `page-break-before: always` or `page-break-after: always` loses that
//!    declaration (and the `style` attribute if nothing else is left) and
//!    gets a marker right after its end tag.
//!
//! The marker is an HTML comment, which neither step matches, so running the
//! normalizer on its own output changes nothing.

use std::borrow::Cow;
use std::collections::HashMap;

use quick_xml::escape::{escape, unescape};

use crate::css::parse_declarations;

/// The canonical page-break token carried through the whole pipeline.
pub const PAGEBREAK_MARKER: &str = "<!-- pagebreak -->";

/// Literal page-break spellings, in replacement order.
///
/// The `div` with a hidden `span` must precede the bare `div` form it
/// starts with.
pub static LEGACY_PAGEBREAKS: [&str; 9] = [
    r#"<div style="page-break-after: always"><span style="display: none">&nbsp;</span></div>"#,
    r#"<div style="page-break-after: always"></div>"#,
    r#"<div style="page-break-before: always"></div>"#,
    r#"<br style="page-break-after: always">"#,
    r#"<br style="page-break-before: always">"#,
    r#"<p style="page-break-after: always"></p>"#,
    r#"<p style="page-break-before: always"></p>"#,
    r#"<hr class="pagebreak">"#,
    r#"<div class="page-break"></div>"#,
];

/// Elements that never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose content is raw text and must not be scanned for tags.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Rewrite every known page-break representation into [`PAGEBREAK_MARKER`].
#[must_use]
pub fn normalize_pagebreaks(html: &str) -> String {
    let html = replace_legacy(html);
    let html = rewrite_break_styles(&html);
    // A rewritten tag can complete a literal form (e.g. a `div.page-break`
    // that also had a break style); fold those now rather than on a rerun.
    replace_legacy(&html)
}

fn replace_legacy(html: &str) -> String {
    let mut current = html.to_string();
    loop {
        let next = LEGACY_PAGEBREAKS
            .iter()
            .fold(current.clone(), |acc, pattern| acc.replace(pattern, PAGEBREAK_MARKER));
        // Every pattern is longer than the marker, so this terminates.
        if next == current {
            return current;
        }
        current = next;
    }
}

// =============================================================================
// Tag scanning
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open { self_closing: bool },
    Close,
}

/// A start or end tag located in the source string.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tag {
    /// Byte offset of `<`.
    start: usize,
    /// Byte offset one past `>`.
    end: usize,
    /// Lowercased tag name.
    name: String,
    /// Byte offset one past the tag name.
    name_end: usize,
    kind: TagKind,
}

impl Tag {
    fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.name.as_str())
            || matches!(self.kind, TagKind::Open { self_closing: true })
    }
}

/// Locate start and end tags, skipping comments, doctypes, processing
/// instructions and raw-text element content.
fn scan_tags(html: &str) -> Vec<Tag> {
    let bytes = html.as_bytes();
    let mut tags = Vec::new();
    let mut i = 0;

    while let Some(offset) = html[i..].find('<') {
        let lt = i + offset;

        if html[lt..].starts_with("<!--") {
            i = html[lt + 4..].find("-->").map_or(html.len(), |p| lt + 4 + p + 3);
            continue;
        }
        if html[lt..].starts_with("<!") || html[lt..].starts_with("<?") {
            i = html[lt..].find('>').map_or(html.len(), |p| lt + p + 1);
            continue;
        }

        let is_close = bytes.get(lt + 1) == Some(&b'/');
        let name_start = if is_close { lt + 2 } else { lt + 1 };
        let name_len = html[name_start..]
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'-' || *b == b':')
            .count();
        if name_len == 0 || !bytes[name_start].is_ascii_alphabetic() {
            i = lt + 1;
            continue;
        }
        let name_end = name_start + name_len;

        let Some(close) = find_tag_end(html, name_end) else {
            break;
        };
        let end = close + 1;
        let name = html[name_start..name_end].to_ascii_lowercase();
        let kind = if is_close {
            TagKind::Close
        } else {
            TagKind::Open {
                self_closing: html[name_end..close].trim_end().ends_with('/'),
            }
        };

        i = end;
        if kind != TagKind::Close && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let closing = format!("</{name}");
            i = html[end..]
                .to_ascii_lowercase()
                .find(&closing)
                .map_or(html.len(), |p| end + p);
        }

        tags.push(Tag {
            start: lt,
            end,
            name,
            name_end,
            kind,
        });
    }

    tags
}

/// Offset of the `>` closing a tag, ignoring `>` inside quoted values.
fn find_tag_end(html: &str, from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    for (idx, b) in html.as_bytes()[from..].iter().enumerate() {
        match (quote, *b) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(*b),
            (None, b'>') => return Some(from + idx),
            _ => {}
        }
    }
    None
}

/// One attribute of a start tag, as written.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RawAttribute<'a> {
    name: &'a str,
    value: Option<&'a str>,
    source: &'a str,
}

/// Split the attribute area of a start tag (between name and `>`).
fn parse_attributes(src: &str) -> Vec<RawAttribute<'_>> {
    let bytes = src.as_bytes();
    let mut attrs = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        while i < bytes.len() && (bytes[i].is_ascii_whitespace() || bytes[i] == b'/') {
            i += 1;
        }
        let start = i;
        while i < bytes.len()
            && !bytes[i].is_ascii_whitespace()
            && !matches!(bytes[i], b'=' | b'/' | b'>')
        {
            i += 1;
        }
        if i == start {
            // A stray `=` or `>`; step over it.
            i += 1;
            continue;
        }
        let name = &src[start..i];

        let mut j = i;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if j >= bytes.len() || bytes[j] != b'=' {
            attrs.push(RawAttribute {
                name,
                value: None,
                source: name,
            });
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }

        let (value, end) = match bytes.get(j) {
            Some(&q @ (b'"' | b'\'')) => {
                let value_start = j + 1;
                let value_end = src[value_start..]
                    .find(q as char)
                    .map_or(src.len(), |p| value_start + p);
                (&src[value_start..value_end], (value_end + 1).min(src.len()))
            }
            _ => {
                let value_start = j;
                while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                    j += 1;
                }
                (&src[value_start..j], j)
            }
        };

        attrs.push(RawAttribute {
            name,
            value: Some(value),
            source: &src[start..end],
        });
        i = end;
    }

    attrs
}

// =============================================================================
// Style-declared page breaks
// =============================================================================

fn is_break_declaration(property: &str, value: &str) -> bool {
    let property = property.to_ascii_lowercase();
    (property == "page-break-before" || property == "page-break-after")
        && value.eq_ignore_ascii_case("always")
}

/// The start tag without its page-break declarations, or `None` if the tag
/// carries none.
fn strip_break_style(html: &str, tag: &Tag) -> Option<String> {
    let attr_area = html[tag.name_end..tag.end - 1].trim_end();
    let self_closing = attr_area.ends_with('/');
    let attrs = parse_attributes(attr_area.trim_end_matches('/'));

    let mut found = false;
    let mut rebuilt = format!("<{}", &html[tag.start + 1..tag.name_end]);

    for attr in &attrs {
        if attr.name.eq_ignore_ascii_case("style") {
            if let Some(raw) = attr.value {
                let value = unescape(raw).map_or_else(|_| raw.to_string(), Cow::into_owned);
                let decls = parse_declarations(&value);
                let kept: Vec<String> = decls
                    .iter()
                    .filter(|d| !is_break_declaration(d.property, d.value))
                    .map(|d| format!("{}: {}", d.property, d.value))
                    .collect();
                if kept.len() != decls.len() {
                    found = true;
                    if !kept.is_empty() {
                        let joined = kept.join("; ");
                        rebuilt.push_str(&format!(" {}=\"{}\"", attr.name, escape(joined.as_str())));
                    }
                    continue;
                }
            }
        }
        rebuilt.push(' ');
        rebuilt.push_str(attr.source);
    }

    if !found {
        return None;
    }
    if self_closing {
        rebuilt.push_str(" /");
    }
    rebuilt.push('>');
    Some(rebuilt)
}

/// Index of the end tag closing the start tag at `open`, if any.
fn matching_close(tags: &[Tag], open: usize) -> Option<usize> {
    let name = &tags[open].name;
    let mut depth = 1usize;
    for (idx, tag) in tags.iter().enumerate().skip(open + 1) {
        if &tag.name != name {
            continue;
        }
        match tag.kind {
            TagKind::Open { self_closing: false } => depth += 1,
            TagKind::Open { self_closing: true } => {}
            TagKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
        }
    }
    None
}

fn rewrite_break_styles(html: &str) -> String {
    let tags = scan_tags(html);
    let mut rewritten: HashMap<usize, String> = HashMap::new();
    let mut markers_after: HashMap<usize, usize> = HashMap::new();

    for (idx, tag) in tags.iter().enumerate() {
        if tag.kind == TagKind::Close {
            continue;
        }
        let Some(stripped) = strip_break_style(html, tag) else {
            continue;
        };
        rewritten.insert(idx, stripped);
        let anchor = if tag.is_void() {
            idx
        } else {
            matching_close(&tags, idx).unwrap_or(idx)
        };
        *markers_after.entry(anchor).or_default() += 1;
    }

    if rewritten.is_empty() {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len() + markers_after.len() * PAGEBREAK_MARKER.len());
    let mut cursor = 0;
    for (idx, tag) in tags.iter().enumerate() {
        out.push_str(&html[cursor..tag.start]);
        match rewritten.get(&idx) {
            Some(replacement) => out.push_str(replacement),
            None => out.push_str(&html[tag.start..tag.end]),
        }
        for _ in 0..markers_after.get(&idx).copied().unwrap_or(0) {
            out.push_str(PAGEBREAK_MARKER);
        }
        cursor = tag.end;
    }
    out.push_str(&html[cursor..]);
    out
}
