//! Allowlist sanitizer.
//!
//! Enforces a [`Policy`] over an HTML fragment while carrying every
//! [`PAGEBREAK_MARKER`] through untouched. The marker is an HTML comment,
//! which the tree passes would otherwise discard, so it travels as a
//! private-use placeholder that no filter recognizes as markup.
//!
//! Steps, in order:
//! 1. markers become placeholders, the fragment is parsed, comments dropped
//! 2. placeholders found in attribute values move into the text
//! 3. disallowed tags are unwrapped, disallowed attributes removed
//! 4. inline styles are filtered declaration by declaration
//! 5. empty `p`/`div` elements are removed until none are left
//! 6. text nodes get whitespace and marker runs normalized
//! 7. placeholders become markers again
//!
//! All filtering happens on the parsed tree. The serialized output is only
//! trimmed, never rewritten.

use log::{debug, error};

use crate::css::filter_style;
use crate::dom::{self, NodeRef, Selection};
use crate::error::{Error, Result};
use crate::pagebreak::PAGEBREAK_MARKER;
use crate::patterns::{BLANK_LINES, MARKER_RUN, TRAILING_WHITESPACE};
use crate::policy::Policy;

/// Private-use delimiter for the in-flight marker. Never produced by the
/// converter; stripped from input before use.
const PLACEHOLDER_DELIMITER: char = '\u{E000}';

/// Stand-in for [`PAGEBREAK_MARKER`] while the tree is being filtered.
pub(crate) const MARKER_PLACEHOLDER: &str = "\u{E000}pagebreak\u{E000}";

/// Elements removed when they end up empty.
const EMPTY_CANDIDATES: &str = "p, div";

/// Elements whose text is rendered verbatim.
const PREFORMATTED: &[&str] = &["pre", "textarea", "listing", "plaintext", "script", "style"];

/// Elements whose leading newline the parser swallows.
const LEADING_NEWLINE_DROPPED: &str = "pre, textarea, listing";

/// Cell-level elements that may hold text directly.
const TABLE_CELLS: &[&str] = &["td", "th", "caption"];

/// Table structure that cannot hold text; markers go after the table.
const TABLE_STRUCTURE: &[&str] = &["table", "thead", "tbody", "tfoot", "tr", "colgroup", "col"];

/// Sanitize `html` against `policy`.
///
/// Never fails: if sanitization cannot complete, the error is logged and
/// `html` is returned unchanged. Use [`try_sanitize`] to observe the error.
#[must_use]
pub fn sanitize(html: &str, policy: &Policy) -> String {
    match try_sanitize(html, policy) {
        Ok(clean) => clean,
        Err(e) => {
            error!("Sanitization failed, returning input unchanged: {e}");
            html.to_string()
        }
    }
}

/// Sanitize `html` against `policy`, reporting internal failures.
pub fn try_sanitize(html: &str, policy: &Policy) -> Result<String> {
    let protected = protect_markers(html);

    let doc = dom::parse_fragment(&protected);
    let body = dom::body(&doc)
        .ok_or_else(|| Error::SanitizationError("parser produced no body".to_string()))?;

    let comments = dom::remove_comments(&body);
    debug!("Removed {comments} comments");
    lift_attribute_markers(&body);

    filter_tags(&body, policy);
    filter_attributes(&body, policy);
    filter_styles(&body, policy);
    let removed = remove_empty_blocks(&body);
    debug!("Removed {removed} empty block elements");

    normalize_text(&body);
    keep_leading_newlines(&body);

    let serialized = dom::inner_html(&body).replace(MARKER_PLACEHOLDER, PAGEBREAK_MARKER);
    Ok(serialized.trim().to_string())
}

fn protect_markers(html: &str) -> String {
    html.replace(PLACEHOLDER_DELIMITER, "")
        .replace(PAGEBREAK_MARKER, MARKER_PLACEHOLDER)
}

/// Move markers out of attribute values and into the text next to their
/// element. Cells take the marker as their last child; table structure
/// pushes it past the enclosing table.
fn lift_attribute_markers(body: &Selection) {
    let Some(root) = body.nodes().first() else {
        return;
    };
    if dom::replace_in_attributes(body, MARKER_PLACEHOLDER, "") {
        dom::append_text(root, MARKER_PLACEHOLDER);
    }

    let elements: Vec<NodeRef> = root.descendants().into_iter().filter(NodeRef::is_element).collect();
    for node in elements {
        if !dom::replace_in_attributes(&Selection::from(node), MARKER_PLACEHOLDER, "") {
            continue;
        }
        debug!("Lifting marker out of <{}> attributes", node.node_name().unwrap_or_default());
        if TABLE_CELLS.iter().any(|name| node.has_name(name)) {
            dom::append_text(&node, MARKER_PLACEHOLDER);
        } else if TABLE_STRUCTURE.iter().any(|name| node.has_name(name)) {
            let table = std::iter::once(node)
                .chain(node.ancestors_it(None))
                .find(|n| n.has_name("table"))
                .unwrap_or(node);
            dom::insert_text_after(&table, MARKER_PLACEHOLDER);
        } else {
            dom::insert_text_after(&node, MARKER_PLACEHOLDER);
        }
    }
}

/// Unwrap every element whose tag is outside the policy.
fn filter_tags(body: &Selection, policy: &Policy) {
    let mut disallowed: Vec<String> = dom::descendants(body)
        .iter()
        .filter_map(dom::tag_name)
        .filter(|tag| !policy.allows_tag(tag))
        .collect();
    disallowed.sort_unstable();
    disallowed.dedup();

    if !disallowed.is_empty() {
        debug!("Unwrapping disallowed tags: {disallowed:?}");
    }
    dom::strip_tags(body, &disallowed);
}

/// Drop every attribute not allowed on its element. Names are compared
/// qualified, so `xlink:href` is never mistaken for `href`.
fn filter_attributes(body: &Selection, policy: &Policy) {
    for elem in dom::descendants(body) {
        let tag = dom::tag_name(&elem).unwrap_or_default();
        dom::retain_attributes(&elem, |name| policy.allows_attribute(&tag, name));
    }
}

/// Reduce each surviving `style` attribute to allowed, safe declarations.
fn filter_styles(body: &Selection, policy: &Policy) {
    for elem in body.select("[style]").nodes().iter().map(|n| Selection::from(*n)) {
        let style = dom::get_attribute(&elem, "style").unwrap_or_default();
        match filter_style(&style, |property| policy.allows_style(property)) {
            Some(clean) => dom::set_attribute(&elem, "style", &clean),
            None => dom::remove_attribute(&elem, "style"),
        }
    }
}

/// Remove `p`/`div` elements with neither text nor element children,
/// repeating until a pass removes nothing. Returns the number removed.
fn remove_empty_blocks(body: &Selection) -> usize {
    let mut removed = 0;
    loop {
        let empty: Vec<Selection> = body
            .select(EMPTY_CANDIDATES)
            .nodes()
            .iter()
            .map(|n| Selection::from(*n))
            .filter(is_empty_block)
            .collect();
        if empty.is_empty() {
            return removed;
        }
        removed += empty.len();
        for elem in &empty {
            dom::remove(elem);
        }
    }
}

fn is_empty_block(elem: &Selection) -> bool {
    let text = dom::text_content(elem);
    !dom::has_children(elem) && text.trim().is_empty() && !text.contains(MARKER_PLACEHOLDER)
}

/// Merge adjacent text, then in each text node put every marker run on its
/// own line as a single marker. Outside preformatted elements, also strip
/// trailing whitespace and collapse blank lines.
fn normalize_text(body: &Selection) {
    dom::normalize_text(body);
    for node in dom::text_nodes(body) {
        let original = node.text();
        let mut text = original.to_string();
        if !dom::has_ancestor(&node, PREFORMATTED) {
            text = TRAILING_WHITESPACE.replace_all(&text, "\n").into_owned();
            text = BLANK_LINES.replace_all(&text, "\n\n").into_owned();
        }
        let separated = format!("\n{MARKER_PLACEHOLDER}\n");
        text = MARKER_RUN.replace_all(&text, separated.as_str()).into_owned();
        if text != *original {
            node.set_text(text);
        }
    }
}

/// The parser drops one newline right after `<pre>`, `<textarea>` and
/// `<listing>`, and serialization does not put it back. Double a leading
/// newline so the text reads the same when the output is parsed again.
fn keep_leading_newlines(body: &Selection) {
    for elem in body.select(LEADING_NEWLINE_DROPPED).nodes() {
        let Some(first) = elem.first_child() else {
            continue;
        };
        if first.is_text() {
            let text = first.text();
            if text.starts_with('\n') {
                first.set_text(format!("\n{text}"));
            }
        }
    }
}
