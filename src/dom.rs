//! DOM Operations Adapter
//!
//! Thin helpers over the `dom_query` crate so the sanitizer reads as a
//! sequence of tree operations instead of selection plumbing.

pub use dom_query::{Document, NodeRef, Selection};

pub use tendril::StrTendril;

// === Parsing ===

/// Parse an HTML fragment into a full document (`html`/`head`/`body` are
/// synthesized by the parser).
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Parse an HTML fragment in body context.
///
/// Elements the parser would otherwise hoist into `head` (`script`, `style`,
/// `title`, ...) stay where they were written, under `body`.
#[must_use]
pub fn parse_fragment(html: &str) -> Document {
    Document::from(format!("<body>{html}"))
}

/// The `body` element of a parsed document, if the parser produced one.
#[must_use]
pub fn body(doc: &Document) -> Option<Selection<'_>> {
    doc.select("body")
        .nodes()
        .first()
        .map(|node| Selection::from(*node))
}

/// Every element below `root`, in document order.
#[must_use]
pub fn descendants<'a>(root: &Selection<'a>) -> Vec<Selection<'a>> {
    root.select("*")
        .nodes()
        .iter()
        .map(|node| Selection::from(*node))
        .collect()
}

// === Attribute Operations ===

/// Get any attribute value
#[inline]
#[must_use]
pub fn get_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name).map(|s| s.to_string())
}

/// Set an attribute value
#[inline]
pub fn set_attribute(sel: &Selection, name: &str, value: &str) {
    sel.set_attr(name, value);
}

/// Remove an attribute
#[inline]
pub fn remove_attribute(sel: &Selection, name: &str) {
    sel.remove_attr(name);
}

/// `prefix:local` for attributes the parser gave a prefix (`xlink:href`
/// inside SVG), the bare local name otherwise.
fn qualified_name(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}:{local}"),
        None => local.to_string(),
    }
}

/// Get all attributes as key-value pairs
///
/// Names are qualified, so a foreign `xlink:href` never reads as `href`.
/// Returns empty vector if node has no attributes or if selection is empty.
#[must_use]
pub fn get_all_attributes(sel: &Selection) -> Vec<(String, String)> {
    sel.nodes()
        .first()
        .map(|node| {
            node.attrs()
                .iter()
                .map(|attr| {
                    (
                        qualified_name(attr.name.prefix.as_deref(), &attr.name.local),
                        attr.value.to_string(),
                    )
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Keep only the attributes whose qualified name passes `keep`.
pub fn retain_attributes(sel: &Selection, keep: impl Fn(&str) -> bool) {
    for node in sel.nodes() {
        node.update(|tree_node| {
            if let Some(element) = tree_node.as_element_mut() {
                element.attrs.retain(|attr| {
                    keep(&qualified_name(attr.name.prefix.as_deref(), &attr.name.local))
                });
            }
        });
    }
}

/// Replace `from` with `to` in every attribute value of the first node.
/// Returns whether any value changed.
pub fn replace_in_attributes(sel: &Selection, from: &str, to: &str) -> bool {
    let Some(node) = sel.nodes().first() else {
        return false;
    };
    node.update(|tree_node| {
        let Some(element) = tree_node.as_element_mut() else {
            return false;
        };
        let mut changed = false;
        for attr in &mut element.attrs {
            if attr.value.contains(from) {
                attr.value = attr.value.replace(from, to).into();
                changed = true;
            }
        }
        changed
    })
    .unwrap_or(false)
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes()
        .first()
        .and_then(dom_query::NodeRef::node_name)
        .map(|t| t.to_ascii_lowercase())
}

/// Whether the selection has element children.
#[inline]
#[must_use]
pub fn has_children(sel: &Selection) -> bool {
    !sel.children().is_empty()
}

// === Text Content ===

/// Get all text content of node and descendants
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> StrTendril {
    sel.text()
}

/// Every text node below `root`, in document order.
#[must_use]
pub fn text_nodes<'a>(root: &Selection<'a>) -> Vec<NodeRef<'a>> {
    root.nodes()
        .iter()
        .flat_map(NodeRef::descendants)
        .filter(NodeRef::is_text)
        .collect()
}

/// Whether `node` sits inside an element with one of the given names.
#[must_use]
pub fn has_ancestor(node: &NodeRef, names: &[&str]) -> bool {
    node.ancestors_it(None)
        .any(|ancestor| names.iter().any(|name| ancestor.has_name(name)))
}

/// Get inner HTML content
#[inline]
#[must_use]
pub fn inner_html(sel: &Selection) -> StrTendril {
    sel.inner_html()
}

// === Tree Manipulation ===

/// Remove elements from tree
#[inline]
pub fn remove(sel: &Selection) {
    sel.remove();
}

/// Remove every comment node below `root`. Returns the number removed.
pub fn remove_comments(root: &Selection) -> usize {
    let comments: Vec<NodeRef> = root
        .nodes()
        .iter()
        .flat_map(NodeRef::descendants)
        .filter(NodeRef::is_comment)
        .collect();
    for comment in &comments {
        comment.remove_from_parent();
    }
    comments.len()
}

/// Merge adjacent text nodes and drop empty ones.
pub fn normalize_text(root: &Selection) {
    for node in root.nodes() {
        node.normalize();
    }
}

/// Insert `text` as a sibling right after `node`.
pub fn insert_text_after(node: &NodeRef, text: &str) {
    let text_node = node.tree.new_text(text);
    node.insert_after(&text_node);
}

/// Append `text` as the last child of `node`.
pub fn append_text(node: &NodeRef, text: &str) {
    let text_node = node.tree.new_text(text);
    node.append_child(&text_node);
}

/// Remove descendant elements with the given tag names but keep their
/// children (unwrap).
pub fn strip_tags<S: AsRef<str>>(sel: &Selection, tags: &[S]) {
    if tags.is_empty() {
        return;
    }
    let names: Vec<&str> = tags.iter().map(AsRef::as_ref).collect();
    sel.strip_elements(&names);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_and_descendants() {
        let doc = parse(r#"<p>a <b>b</b></p><div><span>c</span></div>"#);
        let body = body(&doc).unwrap();

        let tags: Vec<_> = descendants(&body)
            .iter()
            .filter_map(tag_name)
            .collect();
        assert_eq!(tags, vec!["p", "b", "div", "span"]);
    }

    #[test]
    fn test_parse_fragment_keeps_head_elements_in_body() {
        let doc = parse_fragment("<script>x</script><title>t</title><p>a</p>");
        let body = body(&doc).unwrap();

        let tags: Vec<_> = descendants(&body).iter().filter_map(tag_name).collect();
        assert_eq!(tags, vec!["script", "title", "p"]);
    }

    #[test]
    fn test_strip_tags_keep_content() {
        let doc = parse(r#"<div>before <b>bold</b> <font>after</font></div>"#);
        let div = doc.select("div");

        strip_tags(&div, &["b", "font"]);

        assert_eq!(text_content(&div), "before bold after".into());
        assert!(doc.select("b").is_empty());
        assert!(doc.select("font").is_empty());
    }

    #[test]
    fn test_strip_tags_empty_list_is_noop() {
        let doc = parse("<div><b>x</b></div>");
        strip_tags::<&str>(&doc.select("div"), &[]);
        assert!(doc.select("b").exists());
    }

    #[test]
    fn test_attribute_modification() {
        let doc = parse(r#"<a href="/old" class="link" onclick="x()">text</a>"#);
        let link = doc.select("a");

        set_attribute(&link, "href", "/new");
        remove_attribute(&link, "onclick");

        assert_eq!(get_attribute(&link, "href"), Some("/new".to_string()));
        let attrs = get_all_attributes(&link);
        assert_eq!(attrs.len(), 2);
        assert!(attrs.iter().any(|(k, v)| k == "class" && v == "link"));
    }

    #[test]
    fn test_has_children_ignores_text() {
        let doc = parse("<p>only text</p><div><br></div>");
        assert!(!has_children(&doc.select("p")));
        assert!(has_children(&doc.select("div")));
    }

    #[test]
    fn test_remove_and_inner_html() {
        let doc = parse(r#"<div><p class="gone">1</p><p>2</p></div>"#);
        remove(&doc.select("p.gone"));
        assert_eq!(inner_html(&doc.select("div")).to_string(), "<p>2</p>");
    }

    #[test]
    fn test_prefixed_attributes_keep_their_prefix() {
        let doc = parse(r#"<svg><a xlink:href="/x" href="/y">t</a></svg>"#);
        let link = doc.select("a");

        let names: Vec<String> = get_all_attributes(&link).into_iter().map(|(k, _)| k).collect();
        assert!(names.contains(&"xlink:href".to_string()));

        retain_attributes(&link, |name| name == "href");
        assert_eq!(get_all_attributes(&link), vec![("href".to_string(), "/y".to_string())]);
    }

    #[test]
    fn test_replace_in_attributes() {
        let doc = parse(r#"<p title="a-b" class="b">x</p>"#);
        let p = doc.select("p");

        assert!(replace_in_attributes(&p, "b", "c"));
        assert_eq!(get_attribute(&p, "title"), Some("a-c".to_string()));
        assert_eq!(get_attribute(&p, "class"), Some("c".to_string()));
        assert!(!replace_in_attributes(&p, "zzz", ""));
    }

    #[test]
    fn test_remove_comments_keeps_siblings() {
        let doc = parse_fragment("<p>a<!-- x --></p><!-- y --><p>b</p>");
        let body = body(&doc).unwrap();

        assert_eq!(remove_comments(&body), 2);
        assert_eq!(inner_html(&body).to_string(), "<p>a</p><p>b</p>");
    }

    #[test]
    fn test_text_nodes_after_normalize() {
        let doc = parse_fragment("<p>a<b>b</b>c</p><pre>d</pre>");
        let body = body(&doc).unwrap();
        strip_tags(&body, &["b"]);
        normalize_text(&body);

        let texts: Vec<String> = text_nodes(&body).iter().map(|n| n.text().to_string()).collect();
        assert_eq!(texts, vec!["abc", "d"]);
        assert!(has_ancestor(&text_nodes(&body)[1], &["pre"]));
        assert!(!has_ancestor(&text_nodes(&body)[0], &["pre"]));
    }

    #[test]
    fn test_insert_and_append_text() {
        let doc = parse_fragment("<p>a</p>");
        let body = body(&doc).unwrap();
        let p = doc.select("p");
        let node = p.nodes()[0];

        append_text(&node, "b");
        insert_text_after(&node, "c");
        assert_eq!(inner_html(&body).to_string(), "<p>ab</p>c");
    }
}
