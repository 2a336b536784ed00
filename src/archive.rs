//! OpenDocument package reader.
//!
//! Opens the zip container, pulls out the XML parts the converter needs and
//! parses them into [`Element`] trees with resolved namespaces.
//!
//! `content.xml` is required. `styles.xml` and `META-INF/manifest.xml` are
//! optional: a package without them converts with an empty style table or
//! no images.

use std::io::{Cursor, Read};

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::etree::{Element, Namespace, QName};

/// Main document body part.
pub const CONTENT_PART: &str = "content.xml";

/// Common and automatic styles shared by the document.
pub const STYLES_PART: &str = "styles.xml";

/// Package manifest listing every file with its media type.
pub const MANIFEST_PART: &str = "META-INF/manifest.xml";

/// Deepest element nesting accepted in a part. The converter walks the
/// tree recursively, so deeper input is rejected instead of exhausting the
/// stack.
pub const MAX_DEPTH: usize = 256;

/// The parsed XML parts of one package.
#[derive(Debug, Clone)]
pub struct Package {
    pub content: Element,
    pub styles: Option<Element>,
    pub manifest: Option<Element>,
}

/// An opened OpenDocument container.
pub struct OdfArchive<'a> {
    zip: ZipArchive<Cursor<&'a [u8]>>,
    max_part_size: usize,
}

impl<'a> OdfArchive<'a> {
    /// Open a container from an in-memory buffer.
    ///
    /// Parts whose uncompressed size exceeds `max_part_size` are refused
    /// before they are inflated.
    pub fn open(bytes: &'a [u8], max_part_size: usize) -> Result<Self> {
        let zip = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::FormatError(format!("not a readable container: {e}")))?;
        debug!("opened container with {} entries", zip.len());
        Ok(Self {
            zip,
            max_part_size,
        })
    }

    /// Read a part's bytes. `Ok(None)` when the part does not exist.
    pub fn read_part(&mut self, name: &str) -> Result<Option<Vec<u8>>> {
        self.read_part_with_limit(name, self.max_part_size)
    }

    /// Like [`read_part`](Self::read_part) with a caller-chosen size limit.
    pub fn read_part_with_limit(&mut self, name: &str, limit: usize) -> Result<Option<Vec<u8>>> {
        let limit = limit as u64;
        let file = match self.zip.by_name(name) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::FormatError(format!("cannot read {name}: {e}"))),
        };

        if file.size() > limit {
            return Err(Error::FormatError(format!(
                "{name} is {} bytes, limit is {limit}",
                file.size()
            )));
        }

        let mut contents = Vec::new();
        // Declared sizes can lie; never inflate past the limit.
        file.take(limit + 1)
            .read_to_end(&mut contents)
            .map_err(|e| Error::FormatError(format!("cannot inflate {name}: {e}")))?;
        if contents.len() as u64 > limit {
            return Err(Error::FormatError(format!(
                "{name} exceeds the {limit} byte limit"
            )));
        }
        Ok(Some(contents))
    }

    /// Read and parse an XML part. `Ok(None)` when the part does not exist.
    pub fn parse_part(&mut self, name: &str) -> Result<Option<Element>> {
        match self.read_part(name)? {
            Some(bytes) => parse_xml(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Read the three XML parts the converter consumes.
    ///
    /// A missing or broken `content.xml` is fatal. Problems with the optional
    /// parts are logged and the part is treated as absent.
    pub fn read_package(&mut self) -> Result<Package> {
        let content = self
            .parse_part(CONTENT_PART)?
            .ok_or_else(|| Error::FormatError(format!("missing required part {CONTENT_PART}")))?;

        let styles = self.optional_part(STYLES_PART);
        let manifest = self.optional_part(MANIFEST_PART);

        Ok(Package {
            content,
            styles,
            manifest,
        })
    }

    fn optional_part(&mut self, name: &str) -> Option<Element> {
        match self.parse_part(name) {
            Ok(part) => part,
            Err(e) => {
                warn!("ignoring optional part {name}: {e}");
                None
            }
        }
    }
}

/// Parse an XML document into an element tree.
///
/// Whitespace is preserved: in mixed content it belongs to the text or tail
/// of the surrounding elements.
pub fn parse_xml(bytes: &[u8]) -> Result<Element> {
    let content = std::str::from_utf8(strip_bom(bytes))
        .map_err(|e| Error::FormatError(format!("part is not UTF-8: {e}")))?;

    let mut reader = Reader::from_str(content);
    let mut scopes = NamespaceScopes::default();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                check_depth(stack.len() + 1)?;
                let element = open_element(&e, &mut scopes)?;
                stack.push(element);
            }
            Ok(Event::Empty(e)) => {
                check_depth(stack.len() + 1)?;
                let element = open_element(&e, &mut scopes)?;
                scopes.pop();
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                scopes.pop();
                let element = stack
                    .pop()
                    .ok_or_else(|| Error::FormatError("unbalanced end tag".into()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Text(e)) => push_text(&mut stack, &String::from_utf8_lossy(e.as_ref())),
            Ok(Event::CData(e)) => push_text(&mut stack, &String::from_utf8_lossy(e.as_ref())),
            Ok(Event::GeneralRef(e)) => {
                let entity = String::from_utf8_lossy(e.as_ref());
                let resolved = resolve_entity(&entity).ok_or_else(|| {
                    Error::FormatError(format!("unknown entity reference &{entity};"))
                })?;
                push_text(&mut stack, &resolved);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::FormatError(format!(
                    "XML error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::FormatError("unexpected end of XML part".into()));
    }
    root.ok_or_else(|| Error::FormatError("XML part has no root element".into()))
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::FormatError(format!(
            "elements nested deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

/// Places a finished element under its parent, or makes it the root.
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(Error::FormatError("multiple root elements".into()))
    }
}

/// Text goes to the open element's text until it has a child, then to the
/// last child's tail.
fn push_text(stack: &mut [Element], text: &str) {
    let Some(current) = stack.last_mut() else {
        // Prolog/epilog whitespace.
        return;
    };
    match current.children.last_mut() {
        Some(last) => last.tail.push_str(text),
        None => current.text.push_str(text),
    }
}

fn open_element(start: &BytesStart<'_>, scopes: &mut NamespaceScopes) -> Result<Element> {
    let mut plain_attrs = Vec::new();
    let mut declared = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::FormatError(format!("malformed attribute: {e}")))?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::FormatError(format!("attribute name is not UTF-8: {e}")))?
            .to_string();
        let raw = std::str::from_utf8(&attr.value)
            .map_err(|e| Error::FormatError(format!("attribute value is not UTF-8: {e}")))?;
        let value = quick_xml::escape::unescape(raw)
            .map_err(|e| Error::FormatError(format!("bad escape in {key}: {e}")))?
            .into_owned();

        if key == "xmlns" {
            declared.push((String::new(), value));
        } else if let Some(prefix) = key.strip_prefix("xmlns:") {
            declared.push((prefix.to_string(), value));
        } else {
            plain_attrs.push((key, value));
        }
    }
    scopes.push(declared);

    let tag = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| Error::FormatError(format!("element name is not UTF-8: {e}")))?
        .to_string();
    let (prefix, local) = split_qname(&tag);
    let ns = match prefix {
        Some(p) => scopes.resolve(p)?,
        None => scopes.default_namespace(),
    };
    let mut element = Element::new(QName::new(ns, local));

    for (key, value) in plain_attrs {
        let (prefix, local) = split_qname(&key);
        // Unprefixed attributes are in no namespace, whatever the default is.
        let ns = match prefix {
            Some(p) => scopes.resolve(p)?,
            None => Namespace::Unqualified,
        };
        element.attrs.insert(QName::new(ns, local), value);
    }

    Ok(element)
}

fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

/// In-scope namespace declarations, innermost last.
#[derive(Debug, Default)]
struct NamespaceScopes {
    bindings: Vec<(String, String)>,
    frames: Vec<usize>,
}

impl NamespaceScopes {
    const XML_URI: &'static str = "http://www.w3.org/XML/1998/namespace";

    fn push(&mut self, declared: Vec<(String, String)>) {
        self.frames.push(declared.len());
        self.bindings.extend(declared);
    }

    fn pop(&mut self) {
        if let Some(count) = self.frames.pop() {
            let keep = self.bindings.len().saturating_sub(count);
            self.bindings.truncate(keep);
        }
    }

    fn lookup(&self, prefix: &str) -> Option<&str> {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }

    fn resolve(&self, prefix: &str) -> Result<Namespace> {
        if prefix == "xml" {
            return Ok(Namespace::Other(Self::XML_URI.to_string()));
        }
        self.lookup(prefix)
            .map(Namespace::from_uri)
            .ok_or_else(|| Error::FormatError(format!("undeclared namespace prefix {prefix:?}")))
    }

    fn default_namespace(&self) -> Namespace {
        self.lookup("").map_or(Namespace::Unqualified, Namespace::from_uri)
    }
}

/// Resolve XML entity and character references.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(|c| c.to_string())
}

/// Strip UTF-8 BOM (byte order mark) if present
fn strip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const NS_DECL: &str = r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0""#;

    fn build_zip(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_parse_text_and_tail() {
        let xml = format!(
            r#"<text:p {NS_DECL}>Hello <text:span>big</text:span> world<text:s/>!</text:p>"#
        );
        let root = parse_xml(xml.as_bytes()).unwrap();

        assert!(root.is(&Namespace::Text, "p"));
        assert_eq!(root.text, "Hello ");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].text, "big");
        assert_eq!(root.children[0].tail, " world");
        assert_eq!(root.children[1].tail, "!");
    }

    #[test]
    fn test_prefix_rebinding_resolves_to_uri() {
        let xml = r#"<t:p xmlns:t="urn:oasis:names:tc:opendocument:xmlns:text:1.0" t:style-name="P1"/>"#;
        let root = parse_xml(xml.as_bytes()).unwrap();

        assert!(root.is(&Namespace::Text, "p"));
        assert_eq!(root.attr(Namespace::Text, "style-name"), Some("P1"));
    }

    #[test]
    fn test_entities_and_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(
            format!(r#"<text:p {NS_DECL} text:style-name="a&amp;b">5 &lt; 6 &#x41;</text:p>"#)
                .as_bytes(),
        );
        let root = parse_xml(&bytes).unwrap();

        assert_eq!(root.text, "5 < 6 A");
        assert_eq!(root.attr(Namespace::Text, "style-name"), Some("a&b"));
    }

    #[test]
    fn test_undeclared_prefix_is_format_error() {
        let result = parse_xml(b"<text:p>x</text:p>");
        assert!(matches!(result, Err(Error::FormatError(_))));
    }

    #[test]
    fn test_truncated_xml_is_format_error() {
        let xml = format!("<text:p {NS_DECL}><text:span>open");
        assert!(matches!(parse_xml(xml.as_bytes()), Err(Error::FormatError(_))));
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| {
            format!(
                "<text:p {NS_DECL}>{}x{}</text:p>",
                "<text:span>".repeat(depth - 1),
                "</text:span>".repeat(depth - 1)
            )
        };
        assert!(parse_xml(nested(MAX_DEPTH).as_bytes()).is_ok());
        assert!(matches!(
            parse_xml(nested(MAX_DEPTH + 1).as_bytes()),
            Err(Error::FormatError(_))
        ));

        let empty_leaf = format!(
            "<text:p {NS_DECL}>{}<text:s/>{}</text:p>",
            "<text:span>".repeat(MAX_DEPTH - 1),
            "</text:span>".repeat(MAX_DEPTH - 1)
        );
        assert!(matches!(parse_xml(empty_leaf.as_bytes()), Err(Error::FormatError(_))));
    }

    #[test]
    fn test_package_requires_content() {
        let bytes = build_zip(&[("styles.xml", "<a/>")]);
        let mut archive = OdfArchive::open(&bytes, 1024).unwrap();
        assert!(matches!(archive.read_package(), Err(Error::FormatError(_))));
    }

    #[test]
    fn test_package_optional_parts_degrade() {
        let content = format!("<office:document-content {NS_DECL}/>");
        let bytes = build_zip(&[(CONTENT_PART, content.as_str()), (STYLES_PART, "<broken")]);
        let mut archive = OdfArchive::open(&bytes, 1024).unwrap();
        let package = archive.read_package().unwrap();

        assert!(package.content.is(&Namespace::Office, "document-content"));
        assert!(package.styles.is_none());
        assert!(package.manifest.is_none());
    }

    #[test]
    fn test_oversized_part_refused() {
        let content = format!("<office:document-content {NS_DECL}>{}</office:document-content>", "x".repeat(200));
        let bytes = build_zip(&[(CONTENT_PART, content.as_str())]);
        let mut archive = OdfArchive::open(&bytes, 64).unwrap();
        assert!(matches!(archive.read_package(), Err(Error::FormatError(_))));
    }

    #[test]
    fn test_garbage_is_not_a_container() {
        assert!(matches!(
            OdfArchive::open(b"definitely not a zip", 1024),
            Err(Error::FormatError(_))
        ));
    }
}
