//! Element Tree (etree) for OpenDocument XML parts
//!
//! A small owned tree following the text/tail model:
//! - **Text**: character data BEFORE the first child element
//! - **Tail**: character data AFTER the element's closing tag, up to the
//!   next sibling
//!
//! ```xml
//! <text:p>
//!   TEXT HERE                 <!-- p's "text" -->
//!   <text:span>inner</text:span>
//!   TAIL HERE                 <!-- span's "tail" -->
//! </text:p>
//! ```
//!
//! Names are resolved against their namespace URI while parsing, so every
//! lookup uses a typed [`QName`] rather than a prefix that a document is free
//! to rebind.

use std::collections::BTreeMap;
use std::fmt;

/// Namespaces the converter looks things up in.
///
/// Anything else is kept as [`Namespace::Other`] with its URI so that foreign
/// elements never collide with known ones that share a local name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Namespace {
    Office,
    Style,
    Text,
    Table,
    Draw,
    Fo,
    Svg,
    XLink,
    Manifest,
    Other(String),
    /// No namespace (unprefixed attributes, undeclared default namespace).
    Unqualified,
}

impl Namespace {
    pub const OFFICE_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:office:1.0";
    pub const STYLE_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:style:1.0";
    pub const TEXT_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:text:1.0";
    pub const TABLE_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:table:1.0";
    pub const DRAW_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:drawing:1.0";
    pub const FO_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0";
    pub const SVG_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0";
    pub const XLINK_URI: &'static str = "http://www.w3.org/1999/xlink";
    pub const MANIFEST_URI: &'static str = "urn:oasis:names:tc:opendocument:xmlns:manifest:1.0";

    /// Map a namespace URI to its variant.
    #[must_use]
    pub fn from_uri(uri: &str) -> Self {
        match uri {
            "" => Self::Unqualified,
            Self::OFFICE_URI => Self::Office,
            Self::STYLE_URI => Self::Style,
            Self::TEXT_URI => Self::Text,
            Self::TABLE_URI => Self::Table,
            Self::DRAW_URI => Self::Draw,
            Self::FO_URI => Self::Fo,
            Self::SVG_URI => Self::Svg,
            Self::XLINK_URI => Self::XLink,
            Self::MANIFEST_URI => Self::Manifest,
            other => Self::Other(other.to_string()),
        }
    }

    /// Conventional prefix, used for diagnostics only.
    #[must_use]
    pub fn prefix(&self) -> &str {
        match self {
            Self::Office => "office",
            Self::Style => "style",
            Self::Text => "text",
            Self::Table => "table",
            Self::Draw => "draw",
            Self::Fo => "fo",
            Self::Svg => "svg",
            Self::XLink => "xlink",
            Self::Manifest => "manifest",
            Self::Other(uri) => uri,
            Self::Unqualified => "",
        }
    }
}

/// A namespace-resolved name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub ns: Namespace,
    pub local: String,
}

impl QName {
    #[must_use]
    pub fn new(ns: Namespace, local: impl Into<String>) -> Self {
        Self {
            ns,
            local: local.into(),
        }
    }

    #[must_use]
    pub fn is(&self, ns: &Namespace, local: &str) -> bool {
        self.ns == *ns && self.local == local
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.ns {
            Namespace::Unqualified => f.write_str(&self.local),
            Namespace::Other(uri) => write!(f, "{{{uri}}}{}", self.local),
            ns => write!(f, "{}:{}", ns.prefix(), self.local),
        }
    }
}

/// One element of a parsed XML part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: QName,
    pub attrs: BTreeMap<QName, String>,
    pub children: Vec<Element>,
    pub text: String,
    pub tail: String,
}

impl Element {
    #[must_use]
    pub fn new(name: QName) -> Self {
        Self {
            name,
            attrs: BTreeMap::new(),
            children: Vec::new(),
            text: String::new(),
            tail: String::new(),
        }
    }

    #[must_use]
    pub fn is(&self, ns: &Namespace, local: &str) -> bool {
        self.name.is(ns, local)
    }

    /// Attribute value by resolved name.
    #[must_use]
    pub fn attr(&self, ns: Namespace, local: &str) -> Option<&str> {
        self.attrs
            .get(&QName::new(ns, local))
            .map(String::as_str)
    }

    /// First direct child with the given name.
    #[must_use]
    pub fn child(&self, ns: &Namespace, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(ns, local))
    }

    /// Direct children with the given name, in document order.
    pub fn children_named<'a>(
        &'a self,
        ns: &'a Namespace,
        local: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.is(ns, local))
    }

    /// First descendant (not including `self`) with the given name, pre-order.
    #[must_use]
    pub fn find(&self, ns: &Namespace, local: &str) -> Option<&Element> {
        for child in &self.children {
            if child.is(ns, local) {
                return Some(child);
            }
            if let Some(found) = child.find(ns, local) {
                return Some(found);
            }
        }
        None
    }

    /// All descendants (not including `self`) with the given name, pre-order.
    ///
    /// Matches nested occurrences too: a list item inside a nested list is
    /// returned alongside the outer items.
    #[must_use]
    pub fn find_all(&self, ns: &Namespace, local: &str) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_named(ns, local, &mut out);
        out
    }

    fn collect_named<'a>(&'a self, ns: &Namespace, local: &str, out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if child.is(ns, local) {
                out.push(child);
            }
            child.collect_named(ns, local, out);
        }
    }
}
