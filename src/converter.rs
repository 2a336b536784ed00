//! Structural converter: OpenDocument text body to HTML.
//!
//! Each direct child of `office:text` is classified into an [`ElementKind`]
//! and rendered on its own; unknown elements render as nothing. Inline
//! content (spans, breaks, spaces, tabs, frames) is flattened by
//! [`Converter::text_content`], which keeps every element's tail text in
//! place.
//!
//! Output is raw HTML: page breaks still appear as inline `page-break-*`
//! styles and soft page breaks as markers. The page-break normalizer and
//! the sanitizer run afterwards.

use log::{debug, warn};
use quick_xml::escape::{escape, partial_escape};

use crate::error::{Error, Result};
use crate::etree::{Element, Namespace};
use crate::images::ImageMap;
use crate::pagebreak::PAGEBREAK_MARKER;
use crate::styles::StyleTable;

/// Pixels per centimeter at 96 DPI.
pub const PX_PER_CM: f64 = 37.8;

/// What a tab character renders as.
pub const TAB_SPACES: &str = "    ";

/// Largest `text:c` honored on `text:s`; anything above is unusable.
pub const MAX_SPACE_RUN: usize = 65_535;

/// Block-level elements found directly under `office:text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Paragraph,
    Heading,
    List,
    Table,
    Frame,
    SoftPageBreak,
    Unrecognized,
}

impl ElementKind {
    #[must_use]
    pub fn of(elem: &Element) -> Self {
        match (&elem.name.ns, elem.name.local.as_str()) {
            (Namespace::Text, "p") => Self::Paragraph,
            (Namespace::Text, "h") => Self::Heading,
            (Namespace::Text, "list") => Self::List,
            (Namespace::Table, "table") => Self::Table,
            (Namespace::Draw, "frame") => Self::Frame,
            (Namespace::Text, "soft-page-break") => Self::SoftPageBreak,
            _ => Self::Unrecognized,
        }
    }
}

/// Children of paragraphs, headings and spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineKind {
    Span,
    Frame,
    LineBreak,
    Space,
    Tab,
    /// Contributes only its tail text.
    Other,
}

impl InlineKind {
    #[must_use]
    pub fn of(elem: &Element) -> Self {
        match (&elem.name.ns, elem.name.local.as_str()) {
            (Namespace::Text, "span") => Self::Span,
            (Namespace::Draw, "frame") => Self::Frame,
            (Namespace::Text, "line-break") => Self::LineBreak,
            (Namespace::Text, "s") => Self::Space,
            (Namespace::Text, "tab") => Self::Tab,
            _ => Self::Other,
        }
    }
}

/// Locate `office:body/office:text` in a parsed `content.xml`.
pub fn find_text_body(content: &Element) -> Result<&Element> {
    content
        .find(&Namespace::Office, "body")
        .and_then(|body| body.child(&Namespace::Office, "text"))
        .ok_or_else(|| Error::FormatError("document has no office:body/office:text".to_string()))
}

/// Convert an ODF length to an HTML dimension.
///
/// Centimeters become whole pixels (truncated). Other units, and `cm`
/// values that are not numbers, are returned unchanged.
#[must_use]
pub fn convert_dimension(dim: &str) -> String {
    if let Some(number) = dim.strip_suffix("cm") {
        if let Ok(cm) = number.trim().parse::<f64>() {
            return format!("{}", (cm * PX_PER_CM) as i64);
        }
    }
    dim.to_string()
}

/// Walks one document body. Holds the per-conversion lookup tables and
/// collects warnings for lenient fallbacks.
#[derive(Debug)]
pub struct Converter<'a> {
    styles: &'a StyleTable,
    images: &'a ImageMap,
    strict: bool,
    warnings: Vec<String>,
}

impl<'a> Converter<'a> {
    /// `strict` makes malformed numeric attributes fatal instead of
    /// defaulted.
    #[must_use]
    pub fn new(styles: &'a StyleTable, images: &'a ImageMap, strict: bool) -> Self {
        Self {
            styles,
            images,
            strict,
            warnings: Vec::new(),
        }
    }

    /// Render the text body of `content` (the parsed `content.xml` root).
    pub fn convert(&mut self, content: &Element) -> Result<String> {
        let body = find_text_body(content)?;
        let mut html = String::new();
        for child in &body.children {
            html.push_str(&self.convert_element(child)?);
        }
        debug!(
            "Converted {} body elements into {} bytes of HTML",
            body.children.len(),
            html.len()
        );
        Ok(html)
    }

    /// Warnings collected so far.
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    #[must_use]
    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    /// Render one block-level element.
    pub fn convert_element(&mut self, elem: &Element) -> Result<String> {
        match ElementKind::of(elem) {
            ElementKind::Paragraph => self.convert_paragraph(elem),
            ElementKind::Heading => self.convert_heading(elem),
            ElementKind::List => self.convert_list(elem),
            ElementKind::Table => self.convert_table(elem),
            ElementKind::Frame => Ok(self.convert_frame(elem)),
            ElementKind::SoftPageBreak => Ok(PAGEBREAK_MARKER.to_string()),
            ElementKind::Unrecognized => Ok(String::new()),
        }
    }

    fn convert_paragraph(&mut self, para: &Element) -> Result<String> {
        let style = para
            .attr(Namespace::Text, "style-name")
            .and_then(|name| self.styles.get(name))
            .map(|props| props.to_inline())
            .unwrap_or_default();
        let content = self.text_content(para)?;

        if style.is_empty() {
            Ok(format!("<p>{content}</p>"))
        } else {
            Ok(format!("<p style=\"{}\">{content}</p>", escape(style.as_str())))
        }
    }

    fn convert_heading(&mut self, heading: &Element) -> Result<String> {
        let level = match heading.attr(Namespace::Text, "outline-level") {
            None => 1,
            Some(raw) => self.parse_number(heading, "text:outline-level", raw, 1, usize::MAX)?,
        };
        if !(1..=6).contains(&level) {
            debug!("Heading level {level} is outside h1-h6, emitting as-is");
        }
        let content = self.text_content(heading)?;
        Ok(format!("<h{level}>{content}</h{level}>"))
    }

    fn convert_list(&mut self, list: &Element) -> Result<String> {
        let mut html = String::from("<ul>");
        for item in list.find_all(&Namespace::Text, "list-item") {
            html.push_str("<li>");
            for para in item.children_named(&Namespace::Text, "p") {
                html.push_str(&self.text_content(para)?);
            }
            html.push_str("</li>");
        }
        html.push_str("</ul>");
        Ok(html)
    }

    fn convert_table(&mut self, table: &Element) -> Result<String> {
        let mut html = String::from("<table>");
        for row in table.find_all(&Namespace::Table, "table-row") {
            html.push_str("<tr>");
            for cell in row.find_all(&Namespace::Table, "table-cell") {
                html.push_str("<td>");
                for para in cell.children_named(&Namespace::Text, "p") {
                    html.push_str("<p>");
                    html.push_str(&self.text_content(para)?);
                    html.push_str("</p>");
                }
                html.push_str("</td>");
            }
            html.push_str("</tr>");
        }
        html.push_str("</table>");
        Ok(html)
    }

    /// `<img>` for a frame whose image was stored, otherwise nothing.
    fn convert_frame(&self, frame: &Element) -> String {
        let Some(href) = frame
            .find(&Namespace::Draw, "image")
            .and_then(|image| image.attr(Namespace::XLink, "href"))
        else {
            return String::new();
        };
        let Some(image) = self.images.get(href) else {
            debug!("Dropping frame for unresolved image {href}");
            return String::new();
        };

        let mut html = format!("<img src=\"{}\"", escape(image.url.as_str()));
        for (attr, name) in [("width", "width"), ("height", "height")] {
            if let Some(dim) = frame.attr(Namespace::Svg, name) {
                let px = convert_dimension(dim);
                html.push_str(&format!(" {attr}=\"{}\"", escape(px.as_str())));
            }
        }
        html.push_str(" alt=\"\">");
        html
    }

    /// Flattened inline content: own text, then each child's rendering
    /// followed by its tail.
    pub fn text_content(&mut self, elem: &Element) -> Result<String> {
        let mut out = String::new();
        out.push_str(&partial_escape(elem.text.as_str()));

        for child in &elem.children {
            match InlineKind::of(child) {
                InlineKind::Span => out.push_str(&self.convert_span(child)?),
                InlineKind::Frame => out.push_str(&self.convert_frame(child)),
                InlineKind::LineBreak => out.push_str("<br>"),
                InlineKind::Space => {
                    let count = match child.attr(Namespace::Text, "c") {
                        None => 1,
                        Some(raw) => self.parse_number(child, "text:c", raw, 1, MAX_SPACE_RUN)?,
                    };
                    out.push_str(&" ".repeat(count));
                }
                InlineKind::Tab => out.push_str(TAB_SPACES),
                InlineKind::Other => {}
            }
            out.push_str(&partial_escape(child.tail.as_str()));
        }

        Ok(out)
    }

    /// Span content wrapped `<strong>`, then `<em>`, then `<u>` as its
    /// style asks.
    fn convert_span(&mut self, span: &Element) -> Result<String> {
        let mut text = self.text_content(span)?;
        let Some(props) = span
            .attr(Namespace::Text, "style-name")
            .and_then(|name| self.styles.get(name))
        else {
            return Ok(text);
        };

        if props.is_bold() {
            text = format!("<strong>{text}</strong>");
        }
        if props.is_italic() {
            text = format!("<em>{text}</em>");
        }
        if props.is_underlined() {
            text = format!("<u>{text}</u>");
        }
        Ok(text)
    }

    /// Parse a numeric attribute. Values that do not parse, or exceed `max`,
    /// are an error in strict mode and `default` otherwise.
    fn parse_number(
        &mut self,
        elem: &Element,
        attribute: &str,
        raw: &str,
        default: usize,
        max: usize,
    ) -> Result<usize> {
        match raw.trim().parse::<usize>() {
            Ok(n) if n <= max => Ok(n),
            _ if self.strict => Err(Error::ElementDataError {
                element: elem.name.to_string(),
                attribute: attribute.to_string(),
                value: raw.to_string(),
            }),
            _ => {
                warn!("Invalid {attribute}={raw:?} on <{}>, using {default}", elem.name);
                self.warnings.push(format!(
                    "Invalid {attribute} value {raw:?} on <{}> replaced by {default}",
                    elem.name
                ));
                Ok(default)
            }
        }
    }
}
