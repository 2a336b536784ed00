//! # docconv
//!
//! Office document to sanitized HTML conversion.
//!
//! OpenDocument text packages (`.odt`) are converted structurally:
//! paragraphs, headings, lists, tables, inline formatting and images are
//! mapped onto a small HTML vocabulary. Page breaks, however they were
//! expressed, become one marker comment, `<!-- pagebreak -->`, which
//! survives sanitization. HTML produced by another converter can be run
//! through the same page-break and sanitization stages.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docconv::{convert_odt, MemoryStore, Options};
//!
//! let bytes = std::fs::read("report.odt")?;
//! let mut store = MemoryStore::new();
//! let result = convert_odt(&bytes, &Options::default(), &mut store)?;
//! println!("{}", result.html);
//! println!("{} images, page breaks: {}", result.image_count(), result.has_pagebreaks());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Pipeline
//!
//! - **Archive Reader** ([`archive`]): zip container → namespace-aware trees
//! - **Style Resolver** ([`styles`]): style definitions → name/CSS table
//! - **Image Resolver** ([`images`]): manifest images → [`ImageStore`] URLs
//! - **Structural Converter** ([`converter`]): text body → raw HTML
//! - **Pagebreak Normalizer** ([`pagebreak`]): every break → marker
//! - **Sanitizer** ([`sanitizer`]): allowlist [`Policy`] enforcement

mod convert;
mod error;
mod options;
mod patterns;
mod result;

/// DOM operations adapter over `dom_query`.
pub mod dom;

/// Namespace-aware element tree with text/tail model.
pub mod etree;

/// Zip container access and XML part parsing.
pub mod archive;

/// Style table resolution and CSS generation.
pub mod styles;

/// Embedded image extraction and storage.
pub mod images;

/// OpenDocument body to HTML conversion.
pub mod converter;

/// Page-break normalization to the canonical marker.
pub mod pagebreak;

/// Inline CSS declaration parsing and value safety checks.
pub mod css;

/// Sanitization allowlist.
pub mod policy;

/// Allowlist sanitizer.
pub mod sanitizer;

// Public API - re-exports
pub use error::{Error, Result};
pub use images::{DirectoryStore, ImageStore, MemoryStore};
pub use options::Options;
pub use pagebreak::{normalize_pagebreaks, PAGEBREAK_MARKER};
pub use policy::Policy;
pub use result::{ConversionResult, ImageData};
pub use sanitizer::sanitize;
pub use styles::generate_css;

/// Converts an OpenDocument text package into sanitized HTML.
///
/// Images listed in the package manifest are handed to `store`; the returned
/// HTML references them by the URLs the store reports.
///
/// # Errors
///
/// Returns [`Error::FormatError`] when the container or `content.xml` is
/// unreadable or the document has no text body, and
/// [`Error::ElementDataError`] for malformed numeric attributes when
/// [`Options::strict_numeric_attributes`] is set. Image problems never fail
/// the conversion; they are reported in [`ConversionResult::warnings`].
///
/// # Example
///
/// ```rust,no_run
/// use docconv::{convert_odt, DirectoryStore, Options};
///
/// let bytes = std::fs::read("letter.odt")?;
/// let mut store = DirectoryStore::new("public/media", "/media");
/// let options = Options {
///     strict_numeric_attributes: false,
///     ..Options::default()
/// };
/// let result = convert_odt(&bytes, &options, &mut store)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn convert_odt(
    bytes: &[u8],
    options: &Options,
    store: &mut dyn ImageStore,
) -> Result<ConversionResult> {
    convert::convert_odt_document(bytes, options, store)
}

/// Normalizes page breaks in and sanitizes HTML produced by an external
/// converter.
///
/// `images` is the descriptor list that converter reported and is passed
/// through unchanged. The result has no generated styles.
///
/// # Example
///
/// ```rust
/// use docconv::{convert_html, Options, PAGEBREAK_MARKER};
///
/// let html = r#"<p>One</p><br style="page-break-before: always"><p onclick="x()">Two</p>"#;
/// let result = convert_html(html, Vec::new(), &Options::default());
/// assert_eq!(result.html, format!("<p>One</p>\n{PAGEBREAK_MARKER}\n<p>Two</p>"));
/// ```
#[must_use]
pub fn convert_html(html: &str, images: Vec<ImageData>, options: &Options) -> ConversionResult {
    convert::convert_html_document(html, images, options)
}
