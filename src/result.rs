//! Result types for conversion output.
//!
//! This module defines the structured output of a conversion: the final
//! HTML, the images that were stored for it, and the generated CSS.

use serde::{Deserialize, Serialize};

use crate::pagebreak::PAGEBREAK_MARKER;

/// One embedded image handed to the image store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageData {
    /// Name the store saved the image under.
    pub filename: String,

    /// Public URL returned by the store.
    pub url: String,

    /// Size of the stored bytes.
    pub size_bytes: usize,

    /// Media type declared in the package manifest (e.g. `image/png`).
    pub content_type: String,
}

/// Result of converting one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    /// Sanitized HTML fragment with page breaks as markers.
    pub html: String,

    /// Images referenced by `html`, in manifest order.
    pub images: Vec<ImageData>,

    /// One CSS rule per resolved style. Empty for HTML input.
    pub styles: String,

    /// Warnings encountered during conversion.
    ///
    /// Non-fatal issues such as:
    /// - An image that could not be read or stored
    /// - An optional package part that failed to parse
    /// - A numeric attribute replaced by its default
    pub warnings: Vec<String>,
}

impl ConversionResult {
    /// Whether the HTML contains at least one page-break marker.
    #[must_use]
    pub fn has_pagebreaks(&self) -> bool {
        self.html.contains(PAGEBREAK_MARKER)
    }

    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}
