//! Configuration options for document conversion.
//!
//! The `Options` struct controls conversion behavior: the sanitization
//! policy, image extraction, resource limits and how strictly malformed
//! numeric attributes are treated.

use crate::policy::Policy;

/// Configuration options for document conversion.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use docconv::{Options, Policy};
///
/// // Use defaults
/// let options = Options::default();
///
/// // Customize specific fields
/// let options = Options {
///     extract_images: false,
///     policy: Policy::with_tags("p,h1,h2,strong,em".split(',')),
///     ..Options::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Options {
    /// Allowlist enforced on the final HTML.
    ///
    /// Default: [`Policy::default()`]
    pub policy: Policy,

    /// Extract embedded images through the image store.
    ///
    /// When disabled no image is stored and every frame is dropped from the
    /// output.
    ///
    /// Default: `true`
    pub extract_images: bool,

    /// Fail the conversion on non-numeric outline levels and space counts.
    ///
    /// When disabled the offending value is logged and replaced by the
    /// attribute's default (level 1, one space).
    ///
    /// Default: `true`
    pub strict_numeric_attributes: bool,

    /// Maximum uncompressed size of any XML part (bytes).
    ///
    /// Default: `52428800` (50 MiB)
    pub max_document_size: usize,

    /// Maximum size of a single embedded image (bytes). Larger images are
    /// skipped.
    ///
    /// Default: `10485760` (10 MiB)
    pub max_image_size: usize,

    /// Prefix for the names proposed to the image store.
    ///
    /// Default: `"odt_image"`
    pub image_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            policy: Policy::default(),
            extract_images: true,
            strict_numeric_attributes: true,
            max_document_size: 50 * 1024 * 1024,
            max_image_size: 10 * 1024 * 1024,
            image_prefix: "odt_image".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let opts = Options::default();

        assert!(opts.extract_images);
        assert!(opts.strict_numeric_attributes);
        assert_eq!(opts.max_document_size, 52_428_800);
        assert_eq!(opts.max_image_size, 10_485_760);
        assert_eq!(opts.image_prefix, "odt_image");
        assert_eq!(opts.policy, Policy::default());
    }

    #[test]
    fn test_custom_options() {
        let opts = Options {
            extract_images: false,
            strict_numeric_attributes: false,
            max_image_size: 1024,
            ..Options::default()
        };

        assert!(!opts.extract_images);
        assert!(!opts.strict_numeric_attributes);
        assert_eq!(opts.max_image_size, 1024);
        assert_eq!(opts.max_document_size, 52_428_800);
    }
}
