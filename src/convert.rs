//! End-to-end conversion pipelines.
//!
//! ODT: archive → styles → images → structure → page breaks → sanitizer.
//! HTML from an external converter skips straight to the last two stages.

use log::{debug, info};

use crate::archive::OdfArchive;
use crate::converter::Converter;
use crate::error::Result;
use crate::images::{extract_images, ExtractedImages, ImageStore};
use crate::options::Options;
use crate::pagebreak::normalize_pagebreaks;
use crate::result::{ConversionResult, ImageData};
use crate::sanitizer::sanitize;
use crate::styles::{generate_css, resolve_styles};

/// Convert an OpenDocument text package.
pub(crate) fn convert_odt_document(
    bytes: &[u8],
    options: &Options,
    store: &mut dyn ImageStore,
) -> Result<ConversionResult> {
    info!("Converting ODT package ({} bytes)", bytes.len());

    let mut archive = OdfArchive::open(bytes, options.max_document_size)?;
    let package = archive.read_package()?;
    let mut warnings = Vec::new();
    if package.styles.is_none() {
        debug!("No styles part, resolving from content only");
    }

    let table = resolve_styles(&package.content, package.styles.as_ref());
    debug!("Resolved {} styles", table.len());

    let extracted = match (&package.manifest, options.extract_images) {
        (Some(manifest), true) => extract_images(&mut archive, manifest, store, options),
        (None, true) => {
            debug!("No manifest, skipping image extraction");
            ExtractedImages::default()
        }
        (_, false) => ExtractedImages::default(),
    };
    warnings.extend(extracted.warnings);

    let mut converter = Converter::new(&table, &extracted.map, options.strict_numeric_attributes);
    let raw_html = converter.convert(&package.content)?;
    warnings.extend(converter.into_warnings());

    let html = finish_html(&raw_html, options);
    info!(
        "Converted ODT package: {} bytes of HTML, {} images, {} warnings",
        html.len(),
        extracted.images.len(),
        warnings.len()
    );

    Ok(ConversionResult {
        html,
        images: extracted.images,
        styles: generate_css(&table),
        warnings,
    })
}

/// Post-process HTML produced elsewhere.
pub(crate) fn convert_html_document(
    html: &str,
    images: Vec<ImageData>,
    options: &Options,
) -> ConversionResult {
    info!("Normalizing external HTML ({} bytes)", html.len());
    ConversionResult {
        html: finish_html(html, options),
        images,
        styles: String::new(),
        warnings: Vec::new(),
    }
}

fn finish_html(raw_html: &str, options: &Options) -> String {
    let normalized = normalize_pagebreaks(raw_html);
    debug!(
        "Page-break normalization: {} -> {} bytes",
        raw_html.len(),
        normalized.len()
    );
    sanitize(&normalized, &options.policy)
}
