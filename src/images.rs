//! Embedded image extraction and reference resolution.
//!
//! Images are found through the package manifest, handed to an
//! [`ImageStore`] which decides where they live, and collected into an
//! [`ImageMap`] from package path to public URL for the converter.
//!
//! Bytes are stored exactly as they appear in the package.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::archive::OdfArchive;
use crate::error::{Error, Result};
use crate::etree::{Element, Namespace};
use crate::options::Options;
use crate::result::ImageData;

/// Extensions kept as-is; any other image subtype is saved as `png`.
pub static KNOWN_IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Where a package image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub url: String,
    pub size: usize,
    pub content_type: String,
}

/// Package path (e.g. `Pictures/1.png`) to stored image.
pub type ImageMap = HashMap<String, ImageRef>;

/// What a store reports back for one saved image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub filename: String,
    pub url: String,
}

/// Destination for extracted image bytes.
pub trait ImageStore {
    /// Persist `bytes` under (roughly) `proposed_name` and return the public
    /// URL. Implementations may rename.
    fn store(&mut self, proposed_name: &str, bytes: &[u8], content_type: &str)
        -> Result<StoredImage>;
}

/// Keeps images in memory and hands out `memory:` URLs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    images: Vec<MemoryImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn images(&self) -> &[MemoryImage] {
        &self.images
    }

    /// Stored bytes by filename.
    #[must_use]
    pub fn get(&self, filename: &str) -> Option<&[u8]> {
        self.images
            .iter()
            .find(|img| img.filename == filename)
            .map(|img| img.bytes.as_slice())
    }
}

impl ImageStore for MemoryStore {
    fn store(
        &mut self,
        proposed_name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredImage> {
        let filename = proposed_name.to_string();
        if self.get(&filename).is_none() {
            self.images.push(MemoryImage {
                filename: filename.clone(),
                bytes: bytes.to_vec(),
                content_type: content_type.to_string(),
            });
        }
        Ok(StoredImage {
            url: format!("memory:{filename}"),
            filename,
        })
    }
}

/// Writes images into a media directory served under `url_prefix`.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    pub root: PathBuf,
    pub url_prefix: String,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            url_prefix: url_prefix.into(),
        }
    }
}

impl ImageStore for DirectoryStore {
    fn store(
        &mut self,
        proposed_name: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<StoredImage> {
        // Only the final path component; the name must not escape the root.
        let filename = Path::new(proposed_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::StorageError(format!("unusable image name {proposed_name:?}")))?
            .to_string();

        fs::create_dir_all(&self.root).map_err(|e| {
            Error::StorageError(format!("cannot create {}: {e}", self.root.display()))
        })?;
        let path = self.root.join(&filename);
        fs::write(&path, bytes)
            .map_err(|e| Error::StorageError(format!("cannot write {}: {e}", path.display())))?;

        Ok(StoredImage {
            url: format!("{}/{filename}", self.url_prefix.trim_end_matches('/')),
            filename,
        })
    }
}

/// File extension for an image media type.
#[must_use]
pub fn extension_for(media_type: &str) -> &'static str {
    let subtype = media_type.rsplit('/').next().unwrap_or_default();
    KNOWN_IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| ext.eq_ignore_ascii_case(subtype))
        .unwrap_or("png")
}

/// Content-addressed image name: `{prefix}_{stem}_{hash8}.{ext}`.
///
/// `stem` is reduced to alphanumerics, `-` and `_` (at most 50 chars).
#[must_use]
pub fn unique_filename(stem: &str, ext: &str, prefix: &str, bytes: &[u8]) -> String {
    let safe_stem: String = stem
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .take(50)
        .collect();
    let digest = sha1_smol::Sha1::from(bytes).hexdigest();
    let hash = &digest[..8];
    if prefix.is_empty() {
        format!("{safe_stem}_{hash}.{ext}")
    } else {
        format!("{prefix}_{safe_stem}_{hash}.{ext}")
    }
}

/// Images pulled out of one package.
#[derive(Debug, Clone, Default)]
pub struct ExtractedImages {
    /// Descriptors in manifest order.
    pub images: Vec<ImageData>,
    /// Lookup for the converter.
    pub map: ImageMap,
    /// One entry per skipped image.
    pub warnings: Vec<String>,
}

/// Store every `image/*` entry listed in `manifest`.
///
/// Unreadable, oversized or unstorable images are skipped with a warning;
/// none of them fails the conversion.
pub fn extract_images(
    archive: &mut OdfArchive<'_>,
    manifest: &Element,
    store: &mut dyn ImageStore,
    options: &Options,
) -> ExtractedImages {
    let mut out = ExtractedImages::default();

    for entry in manifest.find_all(&Namespace::Manifest, "file-entry") {
        let (Some(path), Some(media_type)) = (
            entry.attr(Namespace::Manifest, "full-path"),
            entry.attr(Namespace::Manifest, "media-type"),
        ) else {
            continue;
        };
        if !media_type.starts_with("image/") {
            continue;
        }

        match extract_one(archive, path, media_type, store, options) {
            Ok((data, image_ref)) => {
                debug!("Stored {path} as {} ({} bytes)", data.filename, data.size_bytes);
                out.map.insert(path.to_string(), image_ref);
                out.images.push(data);
            }
            Err(e) => {
                warn!("Skipping image {path}: {e}");
                out.warnings.push(format!("Skipped image {path}: {e}"));
            }
        }
    }

    out
}

fn extract_one(
    archive: &mut OdfArchive<'_>,
    path: &str,
    media_type: &str,
    store: &mut dyn ImageStore,
    options: &Options,
) -> Result<(ImageData, ImageRef)> {
    let bytes = archive
        .read_part_with_limit(path, options.max_image_size)?
        .ok_or_else(|| Error::FormatError(format!("{path} is listed but missing")))?;

    let ext = extension_for(media_type);
    let proposed = unique_filename("image", ext, &options.image_prefix, &bytes);
    let stored = store.store(&proposed, &bytes, media_type)?;

    let data = ImageData {
        filename: stored.filename,
        url: stored.url.clone(),
        size_bytes: bytes.len(),
        content_type: media_type.to_string(),
    };
    let image_ref = ImageRef {
        url: stored.url,
        size: bytes.len(),
        content_type: media_type.to_string(),
    };
    Ok((data, image_ref))
}
