//! Image format identification: extensions, MIME types, and the mapping to
//! the `image` crate's detected formats.
//!
//! Only formats with a working encoder *and* decoder compiled in are
//! representable; anything else is an [`UnsupportedFormat`] error at load or
//! save time.

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported image format: {0}")]
pub struct UnsupportedFormat(pub String);

/// A raster format this crate can decode and encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Gif,
    Png,
}

/// Extension table, lowercase. `jpg` and `jpeg` are the same format.
const EXTENSIONS: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("gif", ImageFormat::Gif),
    ("png", ImageFormat::Png),
];

impl ImageFormat {
    /// Look up a format by file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Result<Self, UnsupportedFormat> {
        let ext = ext.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, f)| *f)
            .ok_or_else(|| UnsupportedFormat(ext))
    }

    /// Format for a destination path, falling back to `current` when the
    /// path has no extension. An unrecognized extension is an error.
    pub fn from_path_or(path: &Path, current: ImageFormat) -> Result<Self, UnsupportedFormat> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if !ext.is_empty() => Self::from_extension(ext),
            _ => Ok(current),
        }
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Gif => "gif",
            ImageFormat::Png => "png",
        }
    }

    /// MIME type, always in sync with the format.
    pub fn mime(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Png => "image/png",
        }
    }
}

impl TryFrom<image::ImageFormat> for ImageFormat {
    type Error = UnsupportedFormat;

    /// Bridge from the `image` crate's content-sniffed format.
    fn try_from(format: image::ImageFormat) -> Result<Self, UnsupportedFormat> {
        match format {
            image::ImageFormat::Jpeg => Ok(ImageFormat::Jpeg),
            image::ImageFormat::Gif => Ok(ImageFormat::Gif),
            image::ImageFormat::Png => Ok(ImageFormat::Png),
            other => Err(UnsupportedFormat(format!("{other:?}").to_lowercase())),
        }
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Gif => image::ImageFormat::Gif,
            ImageFormat::Png => image::ImageFormat::Png,
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}
