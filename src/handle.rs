//! The in-memory representation of one loaded image: path, dimensions, and
//! format, read once at load time.
//!
//! Loading is explicit and fallible — a missing, unreadable, or undecodable
//! file is a [`LoadError`] returned to the caller, never a silently empty
//! handle. The format is sniffed from file content, not trusted from the
//! extension.

use crate::format::{ImageFormat, UnsupportedFormat};
use image::ImageReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a recognizable image: {0}")]
    UnknownFormat(PathBuf),
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Metadata for one loaded image.
///
/// `width` and `height` are kept current by the owning driver after every
/// mutating operation and never drop below 1. The format (and with it the
/// MIME type) changes only when a save to a different extension succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    path: PathBuf,
    width: u32,
    height: u32,
    format: ImageFormat,
}

impl ImageHandle {
    /// Read image metadata from disk.
    ///
    /// Probes the file content for its format and reads the dimensions
    /// without decoding the full pixel data.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let path = std::fs::canonicalize(path)?;
        let reader = ImageReader::open(&path)?.with_guessed_format()?;
        let sniffed = reader
            .format()
            .ok_or_else(|| LoadError::UnknownFormat(path.clone()))?;
        let format = ImageFormat::try_from(sniffed)?;
        let (width, height) = reader.into_dimensions().map_err(|source| LoadError::Decode {
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            path,
            width: width.max(1),
            height: height.max(1),
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// MIME type, derived from the format.
    pub fn mime(&self) -> &'static str {
        self.format.mime()
    }

    /// Record new dimensions after a successful transform.
    pub(crate) fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
    }

    /// Record the format after a successful save to a different extension.
    pub(crate) fn set_format(&mut self, format: ImageFormat) {
        self.format = format;
    }

    /// Record the destination after a successful save-as.
    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }

    /// Handle with known metadata, bypassing the filesystem. Test-only.
    #[cfg(test)]
    pub(crate) fn synthetic(path: &str, width: u32, height: u32, format: ImageFormat) -> Self {
        Self {
            path: PathBuf::from(path),
            width: width.max(1),
            height: height.max(1),
            format,
        }
    }
}
