//! The backend capability contract and shared driver plumbing.
//!
//! [`ImageDriver`] is the full operation set every backend implements:
//! resize, crop, rotate, flip, sharpen, reflection, watermark, background,
//! save, and render. Each mutating operation resolves its parameters through
//! [`geometry`](crate::geometry) first, then performs the backend-specific
//! transform; on success the driver's [`ImageHandle`] reflects the new
//! dimensions, on failure prior state is left untouched.
//!
//! The production backends are [`RasterDriver`](crate::raster::RasterDriver)
//! (direct pixel-buffer manipulation) and [`WarpDriver`](crate::warp::WarpDriver)
//! (affine-transform engine). Both share the decode/encode helpers here, so
//! format handling and quality semantics cannot drift between them.

use crate::format::{ImageFormat, UnsupportedFormat};
use crate::geometry::SaveError;
use crate::handle::{ImageHandle, LoadError};
use crate::params::{Constraint, FlipDirection, Offset, Quality, Rgb};
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{DynamicImage, ExtendedColorType, ImageReader};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("operation not supported by this driver: {operation}")]
    Unsupported { operation: &'static str },
}

/// One image-manipulation backend bound to one loaded image.
///
/// A driver exclusively owns its pixel buffer; the buffer is materialized
/// lazily from the source file on the first mutating operation and released
/// when the driver is dropped. Drivers are not safe for concurrent mutation —
/// callers serialize access externally.
pub trait ImageDriver {
    /// Metadata for the image this driver operates on.
    fn handle(&self) -> &ImageHandle;

    /// Resize the image. Either dimension can be omitted and is recomputed
    /// from the aspect ratio according to the constraint.
    fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        constraint: Constraint,
    ) -> Result<(), DriverError>;

    /// Crop to the given window. Offsets default to centered; see
    /// [`Offset`] for edge-relative placement.
    fn crop(
        &mut self,
        width: u32,
        height: u32,
        offset_x: Offset,
        offset_y: Offset,
    ) -> Result<(), DriverError>;

    /// Rotate clockwise by the given degrees. The canvas grows to the
    /// rotated bounding box; uncovered corners become transparent.
    fn rotate(&mut self, degrees: i32) -> Result<(), DriverError>;

    /// Mirror along the given axis.
    fn flip(&mut self, direction: FlipDirection) -> Result<(), DriverError>;

    /// Sharpen by an amount in `1..=100`.
    fn sharpen(&mut self, amount: u32) -> Result<(), DriverError>;

    /// Append a fading reflection below the image.
    fn reflection(
        &mut self,
        height: Option<u32>,
        opacity: u32,
        fade_in: bool,
    ) -> Result<(), DriverError>;

    /// Composite another image over this one.
    fn watermark(
        &mut self,
        mark: &ImageHandle,
        offset_x: Offset,
        offset_y: Offset,
        opacity: u32,
    ) -> Result<(), DriverError>;

    /// Fill transparent areas with a background color.
    fn background(&mut self, color: Rgb, opacity: u32) -> Result<(), DriverError>;

    /// Persist the image. The path defaults to the source path; the output
    /// format follows the destination extension, and the handle's format is
    /// updated only after a successful write.
    fn save(&mut self, path: Option<&Path>, quality: u32) -> Result<(), DriverError>;

    /// Encode the image to memory in the requested format (defaults to the
    /// current format).
    fn render(&mut self, format: Option<ImageFormat>, quality: u32)
    -> Result<Vec<u8>, DriverError>;
}

/// Decode the full pixel data for a handle's source file.
///
/// Used by both drivers to materialize the working buffer on first mutation.
pub(crate) fn load_pixels(path: &Path) -> Result<DynamicImage, DriverError> {
    let image = ImageReader::open(path)
        .map_err(LoadError::Io)?
        .with_guessed_format()
        .map_err(LoadError::Io)?
        .decode()
        .map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(image)
}

/// Encode an image with the quality semantics of each format's encoder.
///
/// JPEG honors the quality value. GIF has no quality concept and ignores it.
/// PNG maps "quality" onto a fixed best-compression setting — the value the
/// caller passed is deliberately not consulted.
pub(crate) fn encode_image<W: Write>(
    image: &DynamicImage,
    writer: W,
    format: ImageFormat,
    quality: Quality,
) -> Result<(), DriverError> {
    match format {
        ImageFormat::Jpeg => {
            // JPEG carries no alpha channel; flatten before encoding
            let encoder = JpegEncoder::new_with_quality(writer, quality.value() as u8);
            image
                .to_rgb8()
                .write_with_encoder(encoder)
                .map_err(|e| DriverError::Encode(format!("jpeg: {e}")))
        }
        ImageFormat::Png => {
            let encoder =
                PngEncoder::new_with_quality(writer, CompressionType::Best, PngFilterType::Adaptive);
            image
                .write_with_encoder(encoder)
                .map_err(|e| DriverError::Encode(format!("png: {e}")))
        }
        ImageFormat::Gif => {
            let rgba = image.to_rgba8();
            let (width, height) = rgba.dimensions();
            GifEncoder::new(writer)
                .encode(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
                .map_err(|e| DriverError::Encode(format!("gif: {e}")))
        }
    }
}
