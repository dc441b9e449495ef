//! Software rasterizer backend — direct pixel-buffer manipulation.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode | `image` crate (`ImageReader`, content-sniffed) |
//! | Resize | `image::imageops` Lanczos3, nearest-neighbor halving pre-pass |
//! | Crop | `DynamicImage::crop_imm` |
//! | Rotate | `imageproc::geometric_transformations::warp_into` (bilinear) |
//! | Flip | `DynamicImage::fliph` / `flipv` |
//! | Encode (JPEG, PNG, GIF) | shared [`driver`](crate::driver) encoders |

use crate::driver::{DriverError, ImageDriver, encode_image, load_pixels};
use crate::format::ImageFormat;
use crate::geometry;
use crate::handle::ImageHandle;
use crate::params::{Constraint, FlipDirection, Offset, Rgb};
use image::imageops::FilterType;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Pixel-buffer backend bound to one source image.
///
/// The buffer is decoded lazily on the first mutating operation and dropped
/// with the driver.
pub struct RasterDriver {
    handle: ImageHandle,
    buffer: Option<DynamicImage>,
}

impl RasterDriver {
    /// Bind a driver to an image on disk. Reads metadata only; pixels are
    /// decoded on first use.
    pub fn open(path: &Path) -> Result<Self, DriverError> {
        let handle = ImageHandle::open(path)?;
        Ok(Self {
            handle,
            buffer: None,
        })
    }

    /// The working pixel buffer, decoding it from the source on first call.
    fn pixels(&mut self) -> Result<&DynamicImage, DriverError> {
        let buffer = match self.buffer.take() {
            Some(image) => image,
            None => load_pixels(self.handle.path())?,
        };
        Ok(self.buffer.insert(buffer))
    }
}

/// Dimensions for the unfiltered halving pre-pass of a large downscale.
///
/// Repeatedly halves the current dimensions while the halved size stays more
/// than 10% above the target on both axes. Returns `None` when no halving
/// step applies, so the caller resamples directly.
fn prescale_dimensions(current: (u32, u32), target: (u32, u32)) -> Option<(u32, u32)> {
    // The maximum reduction is 10% greater than the final size
    let cap_w = (f64::from(target.0) * 1.1).round() as u32;
    let cap_h = (f64::from(target.1) * 1.1).round() as u32;

    let (mut pre_w, mut pre_h) = current;
    while pre_w / 2 > cap_w && pre_h / 2 > cap_h {
        pre_w /= 2;
        pre_h /= 2;
    }

    ((pre_w, pre_h) != current).then_some((pre_w, pre_h))
}

/// Rotate clockwise into an expanded canvas; uncovered corners stay
/// transparent.
fn rotate_expanded(source: &RgbaImage, degrees: i32, out_w: u32, out_h: u32) -> RgbaImage {
    let (w, h) = source.dimensions();
    let theta = (degrees as f32).to_radians();

    // Spin around the source center, then recenter on the larger canvas
    let projection = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
        * Projection::rotate(theta)
        * Projection::translate(-(w as f32) / 2.0, -(h as f32) / 2.0);

    let mut canvas = RgbaImage::new(out_w, out_h);
    warp_into(
        source,
        &projection,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
        &mut canvas,
    );
    canvas
}

impl ImageDriver for RasterDriver {
    fn handle(&self) -> &ImageHandle {
        &self.handle
    }

    fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        constraint: Constraint,
    ) -> Result<(), DriverError> {
        let (width, height) =
            geometry::resolve_resize(self.handle.dimensions(), width, height, constraint);
        debug!(width, height, "raster resize");

        let source = self.pixels()?;

        // Cheap unfiltered reduction before the quality resample, so Lanczos
        // never runs against a source many times the target size.
        let prescaled = prescale_dimensions((source.width(), source.height()), (width, height))
            .map(|(pre_w, pre_h)| source.resize_exact(pre_w, pre_h, FilterType::Nearest));
        let source = prescaled.as_ref().unwrap_or(source);

        let resized = source.resize_exact(width, height, FilterType::Lanczos3);
        self.buffer = Some(resized);
        self.handle.set_dimensions(width, height);
        Ok(())
    }

    fn crop(
        &mut self,
        width: u32,
        height: u32,
        offset_x: Offset,
        offset_y: Offset,
    ) -> Result<(), DriverError> {
        let region =
            geometry::resolve_crop(self.handle.dimensions(), width, height, offset_x, offset_y);
        debug!(?region, "raster crop");

        let source = self.pixels()?;
        let cropped = source.crop_imm(region.offset_x, region.offset_y, region.width, region.height);
        self.buffer = Some(cropped);
        self.handle.set_dimensions(region.width, region.height);
        Ok(())
    }

    fn rotate(&mut self, degrees: i32) -> Result<(), DriverError> {
        let degrees = geometry::resolve_rotate(degrees);
        if degrees == 0 {
            return Ok(());
        }
        let (out_w, out_h) = geometry::rotated_bounds(self.handle.dimensions(), degrees);
        debug!(degrees, out_w, out_h, "raster rotate");

        let source = self.pixels()?.to_rgba8();
        let rotated = rotate_expanded(&source, degrees, out_w, out_h);
        self.buffer = Some(DynamicImage::ImageRgba8(rotated));
        self.handle.set_dimensions(out_w, out_h);
        Ok(())
    }

    fn flip(&mut self, direction: FlipDirection) -> Result<(), DriverError> {
        let direction = geometry::resolve_flip(direction);
        debug!(?direction, "raster flip");

        let source = self.pixels()?;
        let flipped = match direction {
            FlipDirection::Horizontal => source.fliph(),
            FlipDirection::Vertical => source.flipv(),
        };
        self.buffer = Some(flipped);
        Ok(())
    }

    fn sharpen(&mut self, _amount: u32) -> Result<(), DriverError> {
        Err(DriverError::Unsupported {
            operation: "sharpen",
        })
    }

    fn reflection(
        &mut self,
        _height: Option<u32>,
        _opacity: u32,
        _fade_in: bool,
    ) -> Result<(), DriverError> {
        Err(DriverError::Unsupported {
            operation: "reflection",
        })
    }

    fn watermark(
        &mut self,
        _mark: &ImageHandle,
        _offset_x: Offset,
        _offset_y: Offset,
        _opacity: u32,
    ) -> Result<(), DriverError> {
        Err(DriverError::Unsupported {
            operation: "watermark",
        })
    }

    fn background(&mut self, _color: Rgb, _opacity: u32) -> Result<(), DriverError> {
        Err(DriverError::Unsupported {
            operation: "background",
        })
    }

    fn save(&mut self, path: Option<&Path>, quality: u32) -> Result<(), DriverError> {
        let (path, quality) = geometry::resolve_save(self.handle.path(), path, quality)?;
        let format = ImageFormat::from_path_or(&path, self.handle.format())?;
        debug!(path = %path.display(), %format, quality = quality.value(), "raster save");

        let image = self.pixels()?;
        let file = std::fs::File::create(&path)?;
        encode_image(image, BufWriter::new(file), format, quality)?;

        if format != self.handle.format() {
            self.handle.set_format(format);
        }
        self.handle.set_path(path);
        Ok(())
    }

    fn render(
        &mut self,
        format: Option<ImageFormat>,
        quality: u32,
    ) -> Result<Vec<u8>, DriverError> {
        let (format, quality) = geometry::resolve_render(self.handle.format(), format, quality);
        let image = self.pixels()?;
        let mut buffer = Vec::new();
        encode_image(image, &mut buffer, format, quality)?;
        Ok(buffer)
    }
}
