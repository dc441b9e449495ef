//! Transform-engine backend — every geometric operation is one affine
//! projection.
//!
//! Where [`RasterDriver`](crate::raster::RasterDriver) manipulates the pixel
//! buffer operation by operation, this driver expresses resize, crop, rotate
//! and flip uniformly as projective maps and resamples the source through
//! `imageproc::geometric_transformations::warp_into` in a single pass per
//! operation. Uncovered output pixels are transparent.

use crate::driver::{DriverError, ImageDriver, encode_image, load_pixels};
use crate::format::ImageFormat;
use crate::geometry;
use crate::handle::ImageHandle;
use crate::params::{Constraint, FlipDirection, Offset, Rgb};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// Affine-transform backend bound to one source image.
pub struct WarpDriver {
    handle: ImageHandle,
    buffer: Option<DynamicImage>,
}

impl WarpDriver {
    /// Bind a driver to an image on disk. Reads metadata only; pixels are
    /// decoded on first use.
    pub fn open(path: &Path) -> Result<Self, DriverError> {
        let handle = ImageHandle::open(path)?;
        Ok(Self {
            handle,
            buffer: None,
        })
    }

    fn pixels(&mut self) -> Result<&DynamicImage, DriverError> {
        let buffer = match self.buffer.take() {
            Some(image) => image,
            None => load_pixels(self.handle.path())?,
        };
        Ok(self.buffer.insert(buffer))
    }

    /// Resample the current buffer through a forward projection into a fresh
    /// canvas of the given size, then commit buffer and handle dimensions.
    fn apply(
        &mut self,
        projection: Projection,
        out_w: u32,
        out_h: u32,
        interpolation: Interpolation,
    ) -> Result<(), DriverError> {
        let source = self.pixels()?.to_rgba8();
        let mut canvas = RgbaImage::new(out_w, out_h);
        warp_into(
            &source,
            &projection,
            interpolation,
            Rgba([0, 0, 0, 0]),
            &mut canvas,
        );
        self.buffer = Some(DynamicImage::ImageRgba8(canvas));
        self.handle.set_dimensions(out_w, out_h);
        Ok(())
    }
}

impl ImageDriver for WarpDriver {
    fn handle(&self) -> &ImageHandle {
        &self.handle
    }

    fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
        constraint: Constraint,
    ) -> Result<(), DriverError> {
        let (cur_w, cur_h) = self.handle.dimensions();
        let (width, height) = geometry::resolve_resize((cur_w, cur_h), width, height, constraint);
        debug!(width, height, "warp resize");

        let scale = Projection::scale(width as f32 / cur_w as f32, height as f32 / cur_h as f32);
        self.apply(scale, width, height, Interpolation::Bilinear)
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
        debug!(?region, "warp crop");

        // Integer translation: sampling stays exact under nearest-neighbor
        let shift = Projection::translate(-(region.offset_x as f32), -(region.offset_y as f32));
        self.apply(shift, region.width, region.height, Interpolation::Nearest)
    }

    fn rotate(&mut self, degrees: i32) -> Result<(), DriverError> {
        let degrees = geometry::resolve_rotate(degrees);
        if degrees == 0 {
            return Ok(());
        }
        let (cur_w, cur_h) = self.handle.dimensions();
        let (out_w, out_h) = geometry::rotated_bounds((cur_w, cur_h), degrees);
        debug!(degrees, out_w, out_h, "warp rotate");

        let spin = Projection::translate(out_w as f32 / 2.0, out_h as f32 / 2.0)
            * Projection::rotate((degrees as f32).to_radians())
            * Projection::translate(-(cur_w as f32) / 2.0, -(cur_h as f32) / 2.0);
        self.apply(spin, out_w, out_h, Interpolation::Bilinear)
    }

    fn flip(&mut self, direction: FlipDirection) -> Result<(), DriverError> {
        let direction = geometry::resolve_flip(direction);
        let (cur_w, cur_h) = self.handle.dimensions();
        debug!(?direction, "warp flip");

        let mirror = match direction {
            FlipDirection::Horizontal => {
                Projection::translate((cur_w - 1) as f32, 0.0) * Projection::scale(-1.0, 1.0)
            }
            FlipDirection::Vertical => {
                Projection::translate(0.0, (cur_h - 1) as f32) * Projection::scale(1.0, -1.0)
            }
        };
        self.apply(mirror, cur_w, cur_h, Interpolation::Nearest)
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
        debug!(path = %path.display(), %format, quality = quality.value(), "warp save");

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

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        }))
    }

    /// Driver around an in-memory buffer, skipping the filesystem.
    fn driver_with(image: DynamicImage) -> WarpDriver {
        let (w, h) = (image.width(), image.height());
        WarpDriver {
            handle: ImageHandle::synthetic("/warp.png", w, h, crate::format::ImageFormat::Png),
            buffer: Some(image),
        }
    }

    #[test]
    fn crop_translation_is_pixel_exact() {
        let mut driver = driver_with(checker(10, 10));
        driver
            .crop(4, 4, Offset::Literal(3), Offset::Literal(2))
            .unwrap();

        assert_eq!(driver.handle().dimensions(), (4, 4));
        let buffer = driver.buffer.as_ref().unwrap().to_rgba8();
        // Output (0,0) samples source (3,2): odd parity, black
        assert_eq!(buffer.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        // Output (1,0) samples source (4,2): even parity, white
        assert_eq!(buffer.get_pixel(1, 0), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn horizontal_flip_mirrors_columns() {
        let mut gradient = RgbaImage::new(5, 1);
        for x in 0..5 {
            gradient.put_pixel(x, 0, Rgba([(x * 50) as u8, 0, 0, 255]));
        }
        let mut driver = driver_with(DynamicImage::ImageRgba8(gradient));
        driver.flip(FlipDirection::Horizontal).unwrap();

        let buffer = driver.buffer.as_ref().unwrap().to_rgba8();
        assert_eq!(buffer.get_pixel(0, 0)[0], 200);
        assert_eq!(buffer.get_pixel(4, 0)[0], 0);
        assert_eq!(driver.handle().dimensions(), (5, 1));
    }

    #[test]
    fn vertical_flip_mirrors_rows() {
        let mut gradient = RgbaImage::new(1, 4);
        for y in 0..4 {
            gradient.put_pixel(0, y, Rgba([0, (y * 60) as u8, 0, 255]));
        }
        let mut driver = driver_with(DynamicImage::ImageRgba8(gradient));
        driver.flip(FlipDirection::Vertical).unwrap();

        let buffer = driver.buffer.as_ref().unwrap().to_rgba8();
        assert_eq!(buffer.get_pixel(0, 0)[1], 180);
        assert_eq!(buffer.get_pixel(0, 3)[1], 0);
    }

    #[test]
    fn rotate_quarter_turn_swaps_dimensions() {
        let mut driver = driver_with(checker(8, 4));
        driver.rotate(90).unwrap();
        assert_eq!(driver.handle().dimensions(), (4, 8));
    }

    #[test]
    fn resize_commits_resolved_dimensions() {
        let mut driver = driver_with(checker(100, 50));
        driver.resize(Some(10), None, Constraint::Auto).unwrap();
        assert_eq!(driver.handle().dimensions(), (10, 5));
        let buffer = driver.buffer.as_ref().unwrap();
        assert_eq!((buffer.width(), buffer.height()), (10, 5));
    }
}
