//! Pure geometry resolvers: loosely specified intents in, exact pixel
//! parameters out.
//!
//! Every mutating operation a driver performs starts here. The resolvers
//! take the caller's request plus the current image dimensions and produce
//! fully determined parameters — final width/height, bounded offsets,
//! normalized angles — that any backend can execute without further
//! validation.
//!
//! Numeric inputs never produce errors: out-of-range values are clamped or
//! normalized. The two exceptions take non-numeric input and are explicitly
//! fallible: [`resolve_save`] (filesystem writability pre-check) and
//! [`resolve_background`] (hex color strings).

use crate::format::ImageFormat;
use crate::params::{Constraint, CropRegion, FlipDirection, Offset, Opacity, Quality, Rgb};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    #[error("file must be writable: {0}")]
    FileNotWritable(PathBuf),
    #[error("directory must exist and be writable: {0}")]
    DirectoryNotWritable(PathBuf),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color {0:?}: expected 3- or 6-digit hex, optionally prefixed with '#'")]
pub struct ColorParseError(String);

/// Which axis ends up driving a proportional resize.
enum Drive {
    Width,
    Height,
    Precise,
    Exact,
}

/// Resolve a resize request into final dimensions.
///
/// A requested value of 0 is treated as "not specified". Aspect ratio is
/// preserved in every mode except [`Constraint::None`]; the constraint
/// decides which axis drives the recomputation of the other. Output
/// dimensions are rounded to the nearest integer and never drop below 1.
///
/// # Examples
/// ```
/// # use easel::geometry::resolve_resize;
/// # use easel::params::Constraint;
/// // 1000x500, width 100 requested: height follows the aspect ratio
/// assert_eq!(
///     resolve_resize((1000, 500), Some(100), None, Constraint::Auto),
///     (100, 50),
/// );
///
/// // NONE performs no aspect correction
/// assert_eq!(
///     resolve_resize((1000, 500), Some(200), Some(500), Constraint::None),
///     (200, 500),
/// );
/// ```
pub fn resolve_resize(
    current: (u32, u32),
    width: Option<u32>,
    height: Option<u32>,
    constraint: Constraint,
) -> (u32, u32) {
    let cur_w = f64::from(current.0.max(1));
    let cur_h = f64::from(current.1.max(1));
    let mut width = width.filter(|&w| w > 0).map(f64::from);
    let mut height = height.filter(|&h| h > 0).map(f64::from);
    let mut constraint = constraint;

    // An explicit driving axis combined with a value on that same axis
    // collapses to AUTO; the other axis is dropped so it gets recomputed.
    if constraint == Constraint::Width && width.is_some() {
        constraint = Constraint::Auto;
        height = None;
    } else if constraint == Constraint::Height && height.is_some() {
        constraint = Constraint::Auto;
        width = None;
    }

    if width.is_none() {
        if constraint == Constraint::None {
            width = Some(cur_w);
        } else {
            // Width not set: the height becomes the driving dimension.
            constraint = Constraint::Height;
        }
    }
    if height.is_none() {
        if constraint == Constraint::None {
            height = Some(cur_h);
        } else {
            // Height not set: the width becomes the driving dimension.
            constraint = Constraint::Width;
        }
    }

    let drive = match constraint {
        Constraint::Auto => {
            // The axis with the greatest reduction ratio drives.
            let w = width.unwrap_or(cur_w);
            let h = height.unwrap_or(cur_h);
            if cur_w / w > cur_h / h {
                Drive::Width
            } else {
                Drive::Height
            }
        }
        Constraint::Inverse => {
            // The axis with the least reduction ratio drives.
            let w = width.unwrap_or(cur_w);
            let h = height.unwrap_or(cur_h);
            if cur_w / w > cur_h / h {
                Drive::Height
            } else {
                Drive::Width
            }
        }
        Constraint::Width => Drive::Width,
        Constraint::Height => Drive::Height,
        Constraint::Precise => Drive::Precise,
        Constraint::None => Drive::Exact,
    };

    let (out_w, out_h) = match drive {
        Drive::Width => match width {
            Some(w) => (w, cur_h * w / cur_w),
            // Neither axis was requested: resizing to nothing is the identity.
            None => (cur_w, cur_h),
        },
        Drive::Height => match height {
            Some(h) => (cur_w * h / cur_h, h),
            None => (cur_w, cur_h),
        },
        Drive::Precise => {
            let w = width.unwrap_or(cur_w);
            let h = height.unwrap_or(cur_h);
            if w / h > cur_w / cur_h {
                (w, cur_h * w / cur_w)
            } else {
                (cur_w * h / cur_h, h)
            }
        }
        Drive::Exact => (width.unwrap_or(cur_w), height.unwrap_or(cur_h)),
    };

    (
        out_w.round().max(1.0) as u32,
        out_h.round().max(1.0) as u32,
    )
}

/// Resolve one crop axis: the requested size must already be clamped to the
/// source size. The returned offset is within `0..source`.
fn resolve_offset(source: u32, size: u32, offset: Offset) -> u32 {
    let span = source - size;
    let offset = match offset {
        Offset::Center => (f64::from(span) / 2.0).round() as u32,
        Offset::FarEdge => span,
        Offset::FromFarEdge(n) => span.saturating_sub(n),
        Offset::Literal(n) => n,
    };
    offset.min(source.saturating_sub(1))
}

/// Resolve a crop request into a window guaranteed to lie inside the image.
///
/// The requested size is clamped to the current dimensions, offsets are
/// resolved per axis, and the size is then re-clamped to what remains
/// between the offset and the far edge.
///
/// # Examples
/// ```
/// # use easel::geometry::resolve_crop;
/// # use easel::params::Offset;
/// // Oversized request on a 400x300 image: clamped, centered at the origin
/// let region = resolve_crop((400, 300), 500, 500, Offset::Center, Offset::Center);
/// assert_eq!(
///     (region.width, region.height, region.offset_x, region.offset_y),
///     (400, 300, 0, 0),
/// );
/// ```
pub fn resolve_crop(
    current: (u32, u32),
    width: u32,
    height: u32,
    offset_x: Offset,
    offset_y: Offset,
) -> CropRegion {
    let (cur_w, cur_h) = current;
    let width = width.min(cur_w);
    let height = height.min(cur_h);

    let offset_x = resolve_offset(cur_w, width, offset_x);
    let offset_y = resolve_offset(cur_h, height, offset_y);

    // Shrink to whatever remains between the offset and the far edge.
    CropRegion {
        width: width.min(cur_w - offset_x).max(1),
        height: height.min(cur_h - offset_y).max(1),
        offset_x,
        offset_y,
    }
}

/// Normalize a rotation to the range `(-180, 180]` degrees.
///
/// Positive angles rotate clockwise; 0 is a no-op for the drivers.
///
/// # Examples
/// ```
/// # use easel::geometry::resolve_rotate;
/// assert_eq!(resolve_rotate(370), 10);
/// assert_eq!(resolve_rotate(181), -179);
/// assert_eq!(resolve_rotate(-181), 179);
/// assert_eq!(resolve_rotate(180), 180);
/// ```
pub fn resolve_rotate(degrees: i32) -> i32 {
    let mut degrees = degrees % 360;
    if degrees > 180 {
        degrees -= 360;
    } else if degrees < -180 {
        degrees += 360;
    }
    // -180 and 180 are the same rotation; keep the range half-open.
    if degrees == -180 { 180 } else { degrees }
}

/// Normalize a flip direction.
///
/// With a two-variant direction type this is the identity; the fail-safe
/// collapse of arbitrary input to [`FlipDirection::Vertical`] lives in
/// [`FlipDirection`]'s `FromStr`.
pub fn resolve_flip(direction: FlipDirection) -> FlipDirection {
    direction
}

/// Clamp a sharpen amount to `1..=100`.
pub fn resolve_sharpen(amount: u32) -> u32 {
    amount.clamp(1, 100)
}

/// Resolve reflection parameters: the reflection height defaults to, and is
/// capped at, the current image height; opacity is clamped to `0..=100`.
pub fn resolve_reflection(
    current_height: u32,
    height: Option<u32>,
    opacity: u32,
    fade_in: bool,
) -> (u32, Opacity, bool) {
    let height = match height {
        Some(h) if h <= current_height => h,
        _ => current_height,
    };
    (height, Opacity::new(opacity), fade_in)
}

/// Resolve watermark placement against the watermark's own dimensions.
///
/// Offsets follow the crop sentinel rules but are *not* clamped: a watermark
/// larger than the image legitimately resolves to a negative offset and
/// hangs off-canvas. Opacity is clamped to `1..=100`.
pub fn resolve_watermark(
    current: (u32, u32),
    mark: (u32, u32),
    offset_x: Offset,
    offset_y: Offset,
    opacity: u32,
) -> (i64, i64, Opacity) {
    fn axis(source: u32, size: u32, offset: Offset) -> i64 {
        let span = i64::from(source) - i64::from(size);
        match offset {
            Offset::Center => (span as f64 / 2.0).round() as i64,
            Offset::FarEdge => span,
            Offset::FromFarEdge(n) => span - i64::from(n),
            Offset::Literal(n) => i64::from(n),
        }
    }

    (
        axis(current.0, mark.0, offset_x),
        axis(current.1, mark.1, offset_y),
        Opacity::new(opacity.max(1)),
    )
}

/// Parse a background color from 3- or 6-digit hex (leading `#` optional)
/// and clamp the opacity to `0..=100`.
pub fn resolve_background(color: &str, opacity: u32) -> Result<(Rgb, Opacity), ColorParseError> {
    let hex = color.strip_prefix('#').unwrap_or(color);
    let expanded: String = if hex.len() == 3 {
        // Shorthand notation: each digit doubles.
        hex.chars().flat_map(|c| [c, c]).collect()
    } else {
        hex.to_string()
    };

    if expanded.len() != 6 || !expanded.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ColorParseError(color.to_string()));
    }

    let component = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&expanded[range], 16).map_err(|_| ColorParseError(color.to_string()))
    };

    Ok((
        Rgb {
            red: component(0..2)?,
            green: component(2..4)?,
            blue: component(4..6)?,
        },
        Opacity::new(opacity),
    ))
}

/// Resolve a save destination and quality.
///
/// The path defaults to the image's current path. An existing destination
/// file must be writable; a new destination's parent directory must exist
/// and be writable. The check runs before any write is attempted — it is
/// best-effort, not transactional.
pub fn resolve_save(
    current_path: &Path,
    path: Option<&Path>,
    quality: u32,
) -> Result<(PathBuf, Quality), SaveError> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| current_path.to_path_buf());

    if path.is_file() {
        let writable = std::fs::metadata(&path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false);
        if !writable {
            return Err(SaveError::FileNotWritable(path));
        }
    } else {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let writable = std::fs::metadata(&dir)
            .map(|m| m.is_dir() && !m.permissions().readonly())
            .unwrap_or(false);
        if !writable {
            return Err(SaveError::DirectoryNotWritable(dir));
        }
    }

    Ok((path, Quality::new(quality)))
}

/// Resolve a render request: the format defaults to the image's current
/// format, quality is clamped.
pub fn resolve_render(
    current_format: ImageFormat,
    format: Option<ImageFormat>,
    quality: u32,
) -> (ImageFormat, Quality) {
    (format.unwrap_or(current_format), Quality::new(quality))
}

/// Bounding box of an image rotated by the given (normalized) angle.
///
/// # Examples
/// ```
/// # use easel::geometry::rotated_bounds;
/// assert_eq!(rotated_bounds((400, 300), 90), (300, 400));
/// assert_eq!(rotated_bounds((100, 100), 45), (141, 141));
/// ```
pub fn rotated_bounds(dims: (u32, u32), degrees: i32) -> (u32, u32) {
    let theta = f64::from(degrees).to_radians();
    let (sin, cos) = (theta.sin().abs(), theta.cos().abs());
    let w = f64::from(dims.0);
    let h = f64::from(dims.1);
    (
        (w * cos + h * sin).round().max(1.0) as u32,
        (w * sin + h * cos).round().max(1.0) as u32,
    )
}
