//! Parameter types shared by the geometry resolvers and the drivers.
//!
//! These types describe *what* a caller asked for, not *how* a backend will
//! do it. The [`geometry`](crate::geometry) module turns them into exact
//! pixel parameters; the drivers consume only the resolved values.
//!
//! ## Types
//!
//! - [`Constraint`] — which dimension drives a proportional resize.
//! - [`FlipDirection`] — horizontal or vertical mirror. Parsing is
//!   fail-safe: any token that is not horizontal flips vertically.
//! - [`Offset`] — crop/watermark placement on one axis. Replaces the
//!   classic sentinel overloading (null = center, true = far edge,
//!   negative = from the far edge) with explicit variants.
//! - [`Quality`] — lossy encoding quality (1–100, default 100). Clamped on
//!   construction.
//! - [`Opacity`] — compositing opacity (0–100). Clamped on construction.
//! - [`CropRegion`] — a fully resolved crop: size plus offsets, guaranteed
//!   to lie inside the source image.
//! - [`Rgb`] — a parsed background color.

use serde::Serialize;
use std::convert::Infallible;
use std::str::FromStr;
use thiserror::Error;

/// Rule governing which image dimension drives a proportional resize.
///
/// `None` scales to exactly the requested box (may distort the aspect
/// ratio). All other modes preserve the source aspect ratio and differ only
/// in which axis is recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Constraint {
    /// No aspect correction: use the requested width and height as-is.
    None,
    /// The width drives; height is recomputed proportionally.
    Width,
    /// The height drives; width is recomputed proportionally.
    Height,
    /// Pick the axis with the greatest reduction ratio (image fits inside
    /// the requested box).
    #[default]
    Auto,
    /// Pick the axis with the least reduction ratio (image covers the
    /// requested box).
    Inverse,
    /// Fit the requested box as closely as possible by aspect comparison.
    Precise,
}

/// Mirror axis for a flip operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlipDirection {
    /// Mirror left-to-right.
    Horizontal,
    /// Mirror top-to-bottom.
    Vertical,
}

impl FromStr for FlipDirection {
    type Err = Infallible;

    /// Fail-safe parse: `horizontal`/`h` (any case) flips horizontally,
    /// every other token flips vertically. Never errors.
    fn from_str(s: &str) -> Result<Self, Infallible> {
        if s.eq_ignore_ascii_case("horizontal") || s.eq_ignore_ascii_case("h") {
            Ok(FlipDirection::Horizontal)
        } else {
            Ok(FlipDirection::Vertical)
        }
    }
}

/// Placement of a crop window or watermark along one axis.
///
/// The resolved pixel offset depends on the source size and the size of the
/// thing being placed; see [`geometry::resolve_crop`](crate::geometry::resolve_crop).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Offset {
    /// Center on the axis.
    #[default]
    Center,
    /// Flush against the far (right/bottom) edge.
    FarEdge,
    /// Measured back from the far edge.
    FromFarEdge(u32),
    /// Literal offset from the near (left/top) edge.
    Literal(u32),
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("invalid offset {0:?}: expected `center`, `edge`, or an integer")]
pub struct ParseOffsetError(String);

impl FromStr for Offset {
    type Err = ParseOffsetError;

    /// Accepts `center`, `edge`, or an integer. Negative integers are
    /// measured from the far edge, matching the crop offset convention.
    fn from_str(s: &str) -> Result<Self, ParseOffsetError> {
        if s.eq_ignore_ascii_case("center") {
            return Ok(Offset::Center);
        }
        if s.eq_ignore_ascii_case("edge") {
            return Ok(Offset::FarEdge);
        }
        match s.parse::<i64>() {
            Ok(n) if n < 0 => Ok(Offset::FromFarEdge(n.unsigned_abs().min(u32::MAX as u64) as u32)),
            Ok(n) => Ok(Offset::Literal(n.min(u32::MAX as i64) as u32)),
            Err(_) => Err(ParseOffsetError(s.to_string())),
        }
    }
}

/// Quality setting for lossy image encoding (1–100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(100)
    }
}

/// Compositing opacity (0–100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Opacity(u32);

impl Opacity {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(100)
    }
}

/// A fully resolved crop window.
///
/// Produced by [`geometry::resolve_crop`](crate::geometry::resolve_crop);
/// guaranteed to satisfy `offset_x + width <= source width` and
/// `offset_y + height <= source height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CropRegion {
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

/// A parsed RGB color, from [`geometry::resolve_background`](crate::geometry::resolve_background).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(500).value(), 100);
    }

    #[test]
    fn quality_default_is_100() {
        assert_eq!(Quality::default().value(), 100);
    }

    #[test]
    fn opacity_clamps_upper_only() {
        assert_eq!(Opacity::new(0).value(), 0);
        assert_eq!(Opacity::new(101).value(), 100);
    }

    #[test]
    fn flip_parse_is_fail_safe() {
        assert_eq!("horizontal".parse(), Ok(FlipDirection::Horizontal));
        assert_eq!("H".parse(), Ok(FlipDirection::Horizontal));
        assert_eq!("vertical".parse(), Ok(FlipDirection::Vertical));
        assert_eq!("sideways".parse(), Ok(FlipDirection::Vertical));
        assert_eq!("".parse(), Ok(FlipDirection::Vertical));
    }

    #[test]
    fn offset_parse_variants() {
        assert_eq!("center".parse(), Ok(Offset::Center));
        assert_eq!("EDGE".parse(), Ok(Offset::FarEdge));
        assert_eq!("25".parse(), Ok(Offset::Literal(25)));
        assert_eq!("-25".parse(), Ok(Offset::FromFarEdge(25)));
        assert!("two".parse::<Offset>().is_err());
    }
}
