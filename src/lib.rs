//! # Easel
//!
//! Driver-based image manipulation: resize, crop, rotate, flip and save
//! raster images through one uniform interface, with the pixel work
//! delegated to an interchangeable backend.
//!
//! # Architecture: Resolve, Then Transform
//!
//! Every operation runs in two strictly separated steps:
//!
//! ```text
//! 1. Resolve    intent + current dimensions  →  exact pixel parameters
//! 2. Transform  exact parameters             →  new pixel buffer
//! ```
//!
//! Step 1 is the [`geometry`] module: pure functions that turn loose
//! requests ("resize to width 600, keep proportions", "crop centered",
//! "rotate 370°") into fully determined parameters, clamping rather than
//! rejecting out-of-range numbers. Step 2 is a [`driver`]: a backend that
//! executes the resolved operation and, only on success, commits the new
//! buffer and dimensions.
//!
//! This separation exists for three reasons:
//!
//! - **Backends cannot disagree**: both drivers call the same resolvers, so
//!   the geometry a caller gets never depends on the backend chosen.
//! - **Testability**: all the interesting edge cases (degenerate sizes,
//!   sentinel offsets, angle wrapping) live in pure functions exercised
//!   without touching a single pixel.
//! - **Dry runs**: callers (and the CLI's `--plan` flag) can resolve an
//!   operation to see exactly what would happen without decoding an image.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`geometry`] | Pure resolvers: intents + current dimensions → exact parameters |
//! | [`params`] | Intent types: constraints, offsets, quality, directions |
//! | [`format`] | Format/extension/MIME mapping |
//! | [`handle`] | Per-image metadata: path, dimensions, format |
//! | [`driver`] | The [`ImageDriver`] capability trait and shared codec plumbing |
//! | [`raster`] | Software rasterizer backend (direct pixel manipulation) |
//! | [`warp`] | Transform-engine backend (affine projections) |
//! | [`registry`] | Identifier → driver routing with validated ids |
//!
//! # Design Decisions
//!
//! ## Loading Is Fallible, Loudly
//!
//! [`ImageHandle::open`] and the driver constructors return `Result`. A
//! missing or undecodable file is an error at the call site — there is no
//! half-constructed handle whose dimensions silently read as empty.
//!
//! ## Sentinel Offsets Are a Type
//!
//! Crop and watermark placement historically overloads one numeric
//! parameter (null = center, boolean = far edge, negative = from the far
//! edge). [`params::Offset`] spells these out as variants, so "literal
//! negative" and "measured from the right" cannot be confused.
//!
//! ## Normalizers Clamp, Only I/O Fails
//!
//! No resolver errors on a numeric input: quality 500 means 100, a crop
//! bigger than the image means the whole image, rotating 370° means 10°.
//! The fallible surface is confined to loading, saving and encoding.
//!
//! # Example
//!
//! ```no_run
//! use easel::{Constraint, ImageDriver, RasterDriver};
//!
//! # fn main() -> Result<(), easel::DriverError> {
//! let mut driver = RasterDriver::open("photo.jpg".as_ref())?;
//! driver.resize(Some(600), None, Constraint::Auto)?;
//! driver.rotate(90)?;
//! driver.save(Some("photo-edited.png".as_ref()), 85)?;
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod format;
pub mod geometry;
pub mod handle;
pub mod params;
pub mod raster;
pub mod registry;
pub mod warp;

pub use driver::{DriverError, ImageDriver};
pub use format::ImageFormat;
pub use handle::{ImageHandle, LoadError};
pub use params::{Constraint, CropRegion, FlipDirection, Offset, Opacity, Quality, Rgb};
pub use raster::RasterDriver;
pub use registry::{DriverId, DriverRegistry, RegistryError};
pub use warp::WarpDriver;
