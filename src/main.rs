use clap::{Parser, Subcommand, ValueEnum};
use easel::{
    Constraint, DriverId, DriverRegistry, FlipDirection, ImageDriver, ImageHandle, Offset,
    RasterDriver, WarpDriver, geometry,
};
use serde_json::json;
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup — trivial, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "easel")]
#[command(about = "Resize, crop, rotate and flip images through interchangeable backends")]
#[command(long_about = "\
Resize, crop, rotate and flip images through interchangeable backends.

Every operation resolves its parameters first — proportional dimensions,
bounded offsets, normalized angles — and only then touches pixels, so the
same request produces the same geometry on either backend.

Backends:

  raster   direct pixel-buffer manipulation (staged Lanczos resampling)
  warp     affine-transform engine (one projective resample per operation)

Offsets accept 'center', 'edge', a pixel value, or a negative value
measured back from the far edge:

  easel crop photo.jpg 400 400                        # centered
  easel crop photo.jpg 400 400 --offset-x edge        # flush right
  easel crop photo.jpg 400 400 --offset-x -20         # 20px from the right

Use --plan to print the resolved geometry as JSON without touching pixels.")]
#[command(version = version_string())]
struct Cli {
    /// Pixel backend to run the operation with
    #[arg(long, value_enum, default_value = "raster", global = true)]
    driver: DriverKind,

    /// Destination path (defaults to overwriting the source; the extension
    /// picks the output format)
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Encoding quality 1-100 (JPEG honors it; PNG and GIF do not)
    #[arg(long, default_value_t = 100, global = true)]
    quality: u32,

    /// Print the resolved operation as JSON without touching pixels
    #[arg(long, global = true)]
    plan: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DriverKind {
    Raster,
    Warp,
}

#[derive(Subcommand)]
enum Command {
    /// Print dimensions, format and MIME type
    Info { image: PathBuf },
    /// Resize, preserving the aspect ratio according to the constraint
    Resize {
        image: PathBuf,
        /// Target width in pixels
        #[arg(long)]
        width: Option<u32>,
        /// Target height in pixels
        #[arg(long)]
        height: Option<u32>,
        /// Which dimension drives the proportional recomputation
        #[arg(long, value_enum, default_value = "auto")]
        constraint: Constraint,
    },
    /// Cut out a window of the image
    Crop {
        image: PathBuf,
        width: u32,
        height: u32,
        /// 'center', 'edge', a pixel offset, or negative from the right
        #[arg(long, default_value = "center")]
        offset_x: Offset,
        /// 'center', 'edge', a pixel offset, or negative from the bottom
        #[arg(long, default_value = "center")]
        offset_y: Offset,
    },
    /// Rotate clockwise by degrees (any magnitude; normalized to ±180)
    Rotate { image: PathBuf, degrees: i32 },
    /// Mirror the image ('horizontal' or anything else for vertical)
    Flip {
        image: PathBuf,
        direction: FlipDirection,
    },
}

impl Command {
    fn image(&self) -> &Path {
        match self {
            Command::Info { image }
            | Command::Resize { image, .. }
            | Command::Crop { image, .. }
            | Command::Rotate { image, .. }
            | Command::Flip { image, .. } => image,
        }
    }
}

/// Resolve the operation against the image metadata and describe it as JSON,
/// without decoding any pixels.
fn plan(command: &Command, handle: &ImageHandle) -> serde_json::Value {
    let source = json!({
        "path": handle.path(),
        "width": handle.width(),
        "height": handle.height(),
        "format": handle.format(),
    });

    match command {
        Command::Info { .. } => json!({ "op": "info", "source": source }),
        Command::Resize {
            width,
            height,
            constraint,
            ..
        } => {
            let (w, h) = geometry::resolve_resize(handle.dimensions(), *width, *height, *constraint);
            json!({
                "op": "resize",
                "source": source,
                "constraint": constraint,
                "result": { "width": w, "height": h },
            })
        }
        Command::Crop {
            width,
            height,
            offset_x,
            offset_y,
            ..
        } => {
            let region =
                geometry::resolve_crop(handle.dimensions(), *width, *height, *offset_x, *offset_y);
            json!({ "op": "crop", "source": source, "result": region })
        }
        Command::Rotate { degrees, .. } => {
            let degrees = geometry::resolve_rotate(*degrees);
            let (w, h) = geometry::rotated_bounds(handle.dimensions(), degrees);
            json!({
                "op": "rotate",
                "source": source,
                "degrees": degrees,
                "result": { "width": w, "height": h },
            })
        }
        Command::Flip { direction, .. } => {
            json!({
                "op": "flip",
                "source": source,
                "direction": geometry::resolve_flip(*direction),
            })
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let image = cli.command.image().to_path_buf();

    if let Command::Info { .. } = cli.command {
        let handle = ImageHandle::open(&image)?;
        println!(
            "{}: {}x{} {} ({})",
            handle.path().display(),
            handle.width(),
            handle.height(),
            handle.format(),
            handle.mime(),
        );
        return Ok(());
    }

    if cli.plan {
        let handle = ImageHandle::open(&image)?;
        let description = plan(&cli.command, &handle);
        println!("{}", serde_json::to_string_pretty(&description)?);
        return Ok(());
    }

    let mut registry = DriverRegistry::new();
    let id = match cli.driver {
        DriverKind::Raster => DriverId::new("raster")?,
        DriverKind::Warp => DriverId::new("warp")?,
    };
    let driver: Box<dyn ImageDriver> = match cli.driver {
        DriverKind::Raster => Box::new(RasterDriver::open(&image)?),
        DriverKind::Warp => Box::new(WarpDriver::open(&image)?),
    };
    registry.register(id.clone(), driver);

    match &cli.command {
        Command::Resize {
            width,
            height,
            constraint,
            ..
        } => registry.resize(&id, *width, *height, *constraint)?,
        Command::Crop {
            width,
            height,
            offset_x,
            offset_y,
            ..
        } => registry.crop(&id, *width, *height, *offset_x, *offset_y)?,
        Command::Rotate { degrees, .. } => registry.rotate(&id, *degrees)?,
        Command::Flip { direction, .. } => registry.flip(&id, *direction)?,
        Command::Info { .. } => unreachable!("handled above"),
    }

    registry.save(&id, cli.out.as_deref(), cli.quality)?;

    if let Some(driver) = registry.driver(&id) {
        let handle = driver.handle();
        println!(
            "{} -> {} ({}x{} {})",
            image.display(),
            handle.path().display(),
            handle.width(),
            handle.height(),
            handle.format(),
        );
    }
    Ok(())
}
