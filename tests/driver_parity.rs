//! Integration tests exercising both backends against real pixel data.
//!
//! The geometry layer guarantees both drivers resolve identical parameters;
//! these tests check the backends also *commit* identical results — same
//! handle dimensions, same on-disk formats — and that per-driver behavior
//! (lazy decode, format conversion on save, failure leaving state intact)
//! holds.

use easel::{
    Constraint, DriverError, DriverId, DriverRegistry, FlipDirection, ImageDriver, ImageFormat,
    Offset, RasterDriver, WarpDriver,
};
use image::{ImageEncoder, Rgb, RgbImage};
use std::path::Path;

/// Write a small valid JPEG with the given dimensions.
fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a PNG whose left half is red and right half is blue, so flips and
/// edge-aligned crops are detectable from pixel values.
fn create_split_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Both production drivers over the same source file.
fn both_drivers(source: &Path) -> Vec<(&'static str, Box<dyn ImageDriver>)> {
    vec![
        ("raster", Box::new(RasterDriver::open(source).unwrap()) as Box<dyn ImageDriver>),
        ("warp", Box::new(WarpDriver::open(source).unwrap())),
    ]
}

#[test]
fn resize_commits_resolved_dimensions_on_disk() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 400, 300);

    for (name, mut driver) in both_drivers(&source) {
        driver.resize(Some(200), None, Constraint::Auto).unwrap();
        assert_eq!(driver.handle().dimensions(), (200, 150), "{name}");

        let out = tmp.path().join(format!("{name}-resized.png"));
        driver.save(Some(&out), 90).unwrap();
        assert_eq!(image::image_dimensions(&out).unwrap(), (200, 150), "{name}");
    }
}

#[test]
fn crop_clamps_oversized_requests() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 400, 300);

    for (name, mut driver) in both_drivers(&source) {
        driver
            .crop(5000, 5000, Offset::Center, Offset::Center)
            .unwrap();
        assert_eq!(driver.handle().dimensions(), (400, 300), "{name}");
    }
}

#[test]
fn crop_far_edge_takes_the_right_half() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("split.png");
    create_split_png(&source, 200, 100);

    for (name, mut driver) in both_drivers(&source) {
        driver
            .crop(100, 100, Offset::FarEdge, Offset::Center)
            .unwrap();
        let out = tmp.path().join(format!("{name}-right.png"));
        driver.save(Some(&out), 90).unwrap();

        let cropped = image::open(&out).unwrap().to_rgb8();
        assert_eq!(cropped.dimensions(), (100, 100), "{name}");
        // The right half of the source is blue
        assert_eq!(cropped.get_pixel(50, 50), &Rgb([0, 0, 255]), "{name}");
    }
}

#[test]
fn rotate_quarter_turn_swaps_dimensions() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 400, 300);

    for (name, mut driver) in both_drivers(&source) {
        driver.rotate(90).unwrap();
        assert_eq!(driver.handle().dimensions(), (300, 400), "{name}");
    }
}

#[test]
fn rotate_diagonal_expands_canvas() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 100, 100);

    for (name, mut driver) in both_drivers(&source) {
        driver.rotate(45).unwrap();
        assert_eq!(driver.handle().dimensions(), (141, 141), "{name}");
    }
}

#[test]
fn rotate_full_circle_is_a_no_op() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 120, 80);

    for (name, mut driver) in both_drivers(&source) {
        driver.rotate(720).unwrap();
        assert_eq!(driver.handle().dimensions(), (120, 80), "{name}");
    }
}

#[test]
fn flip_horizontal_mirrors_pixels() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("split.png");
    create_split_png(&source, 200, 100);

    for (name, mut driver) in both_drivers(&source) {
        driver.flip(FlipDirection::Horizontal).unwrap();
        assert_eq!(driver.handle().dimensions(), (200, 100), "{name}");

        let out = tmp.path().join(format!("{name}-flipped.png"));
        driver.save(Some(&out), 90).unwrap();

        let flipped = image::open(&out).unwrap().to_rgb8();
        // Red half moved to the right
        assert_eq!(flipped.get_pixel(10, 50), &Rgb([0, 0, 255]), "{name}");
        assert_eq!(flipped.get_pixel(190, 50), &Rgb([255, 0, 0]), "{name}");
    }
}

#[test]
fn save_converts_format_by_extension() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 100, 80);

    for (name, mut driver) in both_drivers(&source) {
        assert_eq!(driver.handle().format(), ImageFormat::Jpeg);

        let out = tmp.path().join(format!("{name}-converted.png"));
        driver.save(Some(&out), 90).unwrap();

        assert_eq!(driver.handle().format(), ImageFormat::Png, "{name}");
        assert_eq!(driver.handle().mime(), "image/png", "{name}");
        assert_eq!(driver.handle().path(), out, "{name}");

        // The written bytes really are PNG, regardless of quality semantics
        let sniffed = image::ImageReader::open(&out)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .format();
        assert_eq!(sniffed, Some(image::ImageFormat::Png), "{name}");
    }
}

#[test]
fn save_without_extension_keeps_current_format() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 60, 60);

    let mut driver = RasterDriver::open(&source).unwrap();
    let out = tmp.path().join("bare");
    driver.save(Some(&out), 85).unwrap();

    assert_eq!(driver.handle().format(), ImageFormat::Jpeg);
    let sniffed = image::ImageReader::open(&out)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .format();
    assert_eq!(sniffed, Some(image::ImageFormat::Jpeg));
}

#[test]
fn save_unsupported_extension_fails_cleanly() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 60, 60);

    let mut driver = RasterDriver::open(&source).unwrap();
    let out = tmp.path().join("nope.webp");
    let result = driver.save(Some(&out), 85);

    assert!(matches!(result, Err(DriverError::UnsupportedFormat(_))));
    assert_eq!(driver.handle().format(), ImageFormat::Jpeg);
    assert!(!out.exists());
}

#[test]
fn failed_save_leaves_handle_untouched() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 60, 60);

    for (name, mut driver) in both_drivers(&source) {
        let result = driver.save(Some(Path::new("/nonexistent-easel/out.png")), 85);
        assert!(matches!(result, Err(DriverError::Save(_))), "{name}");
        assert_eq!(driver.handle().format(), ImageFormat::Jpeg, "{name}");
        // Open canonicalizes the source path; failure must not replace it
        assert_eq!(
            driver.handle().path(),
            source.canonicalize().unwrap(),
            "{name}"
        );
    }
}

#[test]
fn gif_save_ignores_quality() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 50, 50);

    let mut low = RasterDriver::open(&source).unwrap();
    let mut high = RasterDriver::open(&source).unwrap();
    let low_out = tmp.path().join("low.gif");
    let high_out = tmp.path().join("high.gif");
    low.save(Some(&low_out), 1).unwrap();
    high.save(Some(&high_out), 100).unwrap();

    assert_eq!(low.handle().format(), ImageFormat::Gif);
    // GIF has no quality concept: identical bytes either way
    assert_eq!(
        std::fs::read(&low_out).unwrap(),
        std::fs::read(&high_out).unwrap()
    );
}

#[test]
fn render_encodes_to_memory() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 80, 40);

    for (name, mut driver) in both_drivers(&source) {
        // Default format is the source format
        let bytes = driver.render(None, 80).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (80, 40), "{name}");

        // Explicit format override
        let bytes = driver.render(Some(ImageFormat::Png), 80).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Png,
            "{name}"
        );
    }
}

#[test]
fn operation_sequences_agree_across_drivers() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 640, 480);

    let mut dimensions: Vec<Vec<(u32, u32)>> = Vec::new();
    for (_, mut driver) in both_drivers(&source) {
        let mut steps = Vec::new();
        driver.resize(Some(320), None, Constraint::Auto).unwrap();
        steps.push(driver.handle().dimensions());
        driver
            .crop(200, 150, Offset::Literal(10), Offset::FromFarEdge(20))
            .unwrap();
        steps.push(driver.handle().dimensions());
        driver.rotate(-90).unwrap();
        steps.push(driver.handle().dimensions());
        driver.flip(FlipDirection::Vertical).unwrap();
        steps.push(driver.handle().dimensions());
        dimensions.push(steps);
    }

    assert_eq!(dimensions[0], dimensions[1]);
    assert_eq!(dimensions[0], vec![(320, 240), (200, 150), (150, 200), (150, 200)]);
}

#[test]
fn sharpen_and_compositing_are_unsupported() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 40, 40);

    for (name, mut driver) in both_drivers(&source) {
        assert!(
            matches!(
                driver.sharpen(50),
                Err(DriverError::Unsupported { operation: "sharpen" })
            ),
            "{name}"
        );
        assert!(
            matches!(
                driver.reflection(None, 80, false),
                Err(DriverError::Unsupported { .. })
            ),
            "{name}"
        );
        assert!(
            matches!(
                driver.background(easel::Rgb { red: 0, green: 0, blue: 0 }, 50),
                Err(DriverError::Unsupported { .. })
            ),
            "{name}"
        );
    }
}

#[test]
fn registry_routes_to_independent_drivers() {
    let tmp = tempfile::TempDir::new().unwrap();
    let source = tmp.path().join("source.jpg");
    create_test_jpeg(&source, 400, 200);

    let mut registry = DriverRegistry::new();
    let raster_id = DriverId::new("raster").unwrap();
    let warp_id = DriverId::new("warp").unwrap();
    registry.register(
        raster_id.clone(),
        Box::new(RasterDriver::open(&source).unwrap()),
    );
    registry.register(warp_id.clone(), Box::new(WarpDriver::open(&source).unwrap()));

    registry
        .resize(&raster_id, Some(100), None, Constraint::Auto)
        .unwrap();
    registry.rotate(&warp_id, 90).unwrap();

    // Each driver owns its buffer: operations do not bleed across entries
    assert_eq!(
        registry.driver(&raster_id).unwrap().handle().dimensions(),
        (100, 50)
    );
    assert_eq!(
        registry.driver(&warp_id).unwrap().handle().dimensions(),
        (200, 400)
    );

    let raster_out = tmp.path().join("raster.png");
    let warp_out = tmp.path().join("warp.png");
    registry.save(&raster_id, Some(&raster_out), 90).unwrap();
    registry.save(&warp_id, Some(&warp_out), 90).unwrap();
    assert!(raster_out.exists() && warp_out.exists());
}
