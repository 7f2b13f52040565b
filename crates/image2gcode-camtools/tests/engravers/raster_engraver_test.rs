use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use image2gcode_camtools::{count_commands, ColumnRange, RasterEngraver};
use image2gcode_core::Point;
use image2gcode_settings::JobConfig;
use image2gcode_visualizer::validate;

fn test_pattern(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        if y % 7 == 3 {
            Luma([255])
        } else if (x / 9 + y / 5) % 3 == 0 {
            Luma([255])
        } else {
            Luma([((x * 13 + y * 29) % 256) as u8])
        }
    })
}

fn assert_round_trip(engraver: &RasterEngraver) -> String {
    let gcode = engraver.generate_gcode();
    let grid = engraver.power_grid();
    validate(&gcode, grid.width(), grid.height(), grid.as_slice())
        .unwrap_or_else(|e| panic!("round trip failed: {}", e));
    gcode
}

#[test]
fn test_round_trip_default_settings() {
    let engraver = RasterEngraver::from_image(
        DynamicImage::ImageLuma8(test_pattern(60, 40)),
        JobConfig::default(),
    )
    .unwrap();
    let gcode = assert_round_trip(&engraver);
    assert!(gcode.contains("M4"));
    assert!(!gcode.contains("M3"));
}

#[test]
fn test_round_trip_with_overscan_noise_and_speedmoves() {
    let config = JobConfig {
        overscan: 3,
        noise: 40,
        speedmoves: 0.5,
        poweroffset: 25,
        ..JobConfig::default()
    };
    let engraver =
        RasterEngraver::from_image(DynamicImage::ImageLuma8(test_pattern(80, 30)), config).unwrap();
    assert!(engraver.power_grid().as_slice().iter().all(|&p| p == 0 || p > 40));
    assert_round_trip(&engraver);
}

#[test]
fn test_round_trip_with_size_and_center() {
    let config = JobConfig {
        size: Some((33.0, 17.0)),
        center: true,
        constantburn: true,
        speed: 1500,
        ..JobConfig::default()
    };
    let engraver =
        RasterEngraver::from_image(DynamicImage::ImageLuma8(test_pattern(47, 23)), config).unwrap();
    assert_eq!(engraver.geometry().precision().digits(), 3);
    let gcode = assert_round_trip(&engraver);
    assert!(gcode.contains("M3"));
    assert!(gcode.contains(" F1500"));
    assert_eq!(gcode.matches(" F").count(), 1);
}

#[test]
fn test_round_trip_without_speedmoves() {
    let config = JobConfig {
        speedmoves: 0.0,
        invert: false,
        ..JobConfig::default()
    };
    let engraver =
        RasterEngraver::from_image(DynamicImage::ImageLuma8(test_pattern(25, 25)), config).unwrap();
    let gcode = assert_round_trip(&engraver);
    assert_eq!(gcode.lines().filter(|l| *l == "M5").count(), 1);
    assert!(gcode.ends_with("M5\nM9\nM2\n"));
}

#[test]
fn test_overscan_scenario() {
    let mut image = GrayImage::from_pixel(16, 1, Luma([255]));
    // 255 - 5 and 255 - 10 map to powers 5 and 10 at maxpower 255
    image.put_pixel(5, 0, Luma([250]));
    for x in 6..10 {
        image.put_pixel(x, 0, Luma([200]));
    }
    image.put_pixel(10, 0, Luma([245]));
    let config = JobConfig {
        maxpower: 255,
        overscan: 2,
        ..JobConfig::default()
    };

    let engraver = RasterEngraver::from_image(DynamicImage::ImageLuma8(image), config).unwrap();
    let grid = engraver.power_grid();
    assert_eq!(grid.active_range(0), Some(ColumnRange::new(3, 12)));
    assert_eq!(&grid.row(0)[3..5], &[5, 5]);
    assert_eq!(&grid.row(0)[11..13], &[10, 10]);
    assert_round_trip(&engraver);
}

#[test]
fn test_centered_extent() {
    let config = JobConfig {
        center: true,
        ..JobConfig::default()
    };
    let image = GrayImage::from_pixel(100, 100, Luma([0]));
    let engraver = RasterEngraver::from_image(DynamicImage::ImageLuma8(image), config).unwrap();

    let extent = engraver.geometry().extent();
    assert_eq!(extent.lower_left(), Some(Point::new(-5.0, -5.0)));
    assert_eq!(extent.upper_right(), Some(Point::new(5.0, 5.0)));

    let program = engraver.generate();
    assert!(program.body.lines.contains(&"G0 X-5.0 Y-5.0".to_string()));
    assert_eq!(program.bbox().lower_left(), Some(Point::new(-5.0, -5.0)));
    assert_eq!(program.bbox().upper_right(), Some(Point::new(5.0, 4.9)));
    assert_eq!(count_commands(&program.body.lines, "G1"), 199);
}

#[test]
fn test_transparent_png_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logo.png");
    let mut image = RgbaImage::from_pixel(8, 4, Rgba([0, 0, 0, 0]));
    for x in 2..6 {
        image.put_pixel(x, 1, Rgba([0, 0, 0, 255]));
    }
    image.save(&path).unwrap();

    let engraver = RasterEngraver::from_file(&path, JobConfig::default()).unwrap();
    let grid = engraver.power_grid();
    assert_eq!(grid.burn_pixels(), 4);
    assert_eq!(grid.row(2)[2..6], [300, 300, 300, 300]);

    let gcode = assert_round_trip(&engraver);
    assert!(gcode.contains("; source: logo.png\n"));
}

#[test]
fn test_byte_identical_output() {
    let image = DynamicImage::ImageLuma8(test_pattern(30, 30));
    let first = RasterEngraver::from_image(image.clone(), JobConfig::default())
        .unwrap()
        .generate_gcode();
    let second = RasterEngraver::from_image(image, JobConfig::default())
        .unwrap()
        .generate_gcode();
    assert_eq!(first, second);
}
