use clap::Parser;
use image::{GrayImage, Luma};
use image2gcode::cli::{run, Cli};
use std::path::Path;

fn write_image(path: &Path) {
    let image = GrayImage::from_fn(24, 12, |x, y| {
        if (x + y) % 5 == 0 {
            Luma([255])
        } else {
            Luma([(x * 10) as u8])
        }
    });
    image.save(path).unwrap();
}

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("image2gcode").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_convert_validate_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("pattern.png");
    let gcode = dir.path().join("pattern.gcode");
    let config = dir.path().join("job.toml");
    write_image(&image);
    std::fs::write(&config, "overscan = 2\nspeedmoves = 0.5\n").unwrap();

    run(&cli(&[
        image.to_str().unwrap(),
        gcode.to_str().unwrap(),
        "--validate",
        "--showimage",
        "--showoverscan",
        "--center",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap();

    let program = std::fs::read_to_string(&gcode).unwrap();
    assert!(program.contains(";     overscan: 2\n"));
    assert!(program.contains(";     center: true\n"));
    assert!(program.contains("\nG21\nG90\nM8\nG0 X-1.2 Y-0.6\n"));
    assert!(dir.path().join("pattern.preview.png").exists());
    assert!(dir.path().join("pattern.validate.png").exists());

    let validated = image::open(dir.path().join("pattern.validate.png")).unwrap();
    assert_eq!((validated.width(), validated.height()), (24, 12));
}

#[test]
fn test_bad_image_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("broken.png");
    let gcode = dir.path().join("broken.gcode");
    std::fs::write(&image, b"not a png").unwrap();
    let config = dir.path().join("empty.toml");
    std::fs::write(&config, "").unwrap();

    let err = run(&cli(&[
        image.to_str().unwrap(),
        gcode.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();
    assert!(format!("{:#}", err).contains("broken.png"));
    assert!(!gcode.exists());
}

#[test]
fn test_config_error_before_reading_image() {
    let dir = tempfile::tempdir().unwrap();
    let gcode = dir.path().join("out.gcode");
    let config = dir.path().join("job.toml");
    std::fs::write(&config, "pixelsize = -1.0\n").unwrap();

    let err = run(&cli(&[
        "missing.png",
        gcode.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();
    assert!(format!("{:#}", err).contains("pixelsize"));
    assert!(!gcode.exists());
}

#[test]
fn test_genimages_listing_only() {
    run(&cli(&["--genimages", "16", "16", "0"])).unwrap();
}

#[test]
fn test_sub_tick_pixelsize_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let image = dir.path().join("pattern.png");
    let gcode = dir.path().join("pattern.gcode");
    let config = dir.path().join("empty.toml");
    write_image(&image);
    std::fs::write(&config, "").unwrap();

    let err = run(&cli(&[
        image.to_str().unwrap(),
        gcode.to_str().unwrap(),
        "--pixelsize",
        "0.0000001",
        "--config",
        config.to_str().unwrap(),
    ]))
    .unwrap_err();
    assert!(format!("{:#}", err).contains("coordinate resolution"));
    assert!(!gcode.exists());
}
