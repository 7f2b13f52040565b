use image2gcode_camtools::generate_calibration_images;

#[test]
fn test_write_calibration_images() {
    let dir = tempfile::tempdir().unwrap();
    let paths = generate_calibration_images(dir.path(), 120, 80, true).unwrap();
    assert_eq!(paths.len(), 11);
    for path in &paths {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (120, 80));
    }
    assert!(dir
        .path()
        .join("gradient_vertical_120x80_pixels.png")
        .exists());
}

#[test]
fn test_list_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let paths = generate_calibration_images(dir.path(), 40, 40, false).unwrap();
    assert_eq!(paths.len(), 11);
    assert!(paths.iter().all(|p| !p.exists()));
}
