//! Calibration image generator
//!
//! Deterministic test patterns (gradients, 1-pixel rasters, squares, border,
//! grid) used to calibrate power and speed settings on a given material.

use crate::error::{CamToolResult, ParameterError};
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};
use tracing::info;

const WHITE: u8 = 255;
const BLACK: u8 = 0;

/// Pattern direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
    Diagonal,
}

impl Orientation {
    fn name(self) -> &'static str {
        match self {
            Self::Horizontal => "horizontal",
            Self::Vertical => "vertical",
            Self::Diagonal => "diagonal",
        }
    }
}

/// One generated pattern
#[derive(Debug, Clone)]
pub struct CalibrationImage {
    /// File name the image is saved under
    pub name: String,
    pub image: GrayImage,
}

/// White canvas
pub fn create_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([WHITE]))
}

/// Fill `[x0, x1) x [y0, y1)`, clipped to the image
fn fill_rect(img: &mut GrayImage, x0: i64, y0: i64, x1: i64, y1: i64, color: u8) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    for y in y0.clamp(0, h)..y1.clamp(0, h) {
        for x in x0.clamp(0, w)..x1.clamp(0, w) {
            img.put_pixel(x as u32, y as u32, Luma([color]));
        }
    }
}

fn half_width(width: u32) -> i64 {
    ((width as f64 / 2.0).round() as i64).max(2)
}

fn ramp(value: u32, span: u32) -> u8 {
    (value as f64 * 255.0 / span.max(1) as f64).round().min(255.0) as u8
}

/// Gray ramp from black to (almost) white
pub fn gradient(img: &mut GrayImage, orientation: Orientation) {
    let (width, height) = img.dimensions();
    match orientation {
        Orientation::Horizontal => {
            for (x, _, pixel) in img.enumerate_pixels_mut() {
                *pixel = Luma([ramp(x, width)]);
            }
        }
        Orientation::Vertical => {
            for (_, y, pixel) in img.enumerate_pixels_mut() {
                *pixel = Luma([ramp(y, height)]);
            }
        }
        Orientation::Diagonal => {
            let size = width.min(height);
            for y in 0..size {
                for x in 0..size {
                    let shade = if y > x { size + (y - x) } else { size - (x - y) };
                    img.put_pixel(x, y, Luma([ramp(shade, 2 * size)]));
                }
            }
        }
    }
}

/// Horizontal gradient quantized into vertical bands `band` pixels apart
pub fn gradient_banding(img: &mut GrayImage, band: u32) {
    let (width, height) = img.dimensions();
    let half = half_width(band);
    for x in (0..width).step_by(band.max(1) as usize) {
        let x = x as i64;
        fill_rect(img, x - half, 0, x + half, height as i64, ramp(x as u32, width));
    }
}

/// Lines one pixel wide, one pixel apart
pub fn raster_1_pixel(img: &mut GrayImage, orientation: Orientation, color: u8) {
    let (width, height) = img.dimensions();
    match orientation {
        Orientation::Horizontal => {
            for x in (0..width).step_by(2) {
                fill_rect(img, x as i64, 0, x as i64 + 1, height as i64, color);
            }
        }
        Orientation::Vertical => {
            for y in (0..height).step_by(2) {
                fill_rect(img, 0, y as i64, width as i64, y as i64 + 1, color);
            }
        }
        Orientation::Diagonal => {
            let size = width.min(height);
            for i in (0..size).step_by(3) {
                for p in i..size {
                    img.put_pixel(p - i, p, Luma([color]));
                    img.put_pixel(p, p - i, Luma([color]));
                }
            }
        }
    }
}

/// Square of `size` at `offset`, either filled or drawn with lines of `width`
pub fn square(
    img: &mut GrayImage,
    size: (u32, u32),
    offset: (u32, u32),
    width: u32,
    color: u8,
    filled: bool,
) {
    let (x0, y0) = (offset.0 as i64, offset.1 as i64);
    let (x1, y1) = (x0 + size.0 as i64, y0 + size.1 as i64);
    if filled {
        fill_rect(img, x0, y0, x1, y1, color);
        return;
    }
    let d = half_width(width);
    fill_rect(img, x0, y0 - d, x1, y0 + d, color);
    fill_rect(img, x0, y1 - d, x1, y1 + d, color);
    fill_rect(img, x0 - d, y0, x0 + d, y1, color);
    fill_rect(img, x1 - d, y0, x1 + d, y1, color);
}

/// Nested squares 10 pixels apart
pub fn square_pattern(img: &mut GrayImage) {
    let size = img.width().min(img.height());
    let mut side = size.saturating_sub((size as f64 / 20.0).round() as u32);
    while side > 10 {
        let inset = ((size - side) as f64 / 2.0).round() as u32;
        square(img, (side, side), (inset, inset), 1, BLACK, false);
        side -= 10;
    }
}

/// Grid with `spacing` lines per axis
pub fn grid(img: &mut GrayImage, spacing: u32, width: u32, color: u8) {
    let (w, h) = img.dimensions();
    let d = half_width(width);
    let spacing = spacing.max(1);
    let step_x = ((w as f64 / spacing as f64).round() as usize).max(1);
    let step_y = ((h as f64 / spacing as f64).round() as usize).max(1);
    for x in ((w % spacing)..w).step_by(step_x) {
        fill_rect(img, x as i64 - d, 0, x as i64 + d, h as i64, color);
    }
    for y in ((h % spacing)..h).step_by(step_y) {
        fill_rect(img, 0, y as i64 - d, w as i64, y as i64 + d, color);
    }
}

/// Frame around the whole image
pub fn border(img: &mut GrayImage, width: u32) {
    let (w, h) = img.dimensions();
    let d = half_width(width) as u32;
    square(
        img,
        (w.saturating_sub(width), h.saturating_sub(width)),
        (d, d),
        width,
        BLACK,
        false,
    );
}

/// The full calibration set for a `width x height` image
pub fn calibration_set(width: u32, height: u32) -> CamToolResult<Vec<CalibrationImage>> {
    if width == 0 || height == 0 {
        return Err(ParameterError::InvalidDimensions(format!(
            "calibration images need a non-empty size, got {}x{}",
            width, height
        ))
        .into());
    }

    let named = |name: String| format!("{}_{}x{}_pixels.png", name, width, height);
    let mut set = Vec::new();

    for orientation in [
        Orientation::Horizontal,
        Orientation::Vertical,
        Orientation::Diagonal,
    ] {
        let mut img = create_image(width, height);
        gradient(&mut img, orientation);
        set.push(CalibrationImage {
            name: named(format!("gradient_{}", orientation.name())),
            image: img,
        });
    }

    let mut img = create_image(width, height);
    let band = ((width.min(height) as f64 / 10.0).round() as u32).max(1);
    gradient_banding(&mut img, band);
    set.push(CalibrationImage {
        name: named("gradient_banding".to_string()),
        image: img,
    });

    for orientation in [
        Orientation::Horizontal,
        Orientation::Vertical,
        Orientation::Diagonal,
    ] {
        let mut img = create_image(width, height);
        raster_1_pixel(&mut img, orientation, BLACK);
        set.push(CalibrationImage {
            name: named(format!("raster_1_pixel_{}", orientation.name())),
            image: img,
        });
    }

    let mut img = create_image(width, height);
    square_pattern(&mut img);
    set.push(CalibrationImage {
        name: named("squarepattern".to_string()),
        image: img,
    });

    let mut img = create_image(width, height);
    let inset = (width / 16, height / 16);
    square(
        &mut img,
        (width - 2 * inset.0, height - 2 * inset.1),
        inset,
        2,
        BLACK,
        true,
    );
    set.push(CalibrationImage {
        name: named("squarefilled".to_string()),
        image: img,
    });

    let mut img = create_image(width, height);
    border(&mut img, 4);
    set.push(CalibrationImage {
        name: named("border".to_string()),
        image: img,
    });

    let mut img = create_image(width, height);
    grid(&mut img, 10, 2, BLACK);
    set.push(CalibrationImage {
        name: named("grid".to_string()),
        image: img,
    });

    Ok(set)
}

/// Generate the calibration set; save it into `dir` when `write` is set
///
/// Returns the paths of the (possibly unwritten) images.
pub fn generate_calibration_images(
    dir: &Path,
    width: u32,
    height: u32,
    write: bool,
) -> CamToolResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in calibration_set(width, height)? {
        let path = dir.join(&pattern.name);
        if write {
            pattern
                .image
                .save_with_format(&path, image::ImageFormat::Png)?;
            info!("Wrote {}", path.display());
        } else {
            info!("Generated {} (not written)", pattern.name);
        }
        paths.push(path);
    }
    Ok(paths)
}
