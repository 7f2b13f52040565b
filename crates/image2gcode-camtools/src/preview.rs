//! Power grid preview
//!
//! Renders the transformed power grid as a grayscale picture: power 0 is white,
//! `maxpower` is black. Overscan pixels can be highlighted in a marker gray.

use crate::error::CamToolResult;
use crate::power_grid::PowerGrid;
use image::{GrayImage, Luma};
use std::path::{Path, PathBuf};
use tracing::info;

/// Gray used for overscan pixels when they are highlighted
pub const OVERSCAN_GRAY: u8 = 180;

/// Gray level for `power` on a `0..=maxpower` scale
pub fn power_to_gray(power: u32, maxpower: u32) -> u8 {
    let max = maxpower.max(1) as u64;
    let power = (power as u64).min(max);
    let shade = (power * 255 * 2 + max) / (2 * max);
    (255 - shade) as u8
}

/// Render `grid` in picture orientation (grid row 0 at the bottom)
pub fn render(grid: &PowerGrid, maxpower: u32, highlight_overscan: bool) -> GrayImage {
    let height = grid.height();
    GrayImage::from_fn(grid.width() as u32, height as u32, |x, y| {
        let row = height - 1 - y as usize;
        let col = x as usize;
        if highlight_overscan && grid.is_overscan(col, row) {
            Luma([OVERSCAN_GRAY])
        } else {
            Luma([power_to_gray(grid.get(col, row), maxpower)])
        }
    })
}

/// Where a preview goes: next to the output, or into the temp dir
pub fn preview_path(output: Option<&Path>, image: &Path) -> PathBuf {
    match output {
        Some(output) => output.with_extension("preview.png"),
        None => {
            let stem = image
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "image".to_string());
            std::env::temp_dir().join(format!("{}.preview.png", stem))
        }
    }
}

/// Write a rendering to `path` as PNG
pub fn save(preview: &GrayImage, path: &Path) -> CamToolResult<()> {
    preview.save_with_format(path, image::ImageFormat::Png)?;
    info!("Preview written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_to_gray() {
        assert_eq!(power_to_gray(0, 300), 255);
        assert_eq!(power_to_gray(300, 300), 0);
        assert_eq!(power_to_gray(150, 300), 127);
        assert_eq!(power_to_gray(500, 300), 0);
        assert_eq!(power_to_gray(0, 0), 255);
    }

    #[test]
    fn test_render_restores_picture_orientation() {
        let grid = PowerGrid::from_rows(&[vec![100, 0], vec![0, 0]]).unwrap();
        let preview = render(&grid, 100, false);
        assert_eq!(preview.get_pixel(0, 1), &Luma([0]));
        assert_eq!(preview.get_pixel(0, 0), &Luma([255]));
    }

    #[test]
    fn test_render_highlights_overscan() {
        let mut grid = PowerGrid::from_rows(&[vec![0, 0, 50, 0]]).unwrap();
        grid.apply_overscan(1);

        let plain = render(&grid, 100, false);
        assert_eq!(plain.get_pixel(1, 0), &Luma([127]));

        let marked = render(&grid, 100, true);
        assert_eq!(marked.get_pixel(1, 0), &Luma([OVERSCAN_GRAY]));
        assert_eq!(marked.get_pixel(3, 0), &Luma([OVERSCAN_GRAY]));
        assert_eq!(marked.get_pixel(2, 0), &Luma([127]));
        assert_eq!(marked.get_pixel(0, 0), &Luma([255]));
    }

    #[test]
    fn test_preview_path() {
        assert_eq!(
            preview_path(Some(Path::new("out/job.gcode")), Path::new("cat.png")),
            PathBuf::from("out/job.preview.png")
        );
        let temp = preview_path(None, Path::new("pics/cat.png"));
        assert!(temp.ends_with("cat.preview.png"));
    }

    #[test]
    fn test_save_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.preview.png");
        let grid = PowerGrid::from_rows(&[vec![1, 2, 3]]).unwrap();
        save(&render(&grid, 3, false), &path).unwrap();
        let loaded = image::open(&path).unwrap().to_luma8();
        assert_eq!(loaded.dimensions(), (3, 1));
    }
}
