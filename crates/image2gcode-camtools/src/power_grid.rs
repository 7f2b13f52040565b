//! Power Grid Builder
//!
//! Maps a grayscale raster to per-pixel laser power: inversion, scaling to
//! `maxpower`, power offset, clamping, noise floor, and edge overscan.
//! Rows are stored bottom-up so that grid row 0 is the bottom of the picture.

use crate::error::{CamToolResult, ParameterError};
use crate::scan_path::ColumnRange;
use image::GrayImage;
use image2gcode_core::GeometryError;
use image2gcode_settings::JobConfig;

/// Brightness to power mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerMapping {
    /// Power for a fully burned pixel
    pub maxpower: u32,
    /// Added to every scaled value before clamping
    pub poweroffset: i32,
    /// Powers at or below this value are dropped
    pub noise: u32,
    /// Dark pixels burn (normal photo engraving)
    pub invert: bool,
}

impl PowerMapping {
    pub fn from_config(config: &JobConfig) -> Self {
        Self {
            maxpower: config.maxpower,
            poweroffset: config.poweroffset,
            noise: config.noise,
            invert: config.invert,
        }
    }

    /// Power for one gray value, in `0..=maxpower`
    pub fn power(&self, gray: u8) -> u32 {
        let raw = if self.invert { 255 - gray } else { gray } as u64;
        let max = self.maxpower as u64;
        // round(raw * max / 255), half up
        let scaled = ((raw * max * 2 + 255) / 510) as i64;
        let shifted = (scaled + self.poweroffset as i64).clamp(0, max as i64) as u32;
        if shifted <= self.noise {
            0
        } else {
            shifted
        }
    }
}

/// Per-pixel laser power, row-major, row 0 at the bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerGrid {
    width: usize,
    height: usize,
    powers: Vec<u32>,
    overscan: Vec<(usize, usize)>,
}

impl PowerGrid {
    /// Create a grid from row-major powers (row 0 first)
    pub fn new(width: usize, height: usize, powers: Vec<u32>) -> CamToolResult<Self> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyRaster { width, height }.into());
        }
        if powers.len() != width * height {
            return Err(GeometryError::BufferSize {
                expected: width * height,
                actual: powers.len(),
            }
            .into());
        }
        Ok(Self {
            width,
            height,
            powers,
            overscan: vec![(0, 0); height],
        })
    }

    /// Create a grid from rows (row 0 first); all rows must have the same length
    pub fn from_rows(rows: &[Vec<u32>]) -> CamToolResult<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != width) {
            return Err(ParameterError::InvalidDimensions("ragged rows".to_string()).into());
        }
        Self::new(width, rows.len(), rows.concat())
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Powers of one row
    pub fn row(&self, row: usize) -> &[u32] {
        &self.powers[row * self.width..(row + 1) * self.width]
    }

    /// Power at `(col, row)`
    pub fn get(&self, col: usize, row: usize) -> u32 {
        self.powers[row * self.width + col]
    }

    /// All powers, row-major
    pub fn as_slice(&self) -> &[u32] {
        &self.powers
    }

    /// First to last non-zero column of a row
    pub fn active_range(&self, row: usize) -> Option<ColumnRange> {
        let powers = self.row(row);
        let start = powers.iter().position(|&p| p > 0)?;
        let end = powers.iter().rposition(|&p| p > 0)?;
        Some(ColumnRange::new(start, end))
    }

    /// Columns added by overscan on the left and right of a row
    pub fn overscan(&self, row: usize) -> (usize, usize) {
        self.overscan[row]
    }

    /// True when column `col` of `row` was filled in by overscan
    pub fn is_overscan(&self, col: usize, row: usize) -> bool {
        let (left, right) = self.overscan[row];
        if left == 0 && right == 0 {
            return false;
        }
        match self.active_range(row) {
            Some(range) => col < range.start + left || col + right > range.end,
            None => false,
        }
    }

    /// Highest power in the grid
    pub fn max_power(&self) -> u32 {
        self.powers.iter().copied().max().unwrap_or(0)
    }

    /// Number of pixels that burn
    pub fn burn_pixels(&self) -> usize {
        self.powers.iter().filter(|&&p| p > 0).count()
    }

    /// Extend each row's non-zero span by `columns` on both sides
    ///
    /// New columns take the power of the nearest non-zero pixel of the row.
    pub fn apply_overscan(&mut self, columns: usize) {
        if columns == 0 {
            return;
        }
        for row in 0..self.height {
            let Some(range) = self.active_range(row) else {
                continue;
            };
            let offset = row * self.width;
            let powers = &mut self.powers[offset..offset + self.width];
            let left = range.start.saturating_sub(columns);
            let right = (range.end + columns).min(self.width - 1);
            let (lo_power, hi_power) = (powers[range.start], powers[range.end]);
            powers[left..range.start].fill(lo_power);
            powers[range.end + 1..=right].fill(hi_power);
            self.overscan[row] = (range.start - left, right - range.end);
        }
    }
}

/// Builds a [`PowerGrid`] from a grayscale image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerGridBuilder {
    mapping: PowerMapping,
    overscan: usize,
}

impl PowerGridBuilder {
    pub fn new(mapping: PowerMapping, overscan: usize) -> Self {
        Self { mapping, overscan }
    }

    pub fn from_config(config: &JobConfig) -> Self {
        Self::new(PowerMapping::from_config(config), config.overscan as usize)
    }

    pub fn mapping(&self) -> PowerMapping {
        self.mapping
    }

    /// Build the grid; picture rows are flipped so the bottom row comes first
    pub fn build(&self, image: &GrayImage) -> CamToolResult<PowerGrid> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let mut powers = Vec::with_capacity(width * height);
        for y in (0..image.height()).rev() {
            for x in 0..image.width() {
                powers.push(self.mapping.power(image.get_pixel(x, y).0[0]));
            }
        }
        let mut grid = PowerGrid::new(width, height, powers)?;
        grid.apply_overscan(self.overscan);
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CamToolError;
    use image::Luma;

    fn mapping(maxpower: u32) -> PowerMapping {
        PowerMapping {
            maxpower,
            poweroffset: 0,
            noise: 0,
            invert: true,
        }
    }

    #[test]
    fn test_power_scaling() {
        let m = mapping(300);
        assert_eq!(m.power(255), 0);
        assert_eq!(m.power(0), 300);
        // 127 * 300 / 255 = 149.41
        assert_eq!(m.power(128), 149);

        let m = mapping(1000);
        // 128 * 1000 / 255 = 501.96
        assert_eq!(m.power(127), 502);
    }

    #[test]
    fn test_power_is_exact_at_full_scale() {
        let m = mapping(255);
        for gray in 0..=255u8 {
            assert_eq!(m.power(gray), 255 - gray as u32);
        }
        let m = mapping(510);
        assert_eq!(m.power(254), 2);
    }

    #[test]
    fn test_noinvert() {
        let m = PowerMapping {
            invert: false,
            ..mapping(255)
        };
        assert_eq!(m.power(200), 200);
        assert_eq!(m.power(0), 0);
    }

    #[test]
    fn test_offset_and_clamping() {
        let m = PowerMapping {
            poweroffset: 50,
            ..mapping(300)
        };
        assert_eq!(m.power(0), 300);
        assert_eq!(m.power(255), 50);

        let m = PowerMapping {
            poweroffset: -100,
            ..mapping(300)
        };
        assert_eq!(m.power(255), 0);
        assert_eq!(m.power(0), 200);

        for gray in 0..=255u8 {
            assert!(m.power(gray) <= 300);
        }
    }

    #[test]
    fn test_noise_floor() {
        let m = PowerMapping {
            noise: 20,
            ..mapping(255)
        };
        // raw 20 -> 20 is at the threshold and dropped
        assert_eq!(m.power(235), 0);
        assert_eq!(m.power(234), 21);
        for gray in 0..=255u8 {
            let p = m.power(gray);
            assert!(p == 0 || p > 20);
        }
    }

    #[test]
    fn test_overscan_extends_edges() {
        let mut row = vec![0; 16];
        row[5..=10].copy_from_slice(&[5, 7, 7, 0, 9, 10]);
        let mut grid = PowerGrid::from_rows(&[row]).unwrap();
        grid.apply_overscan(2);

        assert_eq!(grid.active_range(0), Some(ColumnRange::new(3, 12)));
        assert_eq!(&grid.row(0)[3..5], &[5, 5]);
        assert_eq!(&grid.row(0)[11..13], &[10, 10]);
        assert_eq!(grid.row(0)[2], 0);
        assert_eq!(grid.row(0)[13], 0);
        assert_eq!(grid.overscan(0), (2, 2));
        assert!(grid.is_overscan(3, 0));
        assert!(!grid.is_overscan(5, 0));
        assert!(grid.is_overscan(12, 0));
    }

    #[test]
    fn test_overscan_clamps_to_row() {
        let mut grid = PowerGrid::from_rows(&[vec![0, 4, 0, 0, 8, 0], vec![0; 6]]).unwrap();
        grid.apply_overscan(3);
        assert_eq!(grid.row(0), &[4, 4, 0, 0, 8, 8]);
        assert_eq!(grid.overscan(0), (1, 1));
        assert_eq!(grid.row(1), &[0; 6]);
        assert_eq!(grid.overscan(1), (0, 0));
    }

    #[test]
    fn test_build_flips_rows() {
        let mut image = GrayImage::from_pixel(3, 2, Luma([255]));
        image.put_pixel(0, 0, Luma([0]));
        image.put_pixel(2, 1, Luma([0]));

        let grid = PowerGridBuilder::new(mapping(100), 0).build(&image).unwrap();
        assert_eq!(grid.row(0), &[0, 0, 100]);
        assert_eq!(grid.row(1), &[100, 0, 0]);
        assert_eq!(grid.max_power(), 100);
        assert_eq!(grid.burn_pixels(), 2);
    }

    #[test]
    fn test_grid_dimension_checks() {
        assert!(matches!(
            PowerGrid::new(2, 2, vec![0; 3]),
            Err(CamToolError::Geometry(GeometryError::BufferSize {
                expected: 4,
                actual: 3
            }))
        ));
        assert!(matches!(
            PowerGrid::new(0, 2, vec![]),
            Err(CamToolError::Geometry(GeometryError::EmptyRaster { .. }))
        ));
        assert!(matches!(
            PowerGrid::from_rows(&[vec![1, 2], vec![3]]),
            Err(CamToolError::Parameter(_))
        ));
    }
}
