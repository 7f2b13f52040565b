//! Coordinate Mapper
//!
//! Places a `width x height` pixel raster on the machine plane: pixel pitch from
//! `pixelsize` or a target `size`, origin from `offset` or `center`, and the decimal
//! precision used for every emitted coordinate.

use crate::error::CamToolResult;
use image2gcode_core::{Precision, RasterGeometry};
use image2gcode_settings::JobConfig;
use tracing::debug;

/// Minimum number of decimals when the pitch comes from a target size
pub const SIZED_MIN_DIGITS: u8 = 3;

/// Resolves raster geometry from the job configuration
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateMapper {
    pixelsize: f64,
    size: Option<(f64, f64)>,
    offset: (f64, f64),
    center: bool,
}

impl CoordinateMapper {
    /// Create a mapper from a resolved job configuration
    pub fn new(config: &JobConfig) -> Self {
        Self {
            pixelsize: config.pixelsize,
            size: config.size,
            offset: config.offset.unwrap_or((0.0, 0.0)),
            center: config.center,
        }
    }

    /// Pixel pitch `(x, y)` in mm for an image of the given dimensions
    pub fn pitch(&self, width: usize, height: usize) -> (f64, f64) {
        match self.size {
            Some((w, h)) => (w / width.max(1) as f64, h / height.max(1) as f64),
            None => (self.pixelsize, self.pixelsize),
        }
    }

    /// Coordinate precision for the given pitch
    pub fn precision(&self, pitch: (f64, f64)) -> Precision {
        let base = Precision::from_step(self.pixelsize);
        if self.size.is_none() {
            return base;
        }

        // Keep every pixel edge on a distinct tick.
        let finest = pitch.0.min(pitch.1);
        let mut digits = base.digits().max(SIZED_MIN_DIGITS);
        while digits < Precision::MAX_DIGITS && finest * Precision::new(digits).scale() < 1.0 {
            digits += 1;
        }
        Precision::new(digits)
    }

    /// Origin `(x, y)` in mm for a raster of the given size
    pub fn origin(&self, width: usize, height: usize, pitch: (f64, f64)) -> (f64, f64) {
        if self.center {
            (
                -(width as f64 * pitch.0) / 2.0,
                -(height as f64 * pitch.1) / 2.0,
            )
        } else {
            self.offset
        }
    }

    /// Resolve the full geometry for a `width x height` raster
    pub fn map(&self, width: usize, height: usize) -> CamToolResult<RasterGeometry> {
        let pitch = self.pitch(width, height);
        let precision = self.precision(pitch);
        let origin = self.origin(width, height, pitch);
        let geometry = RasterGeometry::new(width, height, pitch, origin, precision)?;
        debug!(
            "Raster {}x{} px, pitch {}x{} mm, origin {:?}, {} decimals",
            width,
            height,
            pitch.0,
            pitch.1,
            geometry.origin(),
            precision.digits()
        );
        Ok(geometry)
    }
}
