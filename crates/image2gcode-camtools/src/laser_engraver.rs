//! Laser Raster Engraving Tool
//!
//! Converts bitmap images to G-code for laser engraving using bidirectional
//! raster scanning. Pixel brightness becomes laser power, long blank gaps are
//! crossed with the laser off, and every coordinate is written only when it
//! changes. Images are rendered from bottom to top to match device coordinate
//! space where Y increases upward.

use crate::coordinates::CoordinateMapper;
use crate::emitter::{EmittedProgram, GcodeEmitter, JobStats};
use crate::error::{CamToolError, CamToolResult};
use crate::power_grid::{PowerGrid, PowerGridBuilder};
use crate::preview;
use crate::scan_path::{plan_rows, RowPlan};
use crate::segments::SegmentBuilder;
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use image2gcode_core::{BoundingBox, RasterGeometry};
use image2gcode_settings::JobConfig;
use std::path::Path;
use tracing::{debug, info, warn};

/// Tool version written into the program header
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Flatten an image onto a white background and convert it to grayscale
pub fn composite_on_white(img: &DynamicImage) -> GrayImage {
    let rgba = img.to_rgba8();
    let mut canvas = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut canvas, &rgba, 0, 0);
    DynamicImage::ImageRgba8(canvas).to_luma8()
}

/// A generated raster program: comment header plus command body
#[derive(Debug, Clone, PartialEq)]
pub struct RasterProgram {
    pub header: Vec<String>,
    pub body: EmittedProgram,
}

impl RasterProgram {
    pub fn stats(&self) -> &JobStats {
        &self.body.stats
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.body.bbox
    }

    /// Full program text, one instruction per line
    pub fn to_gcode(&self) -> String {
        let mut gcode = String::new();
        for line in self.header.iter().chain(self.body.lines.iter()) {
            gcode.push_str(line);
            gcode.push('\n');
        }
        gcode
    }
}

/// Laser engraving tool for raster images
#[derive(Debug, Clone)]
pub struct RasterEngraver {
    config: JobConfig,
    grid: PowerGrid,
    geometry: RasterGeometry,
    source: Option<String>,
}

impl RasterEngraver {
    /// Create a new laser engraver from an image file
    pub fn from_file<P: AsRef<Path>>(path: P, config: JobConfig) -> CamToolResult<Self> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| CamToolError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            "Loaded {} ({}x{}, {:?})",
            path.display(),
            img.width(),
            img.height(),
            img.color()
        );
        let mut engraver = Self::from_image(img, config)?;
        engraver.source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        Ok(engraver)
    }

    /// Create a new laser engraver from a DynamicImage
    pub fn from_image(img: DynamicImage, config: JobConfig) -> CamToolResult<Self> {
        let gray = composite_on_white(&img);
        let grid = PowerGridBuilder::from_config(&config).build(&gray)?;
        Self::from_power_grid(grid, config)
    }

    /// Create a new laser engraver from an already transformed power grid
    pub fn from_power_grid(grid: PowerGrid, config: JobConfig) -> CamToolResult<Self> {
        config.validate()?;
        let geometry = CoordinateMapper::new(&config).map(grid.width(), grid.height())?;
        if grid.burn_pixels() == 0 {
            warn!("Image has no pixel to burn; the program will only move to the origin");
        }
        Ok(Self {
            config,
            grid,
            geometry,
            source: None,
        })
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    /// The transformed power grid the program encodes
    pub fn power_grid(&self) -> &PowerGrid {
        &self.grid
    }

    pub fn geometry(&self) -> &RasterGeometry {
        &self.geometry
    }

    /// Get the output dimensions in millimeters
    pub fn output_size_mm(&self) -> (f64, f64) {
        (self.geometry.extent().width(), self.geometry.extent().height())
    }

    /// Grayscale rendering of the power grid in picture orientation
    pub fn render_preview(&self) -> GrayImage {
        preview::render(&self.grid, self.config.maxpower, self.config.showoverscan)
    }

    /// Generate G-code for laser engraving
    pub fn generate_gcode(&self) -> String {
        self.generate().to_gcode()
    }

    /// Generate G-code for laser engraving with progress callback
    pub fn generate_gcode_with_progress<F>(&self, progress_callback: F) -> String
    where
        F: FnMut(f32),
    {
        self.generate_with_progress(progress_callback).to_gcode()
    }

    /// Generate the program with header, body, and statistics
    pub fn generate(&self) -> RasterProgram {
        self.generate_with_progress(|_| {})
    }

    /// Generate the program, reporting progress in `0.0..=1.0`
    pub fn generate_with_progress<F>(&self, mut progress_callback: F) -> RasterProgram
    where
        F: FnMut(f32),
    {
        progress_callback(0.0);

        let mut emitter = GcodeEmitter::from_config(&self.config, self.geometry);
        let segment_builder = SegmentBuilder::new(self.geometry.pitch().0, self.config.speedmoves);
        emitter.preamble();

        let plans = plan_rows(&self.grid);
        let height = plans.len();
        for (index, plan) in plans.into_iter().enumerate() {
            if index % 10 == 0 || index + 1 == height {
                progress_callback(index as f32 / height as f32);
            }
            match plan {
                RowPlan::Skip { row } => debug!("Row {}: blank, skipped", row),
                RowPlan::Scan {
                    row,
                    range,
                    direction,
                } => {
                    let segments = segment_builder.build(self.grid.row(row), range, direction);
                    debug!(
                        "Row {}: columns {}..={} {:?}, {} segments",
                        row,
                        range.start,
                        range.end,
                        direction,
                        segments.len()
                    );
                    emitter.emit_row(row, &segments, direction);
                }
            }
        }

        let body = emitter.finish();
        let stats = body.stats;
        info!(
            "Generated {} G0 and {} G1 moves: burn {:.2} mm, rapid {:.2} mm, ~{:.2} min",
            stats.rapid_moves,
            stats.linear_moves,
            stats.burn_mm,
            stats.rapid_mm,
            stats.linear_minutes(self.config.speed)
        );
        info!("{}", body.bbox);

        let header = self.header(&body);
        progress_callback(1.0);
        RasterProgram { header, body }
    }

    fn header(&self, body: &EmittedProgram) -> Vec<String> {
        let geometry = &self.geometry;
        let (pitch_x, pitch_y) = geometry.pitch();
        let (origin_x, origin_y) = geometry.origin_ticks();
        let (width_mm, height_mm) = self.output_size_mm();
        let stats = &body.stats;

        let mut header = vec![format!("; image2gcode {}", VERSION)];
        if let Some(source) = &self.source {
            header.push(format!("; source: {}", source));
        }
        header.push("; arguments:".to_string());
        for (key, value) in self.config.entries() {
            header.push(format!(";     {}: {}", key, value));
        }
        header.push(";".to_string());
        header.push(format!(
            "; image: {}x{} px",
            geometry.width(),
            geometry.height()
        ));
        header.push(format!("; pitch: {}x{} mm", pitch_x, pitch_y));
        header.push(format!(
            "; origin: X{} Y{}",
            geometry.format(origin_x),
            geometry.format(origin_y)
        ));
        header.push(format!("; precision: {}", geometry.precision().digits()));
        header.push(format!("; print area: {:.2}x{:.2} mm", width_mm, height_mm));
        header.push(format!("; {}", body.bbox));
        header.push(format!(
            "; moves: {} G0, {} G1",
            stats.rapid_moves, stats.linear_moves
        ));
        header.push(format!(
            "; burn length: {:.2} mm, rapid length: {:.2} mm",
            stats.burn_mm, stats.rapid_mm
        ));
        header.push(format!(
            "; estimated burn time: {:.2} min",
            stats.linear_minutes(self.config.speed)
        ));
        header.push(";".to_string());
        header
    }
}
