//! # image2gcode
//!
//! Converts raster images into G-Code for GRBL diode laser engravers.
//!
//! ## Architecture
//!
//! image2gcode is organized as a workspace with multiple crates:
//!
//! 1. **image2gcode-core** - Error types, fixed-precision coordinates, raster geometry
//! 2. **image2gcode-settings** - Job configuration from defaults, config file, and command line
//! 3. **image2gcode-camtools** - Power grid, scan planning, G-Code emission, preview, calibration
//! 4. **image2gcode-visualizer** - Reads raster G-Code back into a power grid for validation
//! 5. **image2gcode** - Command line binary that integrates all crates
//!
//! ## Features
//!
//! - **Grayscale Power Mapping**: brightness to laser power with offset, noise floor, and overscan
//! - **Serpentine Raster Scan**: run-length merged burns and rapid skips over long blank gaps
//! - **Minimal Output**: coordinates and power written only when they change
//! - **Round-Trip Validation**: decode the written program and compare it pixel by pixel

pub mod cli;

pub use image2gcode_camtools::{
    CamToolError, JobStats, PowerGrid, RasterEngraver, RasterProgram,
};
pub use image2gcode_core::{BoundingBox, GcodeError, Point, Precision, RasterGeometry};
pub use image2gcode_settings::{ConfigError, JobConfig, JobOverrides, SettingsError};
pub use image2gcode_visualizer::{DecodeError, DecodedRaster};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Output on stderr, so G-Code written to stdout stays clean
/// - RUST_LOG environment variable support (default level INFO)
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;

    Ok(())
}
