//! # image2gcode CAM Tools
//!
//! Converts raster images into GRBL laser G-Code.
//!
//! ## Pipeline
//!
//! - **Power Grid Builder**: grayscale pixels to clamped laser power, with noise floor and overscan
//! - **Scan Path Planner**: active columns and serpentine direction per row
//! - **Segment Builder**: equal-power runs and speed-move gaps
//! - **G-Code Emitter**: minimal command stream with coordinate de-duplication
//! - **Coordinate Mapper**: pixel edges to machine millimeters
//!
//! ## Supporting Tools
//!
//! - **Preview**: grayscale rendering of the power grid
//! - **Calibration**: test pattern generator

pub mod calibration;
pub mod coordinates;
pub mod emitter;
pub mod error;
pub mod laser_engraver;
pub mod power_grid;
pub mod preview;
pub mod scan_path;
pub mod segments;

// Re-export commonly used items
pub use calibration::{calibration_set, generate_calibration_images, CalibrationImage, Orientation};
pub use coordinates::CoordinateMapper;
pub use emitter::{
    count_commands, CursorState, EmittedProgram, GcodeEmitter, JobStats, LaserMode, LaserState,
};
pub use error::{CamToolError, CamToolResult, ParameterError};
pub use laser_engraver::{composite_on_white, RasterEngraver, RasterProgram, VERSION};
pub use power_grid::{PowerGrid, PowerGridBuilder, PowerMapping};
pub use scan_path::{plan_rows, ColumnRange, RowPlan, ScanDirection};
pub use segments::{Segment, SegmentBuilder};
