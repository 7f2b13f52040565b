//! # image2gcode Visualizer
//!
//! Reads raster G-Code back into a power grid. Used to prove that a generated
//! program burns exactly the grid it was generated from.

pub mod error;
pub mod gcode;
pub mod rasterizer;

pub use error::{DecodeError, DecodeResult};
pub use gcode::{parse_line, ParsedLine, Word};
pub use rasterizer::{
    rasterize, rasterize_file, validate, DecodedRaster, GcodeRasterizer, RasterHeader,
};
