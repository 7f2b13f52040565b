//! # image2gcode Core
//!
//! Core types and utilities shared by the image2gcode crates:
//! error types, fixed-precision coordinates, and bounding boxes.

pub mod error;
pub mod geometry;
pub mod types;
pub mod units;

pub use error::{GcodeError, GeometryError};
pub use geometry::{BoundingBox, Point, RasterGeometry};
pub use types::BoxedIterator;
pub use units::Precision;
