//! Error handling for image2gcode
//!
//! Provides the error types shared by every layer of the converter:
//! - G-Code errors (reading back emitted programs)
//! - Geometry errors (raster dimensions and coordinate mapping)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// G-Code error type
///
/// Represents errors found while reading a raster G-Code program back in.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Invalid G-Code syntax
    #[error("Invalid syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// The line number where the syntax error occurred.
        line_number: u32,
        /// The reason for the syntax error.
        reason: String,
    },

    /// Unknown G-Code command
    #[error("Unknown G-Code at line {line_number}: {code}")]
    UnknownCode {
        /// The line number where the unknown code was found.
        line_number: u32,
        /// The unknown G-Code command.
        code: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' at line {line_number}: {reason}")]
    InvalidParameter {
        /// The line number where the invalid parameter was found.
        line_number: u32,
        /// The parameter name.
        param: String,
        /// The reason the parameter is invalid.
        reason: String,
    },

    /// Missing required header field
    #[error("Missing header field '{field}'")]
    MissingHeader {
        /// The header key that was not found.
        field: String,
    },

    /// Coordinate outside the raster
    #[error("Coordinate {coordinate} out of raster at line {line_number}: {bounds}")]
    CoordinateOutOfBounds {
        /// The line number where the out-of-bounds coordinate was found.
        line_number: u32,
        /// The coordinate value that is out of bounds.
        coordinate: String,
        /// The valid bounds for the coordinate.
        bounds: String,
    },

    /// Move that a raster program never produces
    #[error("Invalid modal state at line {line_number}: {reason}")]
    InvalidModalState {
        /// The line number of the offending move.
        line_number: u32,
        /// The reason for the invalid modal state.
        reason: String,
    },
}

/// Geometry error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Raster has no pixels
    #[error("Empty raster: {width}x{height} pixels")]
    EmptyRaster {
        /// Raster width in pixels.
        width: usize,
        /// Raster height in pixels.
        height: usize,
    },

    /// Pixel data does not match the declared dimensions
    #[error("Pixel buffer holds {actual} values, expected {expected}")]
    BufferSize {
        /// Number of values expected from the dimensions.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// Pitch is zero, negative or not finite
    #[error("Invalid pitch: {0}")]
    InvalidPitch(f64),

    /// Pitch is finer than one coordinate step, so neighboring pixels would share a coordinate
    #[error("Pitch {pitch} mm is finer than the {digits}-decimal coordinate resolution")]
    PitchBelowResolution {
        /// Offending pitch in mm.
        pitch: f64,
        /// Number of decimals in use.
        digits: u8,
    },
}
