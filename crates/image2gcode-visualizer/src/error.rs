//! Error types for reading and validating raster programs.

use image2gcode_core::GcodeError;
use std::io;
use thiserror::Error;

/// Errors that can occur while decoding a program back into a power grid.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The program is not a valid raster program.
    #[error("G-Code error: {0}")]
    Gcode(#[from] GcodeError),

    /// I/O error while reading the program.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The expected grid has a different size than the program's raster.
    #[error("Raster size mismatch: program is {actual}, expected {expected}")]
    SizeMismatch { expected: String, actual: String },

    /// The decoded grid differs from the expected one.
    #[error(
        "Validation failed: {count} pixels differ (first at column {col}, row {row}: expected {expected}, decoded {decoded})"
    )]
    Mismatch {
        count: usize,
        col: usize,
        row: usize,
        expected: u32,
        decoded: u32,
    },
}

/// Result type alias for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;
