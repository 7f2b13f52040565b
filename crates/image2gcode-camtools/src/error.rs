//! Error types for the CAM tools crate.
//!
//! This module provides structured error types for image loading, parameter
//! validation, and G-Code generation.

use image2gcode_core::GeometryError;
use image2gcode_settings::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during CAM tool operations.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// The source image could not be read or decoded.
    #[error("Failed to decode image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Image processing or encoding failed.
    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    /// The raster could not be placed on the machine plane.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),

    /// The job configuration was rejected.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors related to CAM tool parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// Dimensions are invalid (zero or mismatched).
    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;
