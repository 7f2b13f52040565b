//! image2gcode Settings Crate
//!
//! Resolves job configuration from built-in defaults, config files, and
//! command line overrides.

pub mod config;
pub mod error;

pub use config::{
    default_config_path, JobConfig, JobOverrides, DEFAULT_MAXPOWER, DEFAULT_PIXELSIZE,
    DEFAULT_SPEED, DEFAULT_SPEEDMOVES,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
