//! Job configuration for image2gcode
//!
//! A job is configured in layers: built-in defaults, then an optional config file,
//! then command line flags. Each layer is a [`JobOverrides`] whose `Some` fields
//! replace the value below it. [`JobConfig::resolve`] folds the layers, validates
//! the result, and hands back an immutable [`JobConfig`].
//!
//! Config files are TOML (`key = value`) or JSON, selected by file extension.

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default pixel size in mm
pub const DEFAULT_PIXELSIZE: f64 = 0.1;
/// Default engraving feed rate in mm/min
pub const DEFAULT_SPEED: u32 = 800;
/// Default maximum laser power (GRBL `S` value)
pub const DEFAULT_MAXPOWER: u32 = 300;
/// Default zero-power run length (mm) that triggers a rapid move
pub const DEFAULT_SPEEDMOVES: f64 = 10.0;

/// Fully resolved job parameters
///
/// Built once before processing starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Pixel size in mm on both axes
    pub pixelsize: f64,
    /// Engraving feed rate in mm/min
    pub speed: u32,
    /// Maximum laser power
    pub maxpower: u32,
    /// Shift applied to every computed power before clamping
    pub poweroffset: i32,
    /// Burn dark pixels (true) or light pixels (false)
    pub invert: bool,
    /// Target engraving size in mm (overrides the pixel pitch)
    pub size: Option<(f64, f64)>,
    /// Machine position of the lower-left image corner in mm
    pub offset: Option<(f64, f64)>,
    /// Center the engraving on the machine origin
    pub center: bool,
    /// Zero-power run length in mm at or above which a rapid move is used (0 disables)
    pub speedmoves: f64,
    /// Powers at or below this level are not burned
    pub noise: u32,
    /// Pixels to keep burning past the content edge of every row
    pub overscan: u32,
    /// Highlight overscan pixels in the preview image
    ///
    /// Only the preview changes: overscan pixels are always burned at the power
    /// of their row edge, never at a marker power, so the G-Code is unaffected.
    pub showoverscan: bool,
    /// Constant burn mode M3 instead of dynamic mode M4
    pub constantburn: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            pixelsize: DEFAULT_PIXELSIZE,
            speed: DEFAULT_SPEED,
            maxpower: DEFAULT_MAXPOWER,
            poweroffset: 0,
            invert: true,
            size: None,
            offset: None,
            center: false,
            speedmoves: DEFAULT_SPEEDMOVES,
            noise: 0,
            overscan: 0,
            showoverscan: false,
            constantburn: false,
        }
    }
}

impl JobConfig {
    /// Fold override layers (lowest precedence first) over the defaults and validate.
    pub fn resolve(layers: &[&JobOverrides]) -> ConfigResult<Self> {
        let mut config = Self::default();
        for layer in layers {
            layer.check_exclusive()?;
            config.apply(layer);
        }
        config.validate()?;
        Ok(config)
    }

    /// Apply one override layer. `offset` and `center` replace each other.
    fn apply(&mut self, layer: &JobOverrides) {
        if let Some(v) = layer.pixelsize {
            self.pixelsize = v;
        }
        if let Some(v) = layer.speed {
            self.speed = v;
        }
        if let Some(v) = layer.maxpower {
            self.maxpower = v;
        }
        if let Some(v) = layer.poweroffset {
            self.poweroffset = v;
        }
        if let Some(v) = layer.invert {
            self.invert = v;
        }
        if let Some(v) = layer.size {
            self.size = Some(v);
        }
        if let Some(v) = layer.offset {
            self.offset = Some(v);
            self.center = false;
        }
        if let Some(v) = layer.center {
            self.center = v;
            if v {
                self.offset = None;
            }
        }
        if let Some(v) = layer.speedmoves {
            self.speedmoves = v;
        }
        if let Some(v) = layer.noise {
            self.noise = v;
        }
        if let Some(v) = layer.overscan {
            self.overscan = v;
        }
        if let Some(v) = layer.showoverscan {
            self.showoverscan = v;
        }
        if let Some(v) = layer.constantburn {
            self.constantburn = v;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.pixelsize.is_finite() || self.pixelsize <= 0.0 {
            return Err(ConfigError::out_of_range(
                "pixelsize",
                self.pixelsize,
                "must be > 0",
            ));
        }

        if self.speed == 0 {
            return Err(ConfigError::out_of_range("speed", self.speed, "must be > 0"));
        }

        if self.maxpower == 0 {
            return Err(ConfigError::out_of_range(
                "maxpower",
                self.maxpower,
                "must be > 0",
            ));
        }

        if self.poweroffset.unsigned_abs() > self.maxpower {
            return Err(ConfigError::out_of_range(
                "poweroffset",
                self.poweroffset,
                format!("must be within -{0}..={0}", self.maxpower),
            ));
        }

        if self.noise > self.maxpower {
            return Err(ConfigError::out_of_range(
                "noise",
                self.noise,
                format!("must be <= maxpower ({})", self.maxpower),
            ));
        }

        if !self.speedmoves.is_finite() || self.speedmoves < 0.0 {
            return Err(ConfigError::out_of_range(
                "speedmoves",
                self.speedmoves,
                "must be >= 0",
            ));
        }

        if let Some((w, h)) = self.size {
            if !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0) {
                return Err(ConfigError::out_of_range(
                    "size",
                    format!("{} {}", w, h),
                    "width and height must be > 0",
                ));
            }
        }

        if let Some((x, y)) = self.offset {
            if !(x.is_finite() && y.is_finite()) {
                return Err(ConfigError::out_of_range(
                    "offset",
                    format!("{} {}", x, y),
                    "must be finite",
                ));
            }
        }

        if self.center && self.offset.is_some() {
            return Err(ConfigError::Conflict {
                first: "offset".to_string(),
                second: "center".to_string(),
            });
        }

        Ok(())
    }

    /// Every option as `(key, value)` in a fixed order, for the G-Code header.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let pair = |p: Option<(f64, f64)>| match p {
            Some((a, b)) => format!("{} {}", a, b),
            None => "none".to_string(),
        };
        vec![
            ("pixelsize", self.pixelsize.to_string()),
            ("speed", self.speed.to_string()),
            ("maxpower", self.maxpower.to_string()),
            ("poweroffset", self.poweroffset.to_string()),
            ("invert", self.invert.to_string()),
            ("size", pair(self.size)),
            ("offset", pair(self.offset)),
            ("center", self.center.to_string()),
            ("speedmoves", self.speedmoves.to_string()),
            ("noise", self.noise.to_string()),
            ("overscan", self.overscan.to_string()),
            ("showoverscan", self.showoverscan.to_string()),
            ("constantburn", self.constantburn.to_string()),
        ]
    }
}

/// One layer of optional job settings (config file or command line)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobOverrides {
    pub pixelsize: Option<f64>,
    pub speed: Option<u32>,
    pub maxpower: Option<u32>,
    pub poweroffset: Option<i32>,
    pub invert: Option<bool>,
    pub size: Option<(f64, f64)>,
    pub offset: Option<(f64, f64)>,
    pub center: Option<bool>,
    pub speedmoves: Option<f64>,
    pub noise: Option<u32>,
    pub overscan: Option<u32>,
    pub showoverscan: Option<bool>,
    pub constantburn: Option<bool>,
}

impl JobOverrides {
    /// Create an empty layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a layer from file (JSON, or TOML for `.toml`/`.conf`/`.cfg`)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::LoadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let layer: Self = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "toml" | "conf" | "cfg" => toml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(if other.is_empty() {
                    path.display().to_string()
                } else {
                    other.to_string()
                })
                .into())
            }
        };

        layer.check_exclusive()?;
        debug!("Loaded job settings from {}: {:?}", path.display(), layer);
        Ok(layer)
    }

    /// `offset` and `center` may not both be set in one layer
    pub fn check_exclusive(&self) -> ConfigResult<()> {
        if self.offset.is_some() && self.center == Some(true) {
            return Err(ConfigError::Conflict {
                first: "offset".to_string(),
                second: "center".to_string(),
            });
        }
        Ok(())
    }
}

/// Default config file location (`<config dir>/image2gcode/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("image2gcode").join("config.toml"))
}
