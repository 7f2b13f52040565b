//! G-Code Emitter
//!
//! State machine that turns row segments into a minimal GRBL command stream.
//! It owns the cursor (last emitted X, Y, and S) and the laser state, writes a
//! coordinate only when it changes, and tracks the bounding box and move
//! statistics of everything it emits.

use crate::scan_path::ScanDirection;
use crate::segments::{Segment, LENGTH_EPSILON};
use image2gcode_core::{BoundingBox, RasterGeometry};
use image2gcode_settings::JobConfig;

/// Laser mode, fixed for the whole job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaserMode {
    /// `M3`: constant power
    Constant,
    /// `M4`: power scaled with feed (dynamic)
    Dynamic,
}

impl LaserMode {
    pub fn from_config(config: &JobConfig) -> Self {
        if config.constantburn {
            Self::Constant
        } else {
            Self::Dynamic
        }
    }

    /// Command that arms the laser
    pub fn command(self) -> &'static str {
        match self {
            Self::Constant => "M3",
            Self::Dynamic => "M4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaserState {
    #[default]
    Off,
    Burn,
}

/// Last emitted machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorState {
    /// X in ticks
    pub x: Option<i64>,
    /// Y in ticks
    pub y: Option<i64>,
    /// Last `S` value
    pub power: Option<u32>,
    pub laser: LaserState,
}

impl CursorState {
    fn is_at(&self, x: i64, y: i64) -> bool {
        self.x == Some(x) && self.y == Some(y)
    }
}

/// Move statistics of a job
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JobStats {
    /// Number of `G0` moves
    pub rapid_moves: usize,
    /// Number of `G1` moves
    pub linear_moves: usize,
    /// Length of `G1` moves with power, mm
    pub burn_mm: f64,
    /// Length of `G1 S0` moves, mm
    pub travel_mm: f64,
    /// Length of `G0` moves, mm
    pub rapid_mm: f64,
}

impl JobStats {
    /// Time spent on linear moves at `speed` mm/min, in minutes
    pub fn linear_minutes(&self, speed: u32) -> f64 {
        if speed == 0 {
            return 0.0;
        }
        (self.burn_mm + self.travel_mm) / speed as f64
    }
}

/// Output of a finished emitter
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedProgram {
    pub lines: Vec<String>,
    pub bbox: BoundingBox,
    pub stats: JobStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Rapid,
    Linear,
}

impl Motion {
    fn word(self) -> &'static str {
        match self {
            Self::Rapid => "G0",
            Self::Linear => "G1",
        }
    }
}

/// Minimal-output G-Code writer for raster rows
#[derive(Debug, Clone)]
pub struct GcodeEmitter {
    geometry: RasterGeometry,
    mode: LaserMode,
    speed: u32,
    speedmoves: f64,
    cursor: CursorState,
    feed_written: bool,
    lines: Vec<String>,
    bbox: BoundingBox,
    stats: JobStats,
}

impl GcodeEmitter {
    pub fn new(geometry: RasterGeometry, mode: LaserMode, speed: u32, speedmoves: f64) -> Self {
        Self {
            geometry,
            mode,
            speed,
            speedmoves,
            cursor: CursorState::default(),
            feed_written: false,
            lines: Vec::new(),
            bbox: BoundingBox::new(),
            stats: JobStats::default(),
        }
    }

    pub fn from_config(config: &JobConfig, geometry: RasterGeometry) -> Self {
        Self::new(
            geometry,
            LaserMode::from_config(config),
            config.speed,
            config.speedmoves,
        )
    }

    pub fn cursor(&self) -> &CursorState {
        &self.cursor
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Units, absolute mode, air assist, and a rapid to the raster origin
    pub fn preamble(&mut self) {
        self.lines.push("G21".to_string());
        self.lines.push("G90".to_string());
        self.lines.push("M8".to_string());
        let (x, y) = (self.geometry.x_ticks(0), self.geometry.y_ticks(0));
        self.move_to(Motion::Rapid, x, y, None);
    }

    /// Emit the segments of grid row `row`, traversed along `direction`
    pub fn emit_row(&mut self, row: usize, segments: &[Segment], direction: ScanDirection) {
        let y = self.geometry.y_ticks(row);
        for segment in segments {
            let exit = self.geometry.x_ticks(segment.exit_edge(direction));
            if segment.speed_move {
                self.laser_off();
                self.move_to(Motion::Rapid, exit, y, None);
            } else if segment.is_burn() {
                let entry = self.geometry.x_ticks(segment.entry_edge(direction));
                self.position_to(entry, y);
                self.laser_on();
                self.move_to(Motion::Linear, exit, y, Some(segment.power));
            }
            // Short zero runs are crossed by the next positioning move.
        }
    }

    /// Switch the laser and air assist off, end the program, and hand it over
    pub fn finish(mut self) -> EmittedProgram {
        self.laser_off();
        self.lines.push("M9".to_string());
        self.lines.push("M2".to_string());
        EmittedProgram {
            lines: self.lines,
            bbox: self.bbox,
            stats: self.stats,
        }
    }

    /// Bring the idle head to `(x, y)` without burning
    fn position_to(&mut self, x: i64, y: i64) {
        if self.cursor.is_at(x, y) {
            return;
        }
        match self.cursor.laser {
            LaserState::Off => self.move_to(Motion::Rapid, x, y, None),
            LaserState::Burn => {
                if self.speedmoves > 0.0 && self.distance_to(x, y) + LENGTH_EPSILON >= self.speedmoves {
                    self.laser_off();
                    self.move_to(Motion::Rapid, x, y, None);
                } else {
                    self.move_to(Motion::Linear, x, y, Some(0));
                }
            }
        }
    }

    fn distance_to(&self, x: i64, y: i64) -> f64 {
        match (self.cursor.x, self.cursor.y) {
            (Some(cx), Some(cy)) => self
                .geometry
                .point(cx, cy)
                .distance_to(&self.geometry.point(x, y)),
            _ => f64::INFINITY,
        }
    }

    fn laser_on(&mut self) {
        if self.cursor.laser == LaserState::Off {
            self.lines.push(self.mode.command().to_string());
            self.cursor.laser = LaserState::Burn;
        }
    }

    fn laser_off(&mut self) {
        if self.cursor.laser == LaserState::Burn {
            self.lines.push("M5".to_string());
            self.cursor.laser = LaserState::Off;
        }
    }

    fn move_to(&mut self, motion: Motion, x: i64, y: i64, power: Option<u32>) {
        let x_changed = self.cursor.x != Some(x);
        let y_changed = self.cursor.y != Some(y);
        if !x_changed && !y_changed {
            return;
        }

        let mut line = String::from(motion.word());
        if x_changed {
            line.push_str(&format!(" X{}", self.geometry.format(x)));
        }
        if y_changed {
            line.push_str(&format!(" Y{}", self.geometry.format(y)));
        }
        if let Some(power) = power {
            if self.cursor.power != Some(power) {
                line.push_str(&format!(" S{}", power));
                self.cursor.power = Some(power);
            }
        }
        if motion == Motion::Linear && !self.feed_written {
            line.push_str(&format!(" F{}", self.speed));
            self.feed_written = true;
        }

        let distance = match (self.cursor.x, self.cursor.y) {
            (Some(_), Some(_)) => self.distance_to(x, y),
            _ => 0.0,
        };
        match (motion, power) {
            (Motion::Rapid, _) => {
                self.stats.rapid_moves += 1;
                self.stats.rapid_mm += distance;
            }
            (Motion::Linear, Some(0)) | (Motion::Linear, None) => {
                self.stats.linear_moves += 1;
                self.stats.travel_mm += distance;
            }
            (Motion::Linear, Some(_)) => {
                self.stats.linear_moves += 1;
                self.stats.burn_mm += distance;
            }
        }

        self.cursor.x = Some(x);
        self.cursor.y = Some(y);
        self.bbox.update(self.geometry.point(x, y));
        self.lines.push(line);
    }
}

/// Count lines starting with a command word (e.g. `"G1"`)
pub fn count_commands(lines: &[String], word: &str) -> usize {
    lines
        .iter()
        .filter(|line| line.split_whitespace().next() == Some(word))
        .count()
}
