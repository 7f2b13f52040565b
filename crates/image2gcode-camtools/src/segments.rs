//! Segment Builder
//!
//! Run-length encodes the active range of a row into equal-power segments, in
//! traversal order, and flags long zero-power gaps as speed moves.

use crate::scan_path::{ColumnRange, ScanDirection};
use image2gcode_core::BoxedIterator;

/// Slack for the inclusive speed-move length comparison
pub(crate) const LENGTH_EPSILON: f64 = 1e-9;

/// A run of columns sharing one power value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Lowest column of the run
    pub start: usize,
    /// Highest column of the run (inclusive)
    pub end: usize,
    /// Power of every column in the run
    pub power: u32,
    /// Zero-power run long enough to cross with the laser off
    pub speed_move: bool,
}

impl Segment {
    /// Number of columns
    pub fn columns(&self) -> usize {
        self.end + 1 - self.start
    }

    pub fn is_burn(&self) -> bool {
        self.power > 0
    }

    /// Column edge where the head enters the run
    pub fn entry_edge(&self, direction: ScanDirection) -> usize {
        match direction {
            ScanDirection::LeftToRight => self.start,
            ScanDirection::RightToLeft => self.end + 1,
        }
    }

    /// Column edge where the head leaves the run
    pub fn exit_edge(&self, direction: ScanDirection) -> usize {
        match direction {
            ScanDirection::LeftToRight => self.end + 1,
            ScanDirection::RightToLeft => self.start,
        }
    }
}

/// Splits rows into segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentBuilder {
    pitch_x: f64,
    speedmoves: f64,
}

impl SegmentBuilder {
    /// `speedmoves` of 0 disables speed moves
    pub fn new(pitch_x: f64, speedmoves: f64) -> Self {
        Self {
            pitch_x,
            speedmoves,
        }
    }

    /// True when a zero run of `columns` pixels is crossed with a rapid move
    pub fn is_speed_move(&self, columns: usize) -> bool {
        self.speedmoves > 0.0 && columns as f64 * self.pitch_x + LENGTH_EPSILON >= self.speedmoves
    }

    /// Segments covering `range` of `row`, ordered along `direction`
    pub fn build(&self, row: &[u32], range: ColumnRange, direction: ScanDirection) -> Vec<Segment> {
        let columns: BoxedIterator<usize> = match direction {
            ScanDirection::LeftToRight => Box::new(range.start..=range.end),
            ScanDirection::RightToLeft => Box::new((range.start..=range.end).rev()),
        };

        let mut segments: Vec<Segment> = Vec::new();
        for col in columns {
            let power = row[col];
            match segments.last_mut() {
                Some(segment) if segment.power == power => {
                    segment.start = segment.start.min(col);
                    segment.end = segment.end.max(col);
                }
                _ => segments.push(Segment {
                    start: col,
                    end: col,
                    power,
                    speed_move: false,
                }),
            }
        }

        for segment in &mut segments {
            segment.speed_move = !segment.is_burn() && self.is_speed_move(segment.columns());
        }
        segments
    }
}
