//! 2D points, bounding boxes, and raster geometry in machine coordinates (mm)

use crate::error::GeometryError;
use crate::units::Precision;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack for pitches that are exactly one tick wide in decimal but not in binary
const TICK_EPSILON: f64 = 1e-9;

/// A point on the machine XY plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate in mm
    pub x: f64,
    /// Y coordinate in mm
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned bounding box that grows as points are added
///
/// An empty box has no corners until the first point is recorded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    bounds: Option<(Point, Point)>,
}

impl BoundingBox {
    /// Create an empty bounding box
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bounding box spanning two corners (in any order)
    pub fn from_corners(a: Point, b: Point) -> Self {
        let mut bbox = Self::new();
        bbox.update(a);
        bbox.update(b);
        bbox
    }

    /// Grow the box to include `point`
    pub fn update(&mut self, point: Point) {
        self.bounds = Some(match self.bounds {
            None => (point, point),
            Some((lower, upper)) => (
                Point::new(lower.x.min(point.x), lower.y.min(point.y)),
                Point::new(upper.x.max(point.x), upper.y.max(point.y)),
            ),
        });
    }

    /// True when no point has been recorded
    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    /// Lower-left corner
    pub fn lower_left(&self) -> Option<Point> {
        self.bounds.map(|(lower, _)| lower)
    }

    /// Upper-right corner
    pub fn upper_right(&self) -> Option<Point> {
        self.bounds.map(|(_, upper)| upper)
    }

    /// Center of the box
    pub fn center(&self) -> Option<Point> {
        self.bounds.map(|(lower, upper)| {
            Point::new((lower.x + upper.x) / 2.0, (lower.y + upper.y) / 2.0)
        })
    }

    /// Width in mm (0 when empty)
    pub fn width(&self) -> f64 {
        self.bounds.map_or(0.0, |(lower, upper)| upper.x - lower.x)
    }

    /// Height in mm (0 when empty)
    pub fn height(&self) -> f64 {
        self.bounds.map_or(0.0, |(lower, upper)| upper.y - lower.y)
    }

    /// Check whether `point` lies inside the box (edges included)
    pub fn contains(&self, point: Point) -> bool {
        self.bounds.is_some_and(|(lower, upper)| {
            point.x >= lower.x && point.y >= lower.y && point.x <= upper.x && point.y <= upper.y
        })
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            None => write!(f, "Boundingbox: (empty)"),
            Some((lower, upper)) => write!(
                f,
                "Boundingbox: (X{:.2},Y{:.2}:X{:.2},Y{:.2})",
                lower.x, lower.y, upper.x, upper.y
            ),
        }
    }
}

/// Placement of a pixel raster on the machine plane
///
/// Columns are addressed by *edge* index (`0..=width`): a pixel `c` spans edges
/// `c` and `c + 1`. Rows are addressed by grid row; grid row 0 sits at the origin Y.
/// All coordinates are integer ticks of the configured [`Precision`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGeometry {
    width: usize,
    height: usize,
    pitch_x: f64,
    pitch_y: f64,
    origin_x: i64,
    origin_y: i64,
    precision: Precision,
}

impl RasterGeometry {
    /// Create a geometry; the origin is quantized to `precision` first.
    ///
    /// Each pitch must span at least one tick, otherwise adjacent column edges
    /// (or rows) would map to the same coordinate.
    pub fn new(
        width: usize,
        height: usize,
        pitch: (f64, f64),
        origin: (f64, f64),
        precision: Precision,
    ) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::EmptyRaster { width, height });
        }
        for p in [pitch.0, pitch.1] {
            if !p.is_finite() || p <= 0.0 {
                return Err(GeometryError::InvalidPitch(p));
            }
            if p * precision.scale() + TICK_EPSILON < 1.0 {
                return Err(GeometryError::PitchBelowResolution {
                    pitch: p,
                    digits: precision.digits(),
                });
            }
        }
        Ok(Self {
            width,
            height,
            pitch_x: pitch.0,
            pitch_y: pitch.1,
            origin_x: precision.quantize(origin.0),
            origin_y: precision.quantize(origin.1),
            precision,
        })
    }

    /// Raster width in pixels
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raster height in pixels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixel pitch `(x, y)` in mm
    pub fn pitch(&self) -> (f64, f64) {
        (self.pitch_x, self.pitch_y)
    }

    /// Coordinate precision
    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Origin in ticks
    pub fn origin_ticks(&self) -> (i64, i64) {
        (self.origin_x, self.origin_y)
    }

    /// Origin in mm
    pub fn origin(&self) -> Point {
        Point::new(
            self.precision.to_mm(self.origin_x),
            self.precision.to_mm(self.origin_y),
        )
    }

    /// X ticks of column edge `edge`
    pub fn x_ticks(&self, edge: usize) -> i64 {
        self.origin_x + self.precision.quantize(edge as f64 * self.pitch_x)
    }

    /// Y ticks of grid row `row`
    pub fn y_ticks(&self, row: usize) -> i64 {
        self.origin_y + self.precision.quantize(row as f64 * self.pitch_y)
    }

    /// Point (mm) for a tick pair
    pub fn point(&self, x_ticks: i64, y_ticks: i64) -> Point {
        Point::new(self.precision.to_mm(x_ticks), self.precision.to_mm(y_ticks))
    }

    /// Format ticks as written in G-Code
    pub fn format(&self, ticks: i64) -> String {
        self.precision.format(ticks)
    }

    /// Area covered by the raster: `width x height` pixels from the origin
    pub fn extent(&self) -> BoundingBox {
        BoundingBox::from_corners(
            self.point(self.x_ticks(0), self.y_ticks(0)),
            self.point(self.x_ticks(self.width), self.y_ticks(self.height)),
        )
    }

    /// Column edge at `x_ticks`, if it lands exactly on one
    pub fn edge_at(&self, x_ticks: i64) -> Option<usize> {
        let steps = (x_ticks - self.origin_x) as f64 / (self.pitch_x * self.precision.scale());
        let edge = steps.round();
        if edge < 0.0 || edge > self.width as f64 {
            return None;
        }
        let edge = edge as usize;
        (self.x_ticks(edge) == x_ticks).then_some(edge)
    }

    /// Grid row at `y_ticks`, if it lands exactly on one
    pub fn row_at(&self, y_ticks: i64) -> Option<usize> {
        let steps = (y_ticks - self.origin_y) as f64 / (self.pitch_y * self.precision.scale());
        let row = steps.round();
        if row < 0.0 || row >= self.height as f64 {
            return None;
        }
        let row = row as usize;
        (self.y_ticks(row) == y_ticks).then_some(row)
    }
}
