//! Raster program decoder
//!
//! Replays a raster program (`G0`/`G1`, `M3`/`M4`/`M5`, `S`, `F`) on a pixel grid
//! and rebuilds the per-pixel power it burns. The raster geometry comes from the
//! program header, so a program can be checked without the job that produced it.

use crate::error::{DecodeError, DecodeResult};
use crate::gcode::{header_fields, parse_line, parse_word, ParsedLine, Word};
use image2gcode_core::{GcodeError, Precision, RasterGeometry};
use std::path::Path;
use tracing::debug;

/// Raster description read from a program header
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterHeader {
    pub geometry: RasterGeometry,
    /// `maxpower` job argument, when recorded
    pub maxpower: Option<u32>,
}

fn missing(field: &str) -> GcodeError {
    GcodeError::MissingHeader {
        field: field.to_string(),
    }
}

fn malformed(field: &str, value: &str) -> GcodeError {
    GcodeError::InvalidSyntax {
        line_number: 0,
        reason: format!("malformed header field '{}': {}", field, value),
    }
}

/// Split `"<a>x<b> <unit>"` into two parsed values
fn parse_pair<T: std::str::FromStr>(field: &str, value: &str) -> Result<(T, T), GcodeError> {
    let dims = value.split_whitespace().next().unwrap_or_default();
    let (a, b) = dims.split_once('x').ok_or_else(|| malformed(field, value))?;
    match (a.parse(), b.parse()) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        _ => Err(malformed(field, value)),
    }
}

impl RasterHeader {
    /// Read the raster description from the leading comment block
    pub fn parse(program: &str) -> Result<Self, GcodeError> {
        let fields = header_fields(program);
        let field = |name: &str| fields.get(name).ok_or_else(|| missing(name));

        let (width, height): (usize, usize) = parse_pair("image", field("image")?)?;
        let pitch: (f64, f64) = parse_pair("pitch", field("pitch")?)?;
        let precision_value = field("precision")?;
        let digits: u8 = precision_value
            .parse()
            .map_err(|_| malformed("precision", precision_value))?;
        let precision = Precision::new(digits);

        let origin_value = field("origin")?;
        let mut origin = (None, None);
        for token in origin_value.split_whitespace() {
            let word = parse_word(0, token)?;
            match word.letter {
                'X' => origin.0 = Some(word.value),
                'Y' => origin.1 = Some(word.value),
                _ => return Err(malformed("origin", origin_value)),
            }
        }
        let (Some(origin_x), Some(origin_y)) = origin else {
            return Err(malformed("origin", origin_value));
        };

        let geometry = RasterGeometry::new(width, height, pitch, (origin_x, origin_y), precision)
            .map_err(|e| malformed("image", &e.to_string()))?;
        let maxpower = fields.get("maxpower").and_then(|v| v.parse().ok());
        Ok(Self { geometry, maxpower })
    }
}

/// Per-pixel power rebuilt from a program, row 0 at the bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRaster {
    width: usize,
    height: usize,
    powers: Vec<u32>,
}

impl DecodedRaster {
    fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            powers: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, col: usize, row: usize) -> u32 {
        self.powers[row * self.width + col]
    }

    pub fn row(&self, row: usize) -> &[u32] {
        &self.powers[row * self.width..(row + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.powers
    }

    /// Compare against an expected row-major grid of the same size
    pub fn compare(&self, width: usize, height: usize, expected: &[u32]) -> DecodeResult<()> {
        if (width, height) != (self.width, self.height) || expected.len() != self.powers.len() {
            return Err(DecodeError::SizeMismatch {
                expected: format!("{}x{}", width, height),
                actual: format!("{}x{}", self.width, self.height),
            });
        }

        let mut differing = expected
            .iter()
            .zip(&self.powers)
            .enumerate()
            .filter(|(_, (e, d))| e != d);
        let Some((index, (&expected_power, &decoded))) = differing.next() else {
            return Ok(());
        };
        Err(DecodeError::Mismatch {
            count: 1 + differing.count(),
            col: index % self.width,
            row: index / self.width,
            expected: expected_power,
            decoded,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Motion {
    Rapid,
    Linear,
}

/// Machine state replayed line by line
#[derive(Debug, Clone)]
pub struct GcodeRasterizer {
    geometry: RasterGeometry,
    raster: DecodedRaster,
    motion: Motion,
    laser_on: bool,
    power: u32,
    x: Option<i64>,
    y: Option<i64>,
}

impl GcodeRasterizer {
    pub fn new(geometry: RasterGeometry) -> Self {
        Self {
            geometry,
            raster: DecodedRaster::blank(geometry.width(), geometry.height()),
            motion: Motion::Rapid,
            laser_on: false,
            power: 0,
            x: None,
            y: None,
        }
    }

    /// Apply one tokenized line
    pub fn apply(&mut self, line: &ParsedLine) -> Result<(), GcodeError> {
        let n = line.line_number;
        let mut target = (None, None);
        for word in &line.words {
            match word.letter {
                'G' => self.apply_g(n, word)?,
                'M' => self.apply_m(n, word)?,
                'X' => target.0 = Some(self.geometry.precision().quantize(word.value)),
                'Y' => target.1 = Some(self.geometry.precision().quantize(word.value)),
                'S' => {
                    self.power = word
                        .as_integer()
                        .and_then(|s| u32::try_from(s).ok())
                        .ok_or_else(|| GcodeError::InvalidParameter {
                            line_number: n,
                            param: "S".to_string(),
                            reason: format!("'{}' is not a power value", word.raw),
                        })?;
                }
                'F' => {}
                other => {
                    return Err(GcodeError::UnknownCode {
                        line_number: n,
                        code: format!("{}{}", other, word.raw),
                    })
                }
            }
        }

        if target.0.is_some() || target.1.is_some() {
            self.move_to(n, target.0.or(self.x), target.1.or(self.y))?;
        }
        Ok(())
    }

    fn apply_g(&mut self, n: u32, word: &Word) -> Result<(), GcodeError> {
        match word.as_integer() {
            Some(0) => self.motion = Motion::Rapid,
            Some(1) => self.motion = Motion::Linear,
            Some(17) | Some(21) | Some(90) | Some(94) => {}
            _ => {
                return Err(GcodeError::UnknownCode {
                    line_number: n,
                    code: format!("G{}", word.raw),
                })
            }
        }
        Ok(())
    }

    fn apply_m(&mut self, n: u32, word: &Word) -> Result<(), GcodeError> {
        match word.as_integer() {
            Some(3) | Some(4) => self.laser_on = true,
            Some(5) => self.laser_on = false,
            Some(2) | Some(8) | Some(9) | Some(30) => {}
            _ => {
                return Err(GcodeError::UnknownCode {
                    line_number: n,
                    code: format!("M{}", word.raw),
                })
            }
        }
        Ok(())
    }

    fn move_to(&mut self, n: u32, x: Option<i64>, y: Option<i64>) -> Result<(), GcodeError> {
        let burning = self.motion == Motion::Linear && self.laser_on && self.power > 0;
        if burning {
            let (Some(from_x), Some(from_y), Some(to_x), Some(to_y)) = (self.x, self.y, x, y)
            else {
                return Err(GcodeError::InvalidModalState {
                    line_number: n,
                    reason: "burning move before the head position is known".to_string(),
                });
            };
            if to_y != from_y {
                return Err(GcodeError::InvalidModalState {
                    line_number: n,
                    reason: "burning move changes Y".to_string(),
                });
            }
            let row = self.row_at(n, to_y)?;
            let (a, b) = (self.edge_at(n, from_x)?, self.edge_at(n, to_x)?);
            let (start, end) = (a.min(b), a.max(b));
            let offset = row * self.raster.width;
            self.raster.powers[offset + start..offset + end].fill(self.power);
        }
        self.x = x;
        self.y = y;
        Ok(())
    }

    fn edge_at(&self, n: u32, x: i64) -> Result<usize, GcodeError> {
        self.geometry
            .edge_at(x)
            .ok_or_else(|| GcodeError::CoordinateOutOfBounds {
                line_number: n,
                coordinate: format!("X{}", self.geometry.format(x)),
                bounds: format!("{} column edges", self.geometry.width() + 1),
            })
    }

    fn row_at(&self, n: u32, y: i64) -> Result<usize, GcodeError> {
        self.geometry
            .row_at(y)
            .ok_or_else(|| GcodeError::CoordinateOutOfBounds {
                line_number: n,
                coordinate: format!("Y{}", self.geometry.format(y)),
                bounds: format!("{} rows", self.geometry.height()),
            })
    }

    /// Hand over the decoded raster
    pub fn finish(self) -> DecodedRaster {
        if self.laser_on {
            debug!("Program ends with the laser armed");
        }
        self.raster
    }
}

/// Decode a whole program
pub fn rasterize(program: &str) -> DecodeResult<(RasterHeader, DecodedRaster)> {
    let header = RasterHeader::parse(program)?;
    let mut rasterizer = GcodeRasterizer::new(header.geometry);
    for (index, line) in program.lines().enumerate() {
        let line_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
        if let Some(parsed) = parse_line(line_number, line)? {
            rasterizer.apply(&parsed)?;
        }
    }
    Ok((header, rasterizer.finish()))
}

/// Decode a program and compare it with the expected row-major power grid
pub fn validate(
    program: &str,
    width: usize,
    height: usize,
    expected: &[u32],
) -> DecodeResult<DecodedRaster> {
    let (_, decoded) = rasterize(program)?;
    decoded.compare(width, height, expected)?;
    debug!("Validated {}x{} raster", width, height);
    Ok(decoded)
}

/// Read a program file and decode it
pub fn rasterize_file(path: &Path) -> DecodeResult<(RasterHeader, DecodedRaster)> {
    let program = std::fs::read_to_string(path)?;
    rasterize(&program)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "; image2gcode test\n;     maxpower: 100\n; image: 4x2 px\n; pitch: 0.1x0.1 mm\n; origin: X0.0 Y0.0\n; precision: 1\n;\n";

    fn program(body: &str) -> String {
        format!("{}G21\nG90\nM8\nG0 X0.0 Y0.0\n{}M9\nM2\n", HEADER, body)
    }

    #[test]
    fn test_header_parse() {
        let header = RasterHeader::parse(HEADER).unwrap();
        assert_eq!(header.geometry.width(), 4);
        assert_eq!(header.geometry.height(), 2);
        assert_eq!(header.geometry.pitch(), (0.1, 0.1));
        assert_eq!(header.maxpower, Some(100));
    }

    #[test]
    fn test_header_missing_field() {
        let err = RasterHeader::parse("; image: 4x2 px\nG0 X0\n").unwrap_err();
        assert!(matches!(err, GcodeError::MissingHeader { .. }));
    }

    #[test]
    fn test_replay_serpentine_rows() {
        let body = "G0 X0.1\nM4\nG1 X0.3 S40 F800\nG1 Y0.1 S0\nG1 X0.0 S90\nM5\n";
        let (_, raster) = rasterize(&program(body)).unwrap();
        assert_eq!(raster.row(0), &[0, 40, 40, 0]);
        assert_eq!(raster.row(1), &[90, 90, 90, 0]);
    }

    #[test]
    fn test_power_persists_across_m5() {
        let body = "M4\nG1 X0.1 S7 F800\nM5\nG0 X0.2\nM4\nG1 X0.4\nM5\n";
        let (_, raster) = rasterize(&program(body)).unwrap();
        assert_eq!(raster.row(0), &[7, 0, 7, 7]);
    }

    #[test]
    fn test_laser_off_moves_do_not_burn() {
        let body = "G1 X0.4 S50 F800\nM4\nG1 X0.2 S0\n";
        let (_, raster) = rasterize(&program(body)).unwrap();
        assert_eq!(raster.as_slice(), &[0; 8]);
    }

    #[test]
    fn test_diagonal_burn_is_rejected() {
        let body = "M4\nG1 X0.2 Y0.1 S10 F800\n";
        let err = rasterize(&program(body)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Gcode(GcodeError::InvalidModalState { line_number: 13, .. })
        ));
    }

    #[test]
    fn test_out_of_raster_burn_is_rejected() {
        let body = "M4\nG1 X0.9 S10 F800\n";
        let err = rasterize(&program(body)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Gcode(GcodeError::CoordinateOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_unknown_code_is_rejected() {
        let err = rasterize(&program("G2 X0.1\n")).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Gcode(GcodeError::UnknownCode { .. })
        ));
    }

    #[test]
    fn test_validate_reports_first_mismatch() {
        let body = "M4\nG1 X0.2 S5 F800\nM5\n";
        let program = program(body);
        assert!(validate(&program, 4, 2, &[5, 5, 0, 0, 0, 0, 0, 0]).is_ok());

        let err = validate(&program, 4, 2, &[5, 5, 0, 0, 0, 3, 3, 0]).unwrap_err();
        match err {
            DecodeError::Mismatch {
                count,
                col,
                row,
                expected,
                decoded,
            } => {
                assert_eq!((count, col, row, expected, decoded), (2, 1, 1, 3, 0));
            }
            other => panic!("unexpected error: {}", other),
        }

        let err = validate(&program, 2, 4, &[0; 8]).unwrap_err();
        assert!(matches!(err, DecodeError::SizeMismatch { .. }));
    }
}
