//! Command line interface
//!
//! Parses arguments, resolves the layered job configuration, and runs a
//! conversion (or the calibration image generator).

use anyhow::{Context, Result};
use clap::Parser;
use image2gcode_camtools::{
    generate_calibration_images, preview, PowerGrid, RasterEngraver, RasterProgram,
};
use image2gcode_settings::{default_config_path, JobConfig, JobOverrides};
use image2gcode_visualizer::rasterize_file;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")");

/// Convert a raster image to GRBL laser G-Code
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "image2gcode")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Convert a raster image to GRBL laser engraving G-Code", long_about = None)]
pub struct Cli {
    /// Image file to engrave (PNG, JPEG, GIF, BMP, ...)
    #[arg(required_unless_present = "genimages")]
    pub image: Option<PathBuf>,

    /// G-Code output file (default: stdout)
    pub gcode: Option<PathBuf>,

    /// Write a preview of the power grid as PNG
    #[arg(long)]
    pub showimage: bool,

    /// Pixel size in mm (also sets the coordinate precision)
    #[arg(long, value_name = "MM")]
    pub pixelsize: Option<f64>,

    /// Burn feed rate in mm/min
    #[arg(long, value_name = "MM/MIN")]
    pub speed: Option<u32>,

    /// Laser power for a fully black pixel (GRBL S value)
    #[arg(long, value_name = "S")]
    pub maxpower: Option<u32>,

    /// Added to every pixel power before clamping
    #[arg(long, value_name = "S", allow_negative_numbers = true)]
    pub poweroffset: Option<i32>,

    /// Burn bright pixels instead of dark ones
    #[arg(long)]
    pub noinvert: bool,

    /// Target size in mm (rescales the pixel pitch)
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    pub size: Option<Vec<f64>>,

    /// Position of the lower-left image corner in mm
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    pub offset: Option<Vec<f64>>,

    /// Center the image on the origin
    #[arg(long)]
    pub center: bool,

    /// Minimum blank run (mm) crossed with the laser off; 0 disables
    #[arg(long, value_name = "MM")]
    pub speedmoves: Option<f64>,

    /// Powers at or below this value are not burned
    #[arg(long, value_name = "S")]
    pub noise: Option<u32>,

    /// Extend burned rows by this many pixels on each side
    #[arg(long, value_name = "PIXELS")]
    pub overscan: Option<u32>,

    /// Highlight overscan pixels in the preview (the G-Code is unchanged)
    #[arg(long)]
    pub showoverscan: bool,

    /// Use constant power (M3) instead of dynamic power (M4)
    #[arg(long)]
    pub constantburn: bool,

    /// Decode the written G-Code and compare it with the power grid
    #[arg(long, requires = "gcode")]
    pub validate: bool,

    /// Generate calibration images of WIDTH x HEIGHT pixels and exit (WRITE=0 only lists them)
    #[arg(long, num_args = 3, value_names = ["WIDTH", "HEIGHT", "WRITE"])]
    pub genimages: Option<Vec<u32>>,

    /// Config file (default: <config dir>/image2gcode/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

fn pair(values: &Option<Vec<f64>>) -> Option<(f64, f64)> {
    match values.as_deref() {
        Some([a, b]) => Some((*a, *b)),
        _ => None,
    }
}

impl Cli {
    /// Options given on the command line, as the highest-precedence layer
    pub fn overrides(&self) -> JobOverrides {
        JobOverrides {
            pixelsize: self.pixelsize,
            speed: self.speed,
            maxpower: self.maxpower,
            poweroffset: self.poweroffset,
            invert: self.noinvert.then_some(false),
            size: pair(&self.size),
            offset: pair(&self.offset),
            center: self.center.then_some(true),
            speedmoves: self.speedmoves,
            noise: self.noise,
            overscan: self.overscan,
            showoverscan: self.showoverscan.then_some(true),
            constantburn: self.constantburn.then_some(true),
        }
    }

    /// Config file layer: `--config`, else the default file when it exists
    pub fn file_overrides(&self) -> Result<JobOverrides> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => return Ok(JobOverrides::new()),
            },
        };
        info!("Reading config file {}", path.display());
        JobOverrides::load_from_file(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))
    }

    /// Resolve defaults < config file < command line
    pub fn job_config(&self) -> Result<JobConfig> {
        let file = self.file_overrides()?;
        let config = JobConfig::resolve(&[&file, &self.overrides()])
            .context("Invalid configuration")?;
        debug!("Resolved job configuration: {:?}", config);
        Ok(config)
    }
}

/// Write `contents` to `path` through a temporary file in the same directory
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(&dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    file.write_all(contents)?;
    file.flush()?;
    file.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    path.with_extension(suffix)
}

/// Decode the written program, save its rendering, and compare it with the grid
pub fn validate_output(gcode: &Path, engraver: &RasterEngraver) -> Result<()> {
    let (header, decoded) = rasterize_file(gcode)
        .with_context(|| format!("Failed to decode {}", gcode.display()))?;

    let geometry = header.geometry;
    let maxpower = header.maxpower.unwrap_or(engraver.config().maxpower);
    let rendering = PowerGrid::new(
        geometry.width(),
        geometry.height(),
        decoded.as_slice().to_vec(),
    )?;
    preview::save(
        &preview::render(&rendering, maxpower, false),
        &sibling(gcode, "validate.png"),
    )?;

    let grid = engraver.power_grid();
    decoded
        .compare(grid.width(), grid.height(), grid.as_slice())
        .with_context(|| format!("Validation of {} failed", gcode.display()))?;
    info!(
        "Validated {}: {}x{} pixels match",
        gcode.display(),
        grid.width(),
        grid.height()
    );
    Ok(())
}

fn generate_images(values: &[u32]) -> Result<()> {
    let [width, height, write] = values else {
        anyhow::bail!("--genimages needs WIDTH HEIGHT WRITE");
    };
    let dir = std::env::current_dir()?;
    let paths = generate_calibration_images(&dir, *width, *height, *write != 0)?;
    info!(
        "Generated {} calibration images{}",
        paths.len(),
        if *write != 0 { "" } else { " (not written)" }
    );
    Ok(())
}

fn emit(program: &RasterProgram, output: Option<&Path>) -> Result<()> {
    let gcode = program.to_gcode();
    match output {
        Some(path) => {
            write_atomic(path, gcode.as_bytes())?;
            info!("Wrote {} lines to {}", gcode.lines().count(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            lock.write_all(gcode.as_bytes())?;
            lock.flush()?;
        }
    }
    Ok(())
}

/// Run one invocation
pub fn run(cli: &Cli) -> Result<()> {
    if let Some(values) = &cli.genimages {
        return generate_images(values);
    }

    let config = cli.job_config()?;
    let image = cli
        .image
        .as_deref()
        .context("No image file given")?;

    info!("Converting {}", image.display());
    let engraver = RasterEngraver::from_file(image, config)?;
    let (width_mm, height_mm) = engraver.output_size_mm();
    info!(
        "Image {}x{} px, print area {:.2}x{:.2} mm",
        engraver.power_grid().width(),
        engraver.power_grid().height(),
        width_mm,
        height_mm
    );

    if cli.showimage {
        let path = preview::preview_path(cli.gcode.as_deref(), image);
        preview::save(&engraver.render_preview(), &path)?;
    }

    let mut last_reported = 0;
    let program = engraver.generate_with_progress(|progress| {
        let percent = (progress * 100.0) as u32;
        if percent >= last_reported + 25 || percent == 100 {
            debug!("Generating G-Code: {}%", percent);
            last_reported = percent;
        }
    });

    emit(&program, cli.gcode.as_deref())?;

    if cli.validate {
        if let Some(gcode) = &cli.gcode {
            validate_output(gcode, &engraver)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("image2gcode").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_overrides_only_carry_given_options() {
        let cli = parse(&["in.png"]);
        assert_eq!(cli.overrides(), JobOverrides::new());

        let cli = parse(&[
            "in.png",
            "out.gcode",
            "--noinvert",
            "--offset",
            "-5",
            "-2.5",
            "--size",
            "40",
            "30",
            "--poweroffset",
            "-20",
            "--constantburn",
        ]);
        let overrides = cli.overrides();
        assert_eq!(overrides.invert, Some(false));
        assert_eq!(overrides.offset, Some((-5.0, -2.5)));
        assert_eq!(overrides.size, Some((40.0, 30.0)));
        assert_eq!(overrides.poweroffset, Some(-20));
        assert_eq!(overrides.constantburn, Some(true));
        assert_eq!(overrides.center, None);
        assert_eq!(cli.gcode, Some(PathBuf::from("out.gcode")));
    }

    #[test]
    fn test_image_required_unless_genimages() {
        assert!(Cli::try_parse_from(["image2gcode"]).is_err());
        let cli = parse(&["--genimages", "100", "50", "0"]);
        assert_eq!(cli.genimages, Some(vec![100, 50, 0]));
        assert_eq!(cli.image, None);
    }

    #[test]
    fn test_validate_requires_output() {
        assert!(Cli::try_parse_from(["image2gcode", "--validate", "in.png"]).is_err());
        assert!(Cli::try_parse_from(["image2gcode", "--validate", "in.png", "out.gcode"]).is_ok());
    }

    #[test]
    fn test_offset_and_center_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("empty.toml");
        std::fs::write(&config, "").unwrap();
        let cli = parse(&[
            "in.png",
            "--offset",
            "1",
            "1",
            "--center",
            "--config",
            config.to_str().unwrap(),
        ]);
        let err = cli.job_config().unwrap_err();
        assert!(format!("{:#}", err).contains("cannot be combined"));
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("job.toml");
        std::fs::write(&config, "speed = 1200\nmaxpower = 500\ncenter = true\n").unwrap();

        let cli = parse(&[
            "in.png",
            "--maxpower",
            "700",
            "--offset",
            "3",
            "4",
            "--config",
            config.to_str().unwrap(),
        ]);
        let job = cli.job_config().unwrap();
        assert_eq!(job.speed, 1200);
        assert_eq!(job.maxpower, 700);
        assert_eq!(job.offset, Some((3.0, 4.0)));
        assert!(!job.center);
    }

    #[test]
    fn test_write_atomic_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.gcode");
        std::fs::write(&path, "old").unwrap();
        write_atomic(&path, b"G21\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "G21\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_sibling_paths() {
        assert_eq!(
            sibling(Path::new("jobs/cat.gcode"), "validate.png"),
            PathBuf::from("jobs/cat.validate.png")
        );
    }
}
