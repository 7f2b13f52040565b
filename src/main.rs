use clap::Parser;
use image2gcode::cli::{run, Cli};
use image2gcode::init_logging;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    init_logging()?;

    let cli = Cli::parse();
    run(&cli)
}
