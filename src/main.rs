//! Weather data preparation - Main Entry Point

use clap::Parser;
use weather_dataprep::cli::{cmd_run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cmd_run(&cli)?;
    Ok(())
}
