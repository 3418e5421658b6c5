//! Command-line interface for the data preparation run

use clap::Parser;
use colored::*;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::logging::RunLogger;
use crate::pipeline::{DataProcessing, RunSummary};

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_ok(msg: &str) {
    println!("  {} {}", ok("✓"), msg);
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug, Default)]
#[command(name = "weather-dataprep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Clean, encode and split the weather dataset for model training")]
#[command(long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Raw CSV input (overrides the configuration)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory for the split artifacts (overrides the configuration)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Log level filter, e.g. info or debug
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log to stderr only
    #[arg(long)]
    pub no_log_file: bool,
}

impl Cli {
    /// Configuration file (or defaults) with command-line overrides applied
    pub fn resolve_config(&self) -> crate::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)?,
            None => PipelineConfig::default(),
        };
        if let Some(input) = &self.input {
            config = config.with_input_path(input);
        }
        if let Some(output_dir) = &self.output_dir {
            config = config.with_output_dir(output_dir);
        }
        if let Some(level) = &self.log_level {
            config = config.with_log_level(level);
        }
        if self.no_log_file {
            config = config.with_log_dir(None);
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Run the whole pipeline under a per-run logger
pub fn cmd_run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let config = cli.resolve_config()?;
    let logger = RunLogger::new(&config.logging)?;

    let outcome = logger.in_scope(|| DataProcessing::new(config).run());
    logger.finish();
    let summary = outcome?;

    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    section("Data Processing");
    step_ok(&kv("run", &summary.run_id));
    step_ok(&kv("rows loaded", &summary.rows_loaded.to_string()));
    step_ok(&kv(
        "rows kept",
        &format!(
            "{} ({} dropped)",
            summary.preprocess.rows_out,
            summary.preprocess.rows_dropped()
        ),
    ));
    step_ok(&kv("encoded columns", &summary.label_mappings.len().to_string()));
    step_ok(&kv(
        "split",
        &format!("{} train / {} test", summary.train_rows, summary.test_rows),
    ));
    for path in &summary.artifact_paths {
        println!("    {}", dim(&path.display().to_string()));
    }
    println!();
}
