//! Pipeline configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Cause, PipelineError, Result};
use crate::preprocessing::ColumnType;

/// Categorical columns label-encoded by default
pub const DEFAULT_CATEGORICAL_COLUMNS: [&str; 6] = [
    "Location",
    "WindGustDir",
    "WindDir9am",
    "WindDir3pm",
    "RainToday",
    "RainTomorrow",
];

pub const DEFAULT_INPUT_PATH: &str = "artifacts/raw/data.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "artifacts/processed";

/// Declared column types, replacing dtype probing when present
pub type DeclaredSchema = BTreeMap<String, ColumnType>;

/// Log sink configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level filter, overridden by `RUST_LOG`
    pub level: String,

    /// Directory for the dated log file; `None` logs to stderr only
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: Some(PathBuf::from("logs")),
        }
    }
}

/// Configuration for a data processing run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw CSV input
    pub input_path: PathBuf,

    /// Destination of the split artifacts
    pub output_dir: PathBuf,

    /// Column decomposed into Year / Month / Day
    pub date_column: String,

    /// Explicit chrono format for the date column. Without it ISO dates,
    /// `%m/%d/%Y` (then `%d/%m/%Y`), `%d-%m-%Y` and `%d.%m.%Y` are tried.
    pub date_format: Option<String>,

    /// Columns replaced by integer label codes
    pub categorical_columns: Vec<String>,

    /// Label column for the split
    pub target_column: String,

    /// Fraction of rows held out for testing
    pub test_size: f64,

    /// Seed for the train/test shuffle
    pub random_state: u64,

    /// Optional column → type declaration
    pub schema: Option<DeclaredSchema>,

    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            date_column: "Date".to_string(),
            date_format: None,
            categorical_columns: DEFAULT_CATEGORICAL_COLUMNS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            target_column: "RainTomorrow".to_string(),
            test_size: 0.2,
            random_state: 42,
            schema: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a TOML file; absent keys keep their defaults
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::config(format!("Failed to read {}", path.display()), e)
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| PipelineError::config("Failed to parse configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::config(
                "Invalid test_size",
                Cause::InvalidValue(format!("test_size must be in (0, 1), got {}", self.test_size)),
            ));
        }
        if self.target_column.is_empty() {
            return Err(PipelineError::config(
                "Invalid target_column",
                Cause::InvalidValue("target_column must not be empty".to_string()),
            ));
        }
        if self.date_column.is_empty() {
            return Err(PipelineError::config(
                "Invalid date_column",
                Cause::InvalidValue("date_column must not be empty".to_string()),
            ));
        }
        Ok(())
    }

    /// Builder method to set the input file
    pub fn with_input_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_path = path.into();
        self
    }

    /// Builder method to set the artifact directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Builder method to declare column types up front
    pub fn with_schema(mut self, schema: DeclaredSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Builder method to disable or relocate the log file
    pub fn with_log_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.logging.log_dir = dir;
        self
    }
}
