//! Data loading utilities

use crate::config::DeclaredSchema;
use crate::error::{Cause, PipelineError, Result};
use crate::preprocessing::ColumnType;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{error, info};

/// Tokens read as missing values, besides empty fields
pub const NULL_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// CSV loader for the raw dataset
pub struct DataLoader {
    /// Rows sampled for dtype inference; `None` scans the whole file
    infer_schema_length: Option<usize>,
    /// Field separator; `None` picks from the file extension
    separator: Option<u8>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: None,
            separator: None,
        }
    }

    /// Limit dtype inference to the first `rows` rows
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = Some(rows);
        self
    }

    /// Force a field separator
    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = Some(separator);
        self
    }

    /// Load a delimited file into a frame, types inferred per column
    pub fn load_csv(&self, path: &Path) -> Result<DataFrame> {
        let df = self.read_csv(path).map_err(|e| {
            error!(path = %path.display(), error = %e, "Error occurred while loading data");
            PipelineError::data_load("Failed to load data", e)
        })?;

        info!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            "Data loaded successfully"
        );
        Ok(df)
    }

    /// Load and coerce the declared columns to their declared types
    pub fn load_with_schema(&self, path: &Path, schema: &DeclaredSchema) -> Result<DataFrame> {
        let df = self.load_csv(path)?;
        apply_schema(df, schema).map_err(|e| {
            error!(path = %path.display(), error = %e, "Declared schema does not match data");
            PipelineError::data_load("Failed to load data", e)
        })
    }

    fn read_csv(&self, path: &Path) -> std::result::Result<DataFrame, Cause> {
        let file = File::open(path)?;

        let null_values: Vec<PlSmallStr> = NULL_TOKENS.iter().map(|s| (*s).into()).collect();
        let parse_opts = CsvParseOptions::default()
            .with_separator(self.separator.unwrap_or_else(|| separator_for(path)))
            .with_null_values(Some(NullValues::AllColumns(null_values)));

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        if df.width() == 0 {
            return Err(Cause::InvalidValue(format!(
                "{} contains no columns",
                path.display()
            )));
        }
        Ok(df)
    }
}

fn separator_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Strictly cast declared columns: numeric to Float64, categorical to String
pub fn apply_schema(mut df: DataFrame, schema: &DeclaredSchema) -> std::result::Result<DataFrame, Cause> {
    for (name, column_type) in schema {
        let column = df
            .column(name)
            .map_err(|_| Cause::ColumnNotFound(name.clone()))?;
        let target = match column_type {
            ColumnType::Numeric => DataType::Float64,
            ColumnType::Categorical => DataType::String,
        };
        if column.dtype() == &target {
            continue;
        }
        let casted = column.as_materialized_series().strict_cast(&target)?;
        df.with_column(casted)?;
    }
    Ok(df)
}
