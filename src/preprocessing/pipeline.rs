//! Cleaning stage: date decomposition, mean imputation, residual row drop

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info};

use super::{
    config::PreprocessingConfig, dates::DateDecomposer, imputer::Imputer, ColumnType,
    ROW_INDEX_COLUMN,
};
use crate::error::{Cause, PipelineError, Result};

/// Column names grouped by type at the time the stage runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnPartition {
    pub numerical: Vec<String>,
    pub categorical: Vec<String>,
}

impl ColumnPartition {
    /// Group the columns of `df`, skipping the row index
    pub fn of(df: &DataFrame, config: &PreprocessingConfig) -> Self {
        let mut partition = Self::default();
        for col in df.get_columns() {
            let name = col.name().as_str();
            if name == ROW_INDEX_COLUMN {
                continue;
            }
            match ColumnType::resolve(name, col.dtype(), config.schema.as_ref()) {
                ColumnType::Numeric => partition.numerical.push(name.to_string()),
                ColumnType::Categorical => partition.categorical.push(name.to_string()),
            }
        }
        partition
    }
}

/// Summary of one preprocessing run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreprocessReport {
    pub partition: ColumnPartition,
    /// Mean used per imputed column
    pub fill_values: BTreeMap<String, f64>,
    /// Nulls replaced per column
    pub imputed_counts: BTreeMap<String, usize>,
    pub rows_in: usize,
    pub rows_out: usize,
    pub elapsed_secs: f64,
}

impl PreprocessReport {
    pub fn rows_dropped(&self) -> usize {
        self.rows_in - self.rows_out
    }
}

/// Cleaning stage of the data processing pipeline
#[derive(Debug, Clone)]
pub struct DataPreprocessor {
    config: PreprocessingConfig,
    imputer: Imputer,
    report: Option<PreprocessReport>,
}

impl DataPreprocessor {
    /// Create a new preprocessor with default configuration
    pub fn new() -> Self {
        Self::with_config(PreprocessingConfig::default())
    }

    /// Create a new preprocessor with custom configuration
    pub fn with_config(config: PreprocessingConfig) -> Self {
        Self {
            config,
            imputer: Imputer::new(),
            report: None,
        }
    }

    /// Run the cleaning steps in order.
    ///
    /// Columns are grouped before the date column is replaced, so the
    /// Year / Month / Day parts are never imputed. Means come from the full
    /// table; only rows still holding a null afterwards are dropped.
    pub fn process(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.run(df).map_err(|e| {
            error!(error = %e, "Error occurred while preprocessing data");
            PipelineError::preprocess("Failed to preprocess data", e)
        })
    }

    fn run(&mut self, df: &DataFrame) -> std::result::Result<DataFrame, Cause> {
        let start = Instant::now();

        let mut partition = ColumnPartition::of(df, &self.config);
        debug!(
            numerical = ?partition.numerical,
            categorical = ?partition.categorical,
            "Column partition"
        );

        let decomposed = DateDecomposer::new(&self.config.date_column)
            .with_format(self.config.date_format.clone())
            .transform(df)?;
        partition.numerical.retain(|c| c != &self.config.date_column);
        partition.categorical.retain(|c| c != &self.config.date_column);

        let null_counts: BTreeMap<String, usize> = partition
            .numerical
            .iter()
            .map(|name| {
                decomposed
                    .column(name)
                    .map(|c| (name.clone(), c.null_count()))
                    .map_err(|_| Cause::ColumnNotFound(name.clone()))
            })
            .collect::<std::result::Result<_, _>>()?;

        let numerical: Vec<&str> = partition.numerical.iter().map(String::as_str).collect();
        let imputed = self.imputer.fit_transform(&decomposed, &numerical)?;

        let cleaned = imputed.drop_nulls::<String>(None)?;

        let fill_values: BTreeMap<String, f64> = self
            .imputer
            .fill_values()
            .iter()
            .filter_map(|(name, mean)| mean.map(|m| (name.clone(), m)))
            .collect();
        let imputed_counts = null_counts
            .into_iter()
            .filter(|(name, count)| *count > 0 && fill_values.contains_key(name))
            .collect();

        let report = PreprocessReport {
            partition,
            fill_values,
            imputed_counts,
            rows_in: df.height(),
            rows_out: cleaned.height(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!(
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            rows_dropped = report.rows_dropped(),
            imputed_columns = report.imputed_counts.len(),
            "Basic data preprocessing done"
        );
        self.report = Some(report);

        Ok(cleaned)
    }

    /// Report of the last successful run
    pub fn report(&self) -> Option<&PreprocessReport> {
        self.report.as_ref()
    }

    pub fn imputer(&self) -> &Imputer {
        &self.imputer
    }
}

impl Default for DataPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_dataframe() -> DataFrame {
        df!(
            "Date" => &["2012-07-15", "2012-07-16", "2012-07-17", "2012-07-18", "2012-07-19"],
            "Location" => &[Some("Albury"), Some("Albury"), Some("Sydney"), None, Some("Sydney")],
            "MinTemp" => &[Some(10.0), None, Some(14.0), Some(12.0), Some(16.0)],
            "Cloud9am" => &[Some(1i64), Some(2), None, Some(3), Some(4)]
        )
        .unwrap()
    }

    #[test]
    fn test_column_partition() {
        let df = create_test_dataframe();
        let partition = ColumnPartition::of(&df, &PreprocessingConfig::default());

        assert_eq!(partition.numerical, vec!["MinTemp", "Cloud9am"]);
        assert_eq!(partition.categorical, vec!["Date", "Location"]);
    }

    #[test]
    fn test_partition_skips_row_index() {
        let df = create_test_dataframe()
            .with_row_index(ROW_INDEX_COLUMN.into(), None)
            .unwrap();
        let partition = ColumnPartition::of(&df, &PreprocessingConfig::default());
        assert!(!partition.numerical.iter().any(|c| c == ROW_INDEX_COLUMN));
    }

    #[test]
    fn test_process() {
        let df = create_test_dataframe();
        let mut preprocessor = DataPreprocessor::new();
        let result = preprocessor.process(&df).unwrap();

        // Row 3 is missing Location and is dropped; the numeric gaps are filled.
        assert_eq!(result.height(), 4);
        assert!(result.column("Date").is_err());
        assert_eq!(result.column("MinTemp").unwrap().null_count(), 0);
        assert_eq!(result.column("Cloud9am").unwrap().null_count(), 0);

        // Mean of [10, 14, 12, 16] = 13, computed before the drop
        let min_temp = result.column("MinTemp").unwrap().f64().unwrap();
        assert_eq!(min_temp.get(1), Some(13.0));

        let report = preprocessor.report().unwrap();
        assert_eq!(report.rows_in, 5);
        assert_eq!(report.rows_out, 4);
        assert_eq!(report.rows_dropped(), 1);
        assert_eq!(report.fill_values["MinTemp"], 13.0);
        assert_eq!(report.fill_values["Cloud9am"], 2.5);
        assert_eq!(report.imputed_counts["MinTemp"], 1);
    }

    #[test]
    fn test_date_parts_are_integer() {
        let df = create_test_dataframe();
        let result = DataPreprocessor::new().process(&df).unwrap();
        assert_eq!(result.column("Year").unwrap().dtype(), &DataType::Int32);
        assert_eq!(result.column("Day").unwrap().i32().unwrap().get(0), Some(15));
    }

    #[test]
    fn test_declared_schema_drives_partition() {
        let mut schema = crate::config::DeclaredSchema::new();
        schema.insert("Cloud9am".to_string(), ColumnType::Categorical);
        let config = PreprocessingConfig::new().with_schema(schema);

        let df = create_test_dataframe();
        let mut preprocessor = DataPreprocessor::with_config(config);
        let result = preprocessor.process(&df).unwrap();

        // Cloud9am is no longer imputed, so its missing row is dropped too.
        assert_eq!(result.height(), 3);
        let report = preprocessor.report().unwrap();
        assert!(report.partition.categorical.contains(&"Cloud9am".to_string()));
    }

    #[test]
    fn test_missing_date_column() {
        let df = df!("MinTemp" => &[1.0, 2.0]).unwrap();
        let err = DataPreprocessor::new().process(&df).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Preprocess { source: Cause::ColumnNotFound(_), .. }
        ));
    }

    #[test]
    fn test_bad_date_fails_whole_stage() {
        let df = df!("Date" => &["2012-07-15", "15th of July"], "MinTemp" => &[1.0, 2.0]).unwrap();
        let mut preprocessor = DataPreprocessor::new();
        let err = preprocessor.process(&df).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Preprocess { source: Cause::DateParse { .. }, .. }
        ));
        assert!(preprocessor.report().is_none());
    }
}
