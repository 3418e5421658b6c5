//! Data preprocessing module
//!
//! Cleaning and encoding steps applied to the raw weather table:
//! - Date decomposition into Year / Month / Day
//! - Mean imputation of numeric columns
//! - Dropping rows with residual missing values
//! - Lexicographic label encoding of categorical columns

mod config;
mod dates;
mod encoder;
mod imputer;
mod pipeline;

pub use config::PreprocessingConfig;
pub use dates::{parse_date, DateDecomposer, DATE_PART_COLUMNS};
pub use encoder::{LabelEncoder, LabelMapping};
pub use imputer::Imputer;
pub use pipeline::{ColumnPartition, DataPreprocessor, PreprocessReport};

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::DeclaredSchema;

/// Hidden column carrying the original row position through the pipeline
pub const ROW_INDEX_COLUMN: &str = "__row_nr";

/// Column data type for preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
}

impl ColumnType {
    /// Text columns are categorical, everything else is numeric
    pub fn infer(dtype: &DataType) -> Self {
        match dtype {
            DataType::String => ColumnType::Categorical,
            _ => ColumnType::Numeric,
        }
    }

    /// Declared type if the schema names the column, inferred otherwise
    pub fn resolve(name: &str, dtype: &DataType, schema: Option<&DeclaredSchema>) -> Self {
        schema
            .and_then(|s| s.get(name).copied())
            .unwrap_or_else(|| Self::infer(dtype))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_column_type() {
        assert_eq!(ColumnType::infer(&DataType::String), ColumnType::Categorical);
        assert_eq!(ColumnType::infer(&DataType::Float64), ColumnType::Numeric);
        assert_eq!(ColumnType::infer(&DataType::Int64), ColumnType::Numeric);
        assert_eq!(ColumnType::infer(&DataType::Boolean), ColumnType::Numeric);
    }

    #[test]
    fn test_declared_type_wins() {
        let mut schema = DeclaredSchema::new();
        schema.insert("Cloud9am".to_string(), ColumnType::Categorical);

        let resolved = ColumnType::resolve("Cloud9am", &DataType::Int64, Some(&schema));
        assert_eq!(resolved, ColumnType::Categorical);
        let fallback = ColumnType::resolve("Rainfall", &DataType::Float64, Some(&schema));
        assert_eq!(fallback, ColumnType::Numeric);
    }

    #[test]
    fn test_column_type_serialize() {
        let json = serde_json::to_string(&ColumnType::Numeric).unwrap();
        assert_eq!(json, "\"numeric\"");
    }
}
