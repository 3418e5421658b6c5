//! Mean imputation of numeric columns

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Cause;

/// Fills missing numeric values with the column mean
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Imputer {
    /// Column → mean over observed values; `None` when nothing was observed
    fill_values: BTreeMap<String, Option<f64>>,
    is_fitted: bool,
}

impl Imputer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute means over the non-missing values of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> std::result::Result<&mut Self, Cause> {
        self.fill_values.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| Cause::ColumnNotFound(col_name.to_string()))?;
            let mean = column.cast(&DataType::Float64)?.f64()?.mean();
            self.fill_values.insert(col_name.to_string(), mean);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace nulls with the fitted means.
    ///
    /// Columns without nulls keep their dtype; columns with nulls become
    /// Float64.
    pub fn transform(&self, df: &DataFrame) -> std::result::Result<DataFrame, Cause> {
        if !self.is_fitted {
            return Err(Cause::InvalidValue("imputer is not fitted".to_string()));
        }

        let mut result = df.clone();

        for (col_name, fill_value) in &self.fill_values {
            let Some(mean) = fill_value else { continue };
            let column = df
                .column(col_name)
                .map_err(|_| Cause::ColumnNotFound(col_name.clone()))?;
            if column.null_count() == 0 {
                continue;
            }

            let casted = column.cast(&DataType::Float64)?;
            let filled: Float64Chunked = casted
                .f64()?
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(*mean)))
                .collect();

            result.with_column(filled.with_name(col_name.as_str().into()).into_series())?;
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> std::result::Result<DataFrame, Cause> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Mean recorded for a column
    pub fn fill_value(&self, column: &str) -> Option<f64> {
        self.fill_values.get(column).copied().flatten()
    }

    pub fn fill_values(&self) -> &BTreeMap<String, Option<f64>> {
        &self.fill_values
    }
}
