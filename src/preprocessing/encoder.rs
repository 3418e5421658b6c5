//! Label encoding of categorical columns

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Cause;

/// Sorted classes of one column; a class's code is its position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMapping {
    pub column: String,
    classes: Vec<String>,
}

impl LabelMapping {
    /// Build from the distinct non-null values of a column, sorted lexicographically
    pub fn from_column(column: &Column) -> std::result::Result<Self, Cause> {
        let text = column.cast(&DataType::String)?;
        let distinct: BTreeSet<&str> = text.str()?.into_iter().flatten().collect();

        Ok(Self {
            column: column.name().to_string(),
            classes: distinct.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn code_of(&self, value: &str) -> Option<i64> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .ok()
            .map(|idx| idx as i64)
    }

    /// Inverse mapping
    pub fn decode(&self, code: i64) -> Option<&str> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| self.classes.get(idx))
            .map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Value → code view, used for logging
    pub fn as_map(&self) -> BTreeMap<&str, i64> {
        self.classes
            .iter()
            .enumerate()
            .map(|(code, class)| (class.as_str(), code as i64))
            .collect()
    }

    /// Replace each value of `column` with its code
    fn encode(&self, column: &Column) -> std::result::Result<Series, Cause> {
        let text = column.cast(&DataType::String)?;
        let codes = text
            .str()?
            .into_iter()
            .map(|cell| match cell {
                Some(value) => self.code_of(value).map(Some).ok_or_else(|| {
                    Cause::InvalidValue(format!(
                        "unseen label {:?} in column {}",
                        value, self.column
                    ))
                }),
                None => Ok(None),
            })
            .collect::<std::result::Result<Vec<Option<i64>>, Cause>>()?;

        Ok(Series::new(column.name().clone(), codes))
    }
}

/// Lexicographic label encoder over a set of columns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    mappings: Vec<LabelMapping>,
    is_fitted: bool,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn one mapping per column
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> std::result::Result<&mut Self, Cause> {
        self.mappings = columns
            .iter()
            .map(|col_name| {
                let column = df
                    .column(col_name)
                    .map_err(|_| Cause::ColumnNotFound(col_name.to_string()))?;
                LabelMapping::from_column(column)
            })
            .collect::<std::result::Result<_, _>>()?;

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace the fitted columns with Int64 codes; nulls stay null
    pub fn transform(&self, df: &DataFrame) -> std::result::Result<DataFrame, Cause> {
        if !self.is_fitted {
            return Err(Cause::InvalidValue("encoder is not fitted".to_string()));
        }

        let mut result = df.clone();
        for mapping in &self.mappings {
            let column = df
                .column(&mapping.column)
                .map_err(|_| Cause::ColumnNotFound(mapping.column.clone()))?;
            result.with_column(mapping.encode(column)?)?;
        }
        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> std::result::Result<DataFrame, Cause> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    pub fn mappings(&self) -> &[LabelMapping] {
        &self.mappings
    }

    pub fn mapping(&self, column: &str) -> Option<&LabelMapping> {
        self.mappings.iter().find(|m| m.column == column)
    }
}
