//! Date column decomposition

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::error::Cause;

/// Columns appended in place of the date column
pub const DATE_PART_COLUMNS: [&str; 3] = ["Year", "Month", "Day"];

// Slash dates are read month-first, falling back to day-first when the
// first field cannot be a month.
const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y",
];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Parse a date cell with an explicit format, or the built-in formats
pub fn parse_date(value: &str, format: Option<&str>) -> Option<NaiveDate> {
    let value = value.trim();
    match format {
        Some(fmt) => NaiveDate::parse_from_str(value, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(value, fmt).ok().map(|dt| dt.date())),
        None => DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                    .map(|dt| dt.date())
            }),
    }
}

/// Replaces a date column with integer Year, Month and Day columns
#[derive(Debug, Clone)]
pub struct DateDecomposer {
    column: String,
    format: Option<String>,
}

impl DateDecomposer {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: Option<String>) -> Self {
        self.format = format;
        self
    }

    /// Appends Year / Month / Day and drops the source column.
    ///
    /// Null cells give null parts; a non-null cell that does not parse fails
    /// the whole call.
    pub fn transform(&self, df: &DataFrame) -> std::result::Result<DataFrame, Cause> {
        let column = df
            .column(&self.column)
            .map_err(|_| Cause::ColumnNotFound(self.column.clone()))?;
        let text = column.cast(&DataType::String)?;
        let ca = text.str()?;

        let n = ca.len();
        let mut years: Vec<Option<i32>> = Vec::with_capacity(n);
        let mut months: Vec<Option<i32>> = Vec::with_capacity(n);
        let mut days: Vec<Option<i32>> = Vec::with_capacity(n);

        for (row, cell) in ca.into_iter().enumerate() {
            match cell {
                Some(value) => {
                    let date = parse_date(value, self.format.as_deref()).ok_or_else(|| {
                        Cause::DateParse {
                            column: self.column.clone(),
                            row,
                            value: value.to_string(),
                        }
                    })?;
                    years.push(Some(date.year()));
                    months.push(Some(date.month() as i32));
                    days.push(Some(date.day() as i32));
                }
                None => {
                    years.push(None);
                    months.push(None);
                    days.push(None);
                }
            }
        }

        let mut result = df.clone();
        for (name, values) in DATE_PART_COLUMNS.iter().zip([years, months, days]) {
            result.with_column(Column::new((*name).into(), values))?;
        }
        Ok(result.drop(&self.column)?)
    }
}
