//! Preprocessing configuration

use serde::{Deserialize, Serialize};

use crate::config::{DeclaredSchema, PipelineConfig};

/// Configuration for the cleaning stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Column split into Year / Month / Day
    pub date_column: String,

    /// Explicit chrono format; the built-in list is tried when unset
    pub date_format: Option<String>,

    /// Declared column types, replacing dtype inference for named columns
    pub schema: Option<DeclaredSchema>,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            date_column: "Date".to_string(),
            date_format: None,
            schema: None,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_column(mut self, column: impl Into<String>) -> Self {
        self.date_column = column.into();
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn with_schema(mut self, schema: DeclaredSchema) -> Self {
        self.schema = Some(schema);
        self
    }
}

impl From<&PipelineConfig> for PreprocessingConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            date_column: config.date_column.clone(),
            date_format: config.date_format.clone(),
            schema: config.schema.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pipeline_config() {
        let pipeline = PipelineConfig::default().with_date_format("%d/%m/%Y");
        let config = PreprocessingConfig::from(&pipeline);
        assert_eq!(config.date_column, "Date");
        assert_eq!(config.date_format.as_deref(), Some("%d/%m/%Y"));
        assert!(config.schema.is_none());
    }
}
