//! Weather data preparation
//!
//! Turns the raw weather observations CSV into model-ready train/test
//! partitions:
//! - Load the raw table
//! - Decompose the date, impute numeric gaps, drop residual null rows
//! - Label-encode the categorical columns
//! - Split 80/20 with a fixed seed and persist four artifacts
//!
//! # Modules
//!
//! - [`pipeline`] - Stage orchestration and run summary
//! - [`preprocessing`] - Date decomposition, imputation, label encoding
//! - [`split`] - Seeded train/test splitting
//! - [`export`] - Artifact encoding and all-or-nothing persistence
//! - [`utils`] - CSV loading
//! - [`config`] - Run configuration
//! - [`logging`] - Per-run log sink
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;
pub mod logging;

// Stages
pub mod utils;
pub mod preprocessing;
pub mod split;
pub mod export;
pub mod pipeline;

// Services
pub mod cli;

pub use error::{Cause, PipelineError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Cause, PipelineError, Result};

    // Configuration and logging
    pub use crate::config::{DeclaredSchema, LoggingConfig, PipelineConfig};
    pub use crate::logging::RunLogger;

    // Pipeline
    pub use crate::pipeline::{DataProcessing, PipelineStage, RunSummary};

    // Preprocessing
    pub use crate::preprocessing::{
        ColumnType, DataPreprocessor, LabelEncoder, LabelMapping, PreprocessingConfig,
    };

    // Split and export
    pub use crate::split::TrainTestSplitter;
    pub use crate::export::{artifact_path, FrameArtifact, SplitArtifacts};
}
