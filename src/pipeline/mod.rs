//! Data processing pipeline
//!
//! Runs the four stages in a fixed order over one owned table:
//! load → preprocess → label encode → split and save. A stage can only run
//! from the state left by the previous one; any failure ends the run.

use chrono::Utc;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, info_span};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::export::{ArtifactWriter, SplitArtifacts};
use crate::preprocessing::{
    DataPreprocessor, LabelEncoder, LabelMapping, PreprocessReport, PreprocessingConfig,
    ROW_INDEX_COLUMN,
};
use crate::split::TrainTestSplitter;
use crate::utils::DataLoader;

/// Pipeline state; each stage moves it one step forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PipelineStage {
    Initialized,
    Loaded,
    Preprocessed,
    Encoded,
    Split,
    Completed,
}

impl PipelineStage {
    /// State a stage must start from to reach `self`
    fn predecessor(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Initialized => None,
            PipelineStage::Loaded => Some(PipelineStage::Initialized),
            PipelineStage::Preprocessed => Some(PipelineStage::Loaded),
            PipelineStage::Encoded => Some(PipelineStage::Preprocessed),
            PipelineStage::Split => Some(PipelineStage::Encoded),
            PipelineStage::Completed => Some(PipelineStage::Split),
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub rows_loaded: usize,
    pub preprocess: PreprocessReport,
    pub label_mappings: Vec<LabelMapping>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub artifact_paths: Vec<PathBuf>,
    pub elapsed_secs: f64,
}

/// Data preparation for the rain-prediction model
pub struct DataProcessing {
    config: PipelineConfig,
    run_id: String,
    stage: PipelineStage,
    df: Option<DataFrame>,
    rows_loaded: usize,
    preprocess_report: Option<PreprocessReport>,
    label_mappings: Vec<LabelMapping>,
    artifacts: Option<SplitArtifacts>,
    artifact_paths: Vec<PathBuf>,
}

impl DataProcessing {
    pub fn new(config: PipelineConfig) -> Self {
        let run_id = Utc::now().format("%Y%m%dT%H%M%S%.3fZ").to_string();
        info!(
            run_id = %run_id,
            input = %config.input_path.display(),
            output = %config.output_dir.display(),
            "Data Processing Initialized"
        );
        Self {
            config,
            run_id,
            stage: PipelineStage::Initialized,
            df: None,
            rows_loaded: 0,
            preprocess_report: None,
            label_mappings: Vec::new(),
            artifacts: None,
            artifact_paths: Vec::new(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current table, once loaded
    pub fn table(&self) -> Option<&DataFrame> {
        self.df.as_ref()
    }

    pub fn label_mappings(&self) -> &[LabelMapping] {
        &self.label_mappings
    }

    pub fn artifacts(&self) -> Option<&SplitArtifacts> {
        self.artifacts.as_ref()
    }

    fn advance(&self, to: PipelineStage) -> Result<()> {
        if to.predecessor() != Some(self.stage) {
            return Err(PipelineError::OutOfOrder {
                requested: to,
                current: self.stage,
            });
        }
        Ok(())
    }

    fn table_for(&self, requested: PipelineStage) -> Result<&DataFrame> {
        self.df.as_ref().ok_or(PipelineError::OutOfOrder {
            requested,
            current: self.stage,
        })
    }

    /// Read the input file, attach the row index and create the output directory
    pub fn load_data(&mut self) -> Result<()> {
        self.advance(PipelineStage::Loaded)?;

        std::fs::create_dir_all(&self.config.output_dir).map_err(|e| {
            error!(dir = %self.config.output_dir.display(), error = %e, "Cannot create output directory");
            PipelineError::data_load("Failed to create output directory", e)
        })?;

        let loader = DataLoader::new();
        let df = match &self.config.schema {
            Some(schema) => loader.load_with_schema(&self.config.input_path, schema)?,
            None => loader.load_csv(&self.config.input_path)?,
        };
        let df = df
            .with_row_index(ROW_INDEX_COLUMN.into(), None)
            .map_err(|e| PipelineError::data_load("Failed to load data", e))?;

        self.rows_loaded = df.height();
        self.df = Some(df);
        self.stage = PipelineStage::Loaded;
        Ok(())
    }

    /// Date decomposition, mean imputation and residual null drop
    pub fn preprocess(&mut self) -> Result<()> {
        self.advance(PipelineStage::Preprocessed)?;

        let mut preprocessor =
            DataPreprocessor::with_config(PreprocessingConfig::from(&self.config));
        let cleaned = preprocessor.process(self.table_for(PipelineStage::Preprocessed)?)?;

        self.preprocess_report = preprocessor.report().cloned();
        self.df = Some(cleaned);
        self.stage = PipelineStage::Preprocessed;
        Ok(())
    }

    /// Replace the categorical columns with their label codes
    pub fn label_encode(&mut self) -> Result<()> {
        self.advance(PipelineStage::Encoded)?;

        let df = self.table_for(PipelineStage::Encoded)?;
        let columns: Vec<&str> = self
            .config
            .categorical_columns
            .iter()
            .map(String::as_str)
            .collect();

        let mut encoder = LabelEncoder::new();
        let encoded = encoder.fit_transform(df, &columns).map_err(|e| {
            error!(error = %e, "Error occurred while label encoding");
            PipelineError::encode("Failed to label encode", e)
        })?;

        for mapping in encoder.mappings() {
            let rendered = serde_json::to_string(&mapping.as_map()).unwrap_or_default();
            info!(column = %mapping.column, classes = mapping.len(), mapping = %rendered, "Label mapping");
        }
        info!("Label encoding done");

        self.label_mappings = encoder.mappings().to_vec();
        self.df = Some(encoded);
        self.stage = PipelineStage::Encoded;
        Ok(())
    }

    /// Split into train/test features and labels, then persist all four
    pub fn split_data(&mut self) -> Result<()> {
        self.advance(PipelineStage::Split)?;

        let splitter = TrainTestSplitter::new(&self.config.target_column)
            .with_test_size(self.config.test_size)
            .with_random_state(self.config.random_state);
        let artifacts = splitter.split(self.table_for(PipelineStage::Split)?)?;

        self.artifact_paths = ArtifactWriter::new(&self.config.output_dir).write_all(&artifacts)?;
        self.artifacts = Some(artifacts);
        self.stage = PipelineStage::Split;
        Ok(())
    }

    /// Run every stage in order
    pub fn run(&mut self) -> Result<RunSummary> {
        let span = info_span!("data_processing", run_id = %self.run_id);
        let _guard = span.enter();
        let start = Instant::now();

        self.load_data()?;
        self.preprocess()?;
        self.label_encode()?;
        self.split_data()?;

        self.advance(PipelineStage::Completed)?;
        self.stage = PipelineStage::Completed;
        self.df = None;

        let summary = RunSummary {
            run_id: self.run_id.clone(),
            rows_loaded: self.rows_loaded,
            preprocess: self.preprocess_report.clone().unwrap_or_default(),
            label_mappings: self.label_mappings.clone(),
            train_rows: self.artifacts.as_ref().map_or(0, |a| a.x_train.height()),
            test_rows: self.artifacts.as_ref().map_or(0, |a| a.x_test.height()),
            artifact_paths: self.artifact_paths.clone(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        };
        info!(elapsed_secs = summary.elapsed_secs, "Data Processing Completed");
        Ok(summary)
    }
}
