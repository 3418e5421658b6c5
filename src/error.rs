//! Error types for the data preparation pipeline

use thiserror::Error;

use crate::pipeline::PipelineStage;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Library-level failure wrapped by a [`PipelineError`]
#[derive(Error, Debug)]
pub enum Cause {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Polars(#[from] polars::error::PolarsError),

    #[error(transparent)]
    Serialization(#[from] bincode::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("cannot parse {value:?} in column {column} (row {row}) as a date")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Error raised by a pipeline stage
///
/// Each stage variant carries a short message and the underlying [`Cause`].
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("{message}")]
    DataLoad {
        message: String,
        #[source]
        source: Cause,
    },

    #[error("{message}")]
    Preprocess {
        message: String,
        #[source]
        source: Cause,
    },

    #[error("{message}")]
    Encode {
        message: String,
        #[source]
        source: Cause,
    },

    #[error("{message}")]
    Persist {
        message: String,
        #[source]
        source: Cause,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Cause,
    },

    #[error("Stage {requested:?} cannot run while the pipeline is {current:?}")]
    OutOfOrder {
        requested: PipelineStage,
        current: PipelineStage,
    },
}

impl PipelineError {
    pub fn data_load(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::DataLoad { message: message.into(), source: source.into() }
    }

    pub fn preprocess(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::Preprocess { message: message.into(), source: source.into() }
    }

    pub fn encode(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::Encode { message: message.into(), source: source.into() }
    }

    pub fn persist(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::Persist { message: message.into(), source: source.into() }
    }

    pub fn config(message: impl Into<String>, source: impl Into<Cause>) -> Self {
        PipelineError::Config { message: message.into(), source: source.into() }
    }

    /// The wrapped library failure, if any
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            PipelineError::DataLoad { source, .. }
            | PipelineError::Preprocess { source, .. }
            | PipelineError::Encode { source, .. }
            | PipelineError::Persist { source, .. }
            | PipelineError::Config { source, .. } => Some(source),
            PipelineError::OutOfOrder { .. } => None,
        }
    }
}
