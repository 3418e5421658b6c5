//! Per-run log sink
//!
//! A [`RunLogger`] owns the `tracing` dispatcher for one pipeline run. The
//! pipeline executes inside [`RunLogger::in_scope`], so nothing relies on a
//! process-wide subscriber. The file sink writes whole lines and is closed
//! by [`RunLogger::finish`].

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::{self, LineWriter};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Dispatch;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::config::LoggingConfig;
use crate::error::{PipelineError, Result};

/// Logging context created once per run
pub struct RunLogger {
    dispatch: Dispatch,
    log_path: Option<PathBuf>,
}

impl RunLogger {
    /// Build the stderr layer and, when configured, the dated file layer.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn new(config: &LoggingConfig) -> Result<Self> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .map_err(|e| {
                PipelineError::config(
                    "Invalid log level",
                    crate::error::Cause::InvalidValue(e.to_string()),
                )
            })?;

        let (file, log_path) = match &config.log_dir {
            Some(dir) => {
                fs::create_dir_all(dir)
                    .map_err(|e| PipelineError::config("Failed to create log directory", e))?;
                let path = dir.join(format!("log_{}.log", Local::now().format("%Y-%m-%d")));
                let handle = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|e| PipelineError::config("Failed to open log file", e))?;
                (Some(Mutex::new(LineWriter::new(handle))), Some(path))
            }
            None => (None, None),
        };

        let file_layer = file.map(|sink| fmt::layer().with_ansi(false).with_writer(sink));
        let subscriber = Registry::default()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .with(file_layer);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            log_path,
        })
    }

    /// Logger that drops every event
    pub fn silent() -> Self {
        Self {
            dispatch: Dispatch::none(),
            log_path: None,
        }
    }

    /// Run `f` with this logger as the active dispatcher
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    pub fn log_path(&self) -> Option<&PathBuf> {
        self.log_path.as_ref()
    }

    /// Release the dispatcher, closing the file sink
    pub fn finish(self) {
        drop(self.dispatch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_receives_events() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            level: "info".to_string(),
            log_dir: Some(dir.path().join("logs")),
        };

        let logger = RunLogger::new(&config).unwrap();
        logger.in_scope(|| tracing::info!("Data Processing Initialized"));
        let path = logger.log_path().cloned().unwrap();
        logger.finish();

        let text = fs::read_to_string(path).unwrap();
        assert!(text.contains("Data Processing Initialized"));
    }

    #[test]
    fn test_silent_logger() {
        let logger = RunLogger::silent();
        assert_eq!(logger.in_scope(|| 2 + 2), 4);
        assert!(logger.log_path().is_none());
        logger.finish();
    }
}
