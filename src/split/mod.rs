//! Seeded train/test splitting

use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{Cause, PipelineError, Result};
use crate::export::{FrameArtifact, SplitArtifacts};
use crate::preprocessing::ROW_INDEX_COLUMN;

/// Row positions of a single train/test split
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainTestIndices {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Train/test splitter with a fixed seed
#[derive(Debug, Clone)]
pub struct TrainTestSplitter {
    target_column: String,
    test_size: f64,
    random_state: u64,
}

impl Default for TrainTestSplitter {
    fn default() -> Self {
        Self {
            target_column: "RainTomorrow".to_string(),
            test_size: 0.2,
            random_state: 42,
        }
    }
}

impl TrainTestSplitter {
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            ..Default::default()
        }
    }

    /// Fraction of rows held out for testing
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Train and test row counts for `n_samples` rows.
    ///
    /// The test count is rounded up and the train set takes the remainder,
    /// so 9 rows at 0.2 give 7 train and 2 test.
    pub fn split_sizes(&self, n_samples: usize) -> std::result::Result<(usize, usize), Cause> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(Cause::InvalidValue(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        let n_test = (self.test_size * n_samples as f64).ceil() as usize;
        let n_train = n_samples.saturating_sub(n_test);
        if n_test == 0 || n_train == 0 {
            return Err(Cause::InvalidValue(format!(
                "With n_samples={}, test_size={} the train or test set would be empty",
                n_samples, self.test_size
            )));
        }
        Ok((n_train, n_test))
    }

    /// Shuffle `0..n_samples` and cut it into test (first) and train (rest)
    pub fn split_indices(&self, n_samples: usize) -> std::result::Result<TrainTestIndices, Cause> {
        let (_, n_test) = self.split_sizes(n_samples)?;

        let mut indices: Vec<usize> = (0..n_samples).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        indices.shuffle(&mut rng);

        let train_indices = indices.split_off(n_test);
        Ok(TrainTestIndices {
            train_indices,
            test_indices: indices,
        })
    }

    /// Split `df` into feature and label partitions.
    ///
    /// Features are every column except the label; labels are the label
    /// column alone. Both keep the row index so the artifacts stay aligned.
    pub fn split(&self, df: &DataFrame) -> Result<SplitArtifacts> {
        self.try_split(df).map_err(|e| {
            error!(error = %e, "Error occurred while splitting data");
            PipelineError::persist("Failed to split data", e)
        })
    }

    fn try_split(&self, df: &DataFrame) -> std::result::Result<SplitArtifacts, Cause> {
        if df.column(&self.target_column).is_err() {
            return Err(Cause::ColumnNotFound(self.target_column.clone()));
        }
        let features = df.drop(&self.target_column)?;
        let labels = df.select([ROW_INDEX_COLUMN, self.target_column.as_str()])?;

        let feature_names: Vec<&str> = features
            .get_column_names()
            .into_iter()
            .map(|s| s.as_str())
            .filter(|s| *s != ROW_INDEX_COLUMN)
            .collect();
        info!(features = ?feature_names, "Feature columns");

        let split = self.split_indices(df.height())?;
        let train_idx = to_idx(&split.train_indices);
        let test_idx = to_idx(&split.test_indices);

        let artifacts = SplitArtifacts {
            x_train: FrameArtifact::from_frame("X_train", &features.take(&train_idx)?)?,
            x_test: FrameArtifact::from_frame("X_test", &features.take(&test_idx)?)?,
            y_train: FrameArtifact::from_frame("y_train", &labels.take(&train_idx)?)?,
            y_test: FrameArtifact::from_frame("y_test", &labels.take(&test_idx)?)?,
        };
        info!(
            train_rows = artifacts.x_train.height(),
            test_rows = artifacts.x_test.height(),
            seed = self.random_state,
            "Data split into train and test sets"
        );
        Ok(artifacts)
    }
}

fn to_idx(indices: &[usize]) -> IdxCa {
    IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn encoded_frame(n: u32) -> DataFrame {
        let index: Vec<u32> = (0..n).collect();
        let rain: Vec<i64> = (0..n as i64).map(|i| i % 2).collect();
        let temp: Vec<f64> = (0..n).map(|i| i as f64 * 0.5).collect();
        df!(
            ROW_INDEX_COLUMN => &index,
            "MinTemp" => &temp,
            "RainTomorrow" => &rain
        )
        .unwrap()
    }

    #[test]
    fn test_split_sizes_round_test_up() {
        let splitter = TrainTestSplitter::default();
        assert_eq!(splitter.split_sizes(9).unwrap(), (7, 2));
        assert_eq!(splitter.split_sizes(10).unwrap(), (8, 2));
        assert_eq!(splitter.split_sizes(11).unwrap(), (8, 3));
        assert!(splitter.split_sizes(1).is_err());
        assert!(splitter.split_sizes(0).is_err());
    }

    #[test]
    fn test_invalid_test_size() {
        let splitter = TrainTestSplitter::default().with_test_size(0.0);
        assert!(splitter.split_sizes(10).is_err());
    }

    #[test]
    fn test_indices_disjoint_and_complete() {
        let split = TrainTestSplitter::default().split_indices(50).unwrap();

        let train: BTreeSet<usize> = split.train_indices.iter().copied().collect();
        let test: BTreeSet<usize> = split.test_indices.iter().copied().collect();
        assert_eq!(train.len(), 40);
        assert_eq!(test.len(), 10);
        assert!(train.is_disjoint(&test));
        assert_eq!(train.union(&test).count(), 50);
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = TrainTestSplitter::default().split_indices(100).unwrap();
        let b = TrainTestSplitter::default().split_indices(100).unwrap();
        let c = TrainTestSplitter::default()
            .with_random_state(7)
            .split_indices(100)
            .unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_split_alignment() {
        let artifacts = TrainTestSplitter::default().split(&encoded_frame(20)).unwrap();

        assert_eq!(artifacts.x_train.index, artifacts.y_train.index);
        assert_eq!(artifacts.x_test.index, artifacts.y_test.index);
        assert_eq!(artifacts.x_train.column_names(), vec!["MinTemp"]);
        assert_eq!(artifacts.y_test.column_names(), vec!["RainTomorrow"]);
        assert_eq!(artifacts.x_train.height(), 16);
        assert_eq!(artifacts.x_test.height(), 4);
    }

    #[test]
    fn test_missing_target() {
        let df = encoded_frame(10).drop("RainTomorrow").unwrap();
        let err = TrainTestSplitter::default().split(&df).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Persist { source: Cause::ColumnNotFound(_), .. }
        ));
    }
}
