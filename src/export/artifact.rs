//! Serialized table artifacts
//!
//! A [`FrameArtifact`] is a typed, column-major copy of a frame plus the
//! original row positions. On disk it is wrapped in an envelope carrying
//! magic bytes, a format version and an FNV-1a checksum, all bincode encoded.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::Cause;
use crate::preprocessing::ROW_INDEX_COLUMN;

/// Typed cells of one artifact column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArtifactValues {
    Int64(Vec<Option<i64>>),
    Float64(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    Utf8(Vec<Option<String>>),
}

impl ArtifactValues {
    pub fn len(&self) -> usize {
        match self {
            ArtifactValues::Int64(v) => v.len(),
            ArtifactValues::Float64(v) => v.len(),
            ArtifactValues::Boolean(v) => v.len(),
            ArtifactValues::Utf8(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn from_column(column: &Column) -> std::result::Result<Self, Cause> {
        let values = match column.dtype() {
            DataType::Float32 | DataType::Float64 => {
                let casted = column.cast(&DataType::Float64)?;
                ArtifactValues::Float64(casted.f64()?.into_iter().collect())
            }
            DataType::Boolean => ArtifactValues::Boolean(column.bool()?.into_iter().collect()),
            dtype if dtype.is_integer() => {
                let casted = column.cast(&DataType::Int64)?;
                ArtifactValues::Int64(casted.i64()?.into_iter().collect())
            }
            _ => {
                let casted = column.cast(&DataType::String)?;
                ArtifactValues::Utf8(
                    casted
                        .str()?
                        .into_iter()
                        .map(|v| v.map(str::to_string))
                        .collect(),
                )
            }
        };
        Ok(values)
    }

    fn to_column(&self, name: &str) -> Column {
        match self {
            ArtifactValues::Int64(v) => Column::new(name.into(), v),
            ArtifactValues::Float64(v) => Column::new(name.into(), v),
            ArtifactValues::Boolean(v) => Column::new(name.into(), v),
            ArtifactValues::Utf8(v) => Column::new(name.into(), v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactColumn {
    pub name: String,
    pub values: ArtifactValues,
}

/// Persisted partition of the processed table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameArtifact {
    /// Artifact name, e.g. `X_train`
    pub name: String,
    /// Original row position of each row
    pub index: Vec<u64>,
    pub columns: Vec<ArtifactColumn>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactEnvelope {
    magic: [u8; 4],
    format_version: u32,
    payload: Vec<u8>,
    checksum: u64,
}

impl FrameArtifact {
    const MAGIC: [u8; 4] = *b"WDPA";
    const VERSION: u32 = 1;

    /// Copy `df`, reading row positions from the hidden index column
    pub fn from_frame(name: impl Into<String>, df: &DataFrame) -> std::result::Result<Self, Cause> {
        let index_column = df
            .column(ROW_INDEX_COLUMN)
            .map_err(|_| Cause::ColumnNotFound(ROW_INDEX_COLUMN.to_string()))?;
        let index = index_column
            .cast(&DataType::UInt64)?
            .u64()?
            .into_iter()
            .map(|v| v.ok_or_else(|| Cause::InvalidValue("null row index".to_string())))
            .collect::<std::result::Result<Vec<u64>, Cause>>()?;

        let columns = df
            .get_columns()
            .iter()
            .filter(|c| c.name().as_str() != ROW_INDEX_COLUMN)
            .map(|c| {
                Ok(ArtifactColumn {
                    name: c.name().to_string(),
                    values: ArtifactValues::from_column(c)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, Cause>>()?;

        Ok(Self {
            name: name.into(),
            index,
            columns,
        })
    }

    pub fn height(&self) -> usize {
        self.index.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ArtifactValues> {
        self.columns.iter().find(|c| c.name == name).map(|c| &c.values)
    }

    /// Rebuild a polars frame (without the row index)
    pub fn to_dataframe(&self) -> std::result::Result<DataFrame, Cause> {
        let columns = self
            .columns
            .iter()
            .map(|c| c.values.to_column(&c.name))
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    /// Encode into the enveloped on-disk representation
    pub fn to_bytes(&self) -> std::result::Result<Vec<u8>, Cause> {
        let payload = bincode::serialize(self)?;
        let envelope = ArtifactEnvelope {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            checksum: fnv1a(&payload),
            payload,
        };
        Ok(bincode::serialize(&envelope)?)
    }

    /// Decode and verify an enveloped artifact
    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Cause> {
        let envelope: ArtifactEnvelope = bincode::deserialize(bytes)?;
        if envelope.magic != Self::MAGIC {
            return Err(Cause::InvalidValue("not a split artifact".to_string()));
        }
        if envelope.format_version != Self::VERSION {
            return Err(Cause::InvalidValue(format!(
                "unsupported artifact version {}",
                envelope.format_version
            )));
        }
        if fnv1a(&envelope.payload) != envelope.checksum {
            return Err(Cause::InvalidValue(
                "checksum verification failed - file may be corrupted".to_string(),
            ));
        }
        Ok(bincode::deserialize(&envelope.payload)?)
    }

    /// Read an artifact file written by the pipeline
    pub fn load(path: impl AsRef<Path>) -> std::result::Result<Self, Cause> {
        let mut bytes = Vec::new();
        BufReader::new(File::open(path.as_ref())?).read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df!(
            ROW_INDEX_COLUMN => &[3u32, 0, 7],
            "Location" => &[2i64, 0, 1],
            "MinTemp" => &[Some(13.4), None, Some(7.9)],
            "Note" => &["a", "b", "c"]
        )
        .unwrap()
    }

    #[test]
    fn test_from_frame() {
        let artifact = FrameArtifact::from_frame("X_test", &frame()).unwrap();

        assert_eq!(artifact.index, vec![3, 0, 7]);
        assert_eq!(artifact.height(), 3);
        assert_eq!(artifact.column_names(), vec!["Location", "MinTemp", "Note"]);
        assert_eq!(
            artifact.column("MinTemp"),
            Some(&ArtifactValues::Float64(vec![Some(13.4), None, Some(7.9)]))
        );
    }

    #[test]
    fn test_requires_row_index() {
        let df = df!("a" => &[1i64]).unwrap();
        assert!(matches!(
            FrameArtifact::from_frame("X", &df),
            Err(Cause::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_bytes_are_verified() {
        let artifact = FrameArtifact::from_frame("y_train", &frame()).unwrap();
        let bytes = artifact.to_bytes().unwrap();
        assert_eq!(FrameArtifact::from_bytes(&bytes).unwrap(), artifact);

        let mut corrupted = bytes.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xFF;
        assert!(FrameArtifact::from_bytes(&corrupted).is_err());
    }

    #[test]
    fn test_to_dataframe() {
        let artifact = FrameArtifact::from_frame("X_train", &frame()).unwrap();
        let df = artifact.to_dataframe().unwrap();

        assert_eq!(df.width(), 3);
        assert_eq!(df.column("Location").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("MinTemp").unwrap().null_count(), 1);
    }
}
