//! Split artifact export
//!
//! Serializes the train/test partitions for the downstream training step:
//! - Typed column-major artifacts with the original row index
//! - Bincode envelope with magic bytes and checksum
//! - All-or-nothing writes of the four-file set

mod artifact;
mod writer;

pub use artifact::{ArtifactColumn, ArtifactValues, FrameArtifact};
pub use writer::{artifact_path, ArtifactWriter, SplitArtifacts, ARTIFACT_EXTENSION};
