//! All-or-nothing persistence of the four split artifacts

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::artifact::FrameArtifact;
use crate::error::{Cause, PipelineError, Result};

/// Extension of every artifact file
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Train/test partitions of features and labels
#[derive(Debug, Clone, PartialEq)]
pub struct SplitArtifacts {
    pub x_train: FrameArtifact,
    pub x_test: FrameArtifact,
    pub y_train: FrameArtifact,
    pub y_test: FrameArtifact,
}

impl SplitArtifacts {
    pub fn iter(&self) -> impl Iterator<Item = &FrameArtifact> {
        [&self.x_train, &self.x_test, &self.y_train, &self.y_test].into_iter()
    }
}

/// Path of a named artifact inside `dir`
pub fn artifact_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{ARTIFACT_EXTENSION}"))
}

/// Writes artifact sets into a directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Encode all artifacts, stage them as `.tmp` files, then move them over
    /// the final paths. Existing artifacts are set aside as `.bak` first and
    /// put back if any step fails, so the directory holds either the old set
    /// or the new one.
    pub fn write_all(&self, artifacts: &SplitArtifacts) -> Result<Vec<PathBuf>> {
        self.try_write_all(artifacts).map_err(|e| {
            error!(dir = %self.output_dir.display(), error = %e, "Error occurred while saving split data");
            PipelineError::persist("Failed to save split data", e)
        })
    }

    fn try_write_all(&self, artifacts: &SplitArtifacts) -> std::result::Result<Vec<PathBuf>, Cause> {
        let encoded = artifacts
            .iter()
            .map(|artifact| Ok((artifact.name.as_str(), artifact.to_bytes()?)))
            .collect::<std::result::Result<Vec<_>, Cause>>()?;

        let mut staged: Vec<Staged> = Vec::with_capacity(encoded.len());
        for (name, bytes) in &encoded {
            let target = artifact_path(&self.output_dir, name);
            let entry = Staged {
                tmp: target.with_extension(format!("{ARTIFACT_EXTENSION}.tmp")),
                backup: target.with_extension(format!("{ARTIFACT_EXTENSION}.bak")),
                target,
                backed_up: false,
                placed: false,
            };
            if let Err(e) = write_file(&entry.tmp, bytes) {
                let _ = fs::remove_file(&entry.tmp);
                rollback(&staged);
                return Err(e.into());
            }
            debug!(path = %entry.tmp.display(), bytes = bytes.len(), "Staged artifact");
            staged.push(entry);
        }

        for idx in 0..staged.len() {
            if let Err(e) = place(&mut staged[idx]) {
                rollback(&staged);
                return Err(e.into());
            }
        }

        for entry in &staged {
            if entry.backed_up {
                let _ = fs::remove_file(&entry.backup);
            }
        }
        let written: Vec<PathBuf> = staged.into_iter().map(|entry| entry.target).collect();
        info!(dir = %self.output_dir.display(), files = written.len(), "Split artifacts saved");
        Ok(written)
    }
}

/// One artifact on its way from the staging file to its final path
struct Staged {
    tmp: PathBuf,
    target: PathBuf,
    backup: PathBuf,
    backed_up: bool,
    placed: bool,
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Set aside the previous artifact, then move the staged file into place
fn place(entry: &mut Staged) -> std::io::Result<()> {
    if entry.target.is_file() {
        fs::rename(&entry.target, &entry.backup)?;
        entry.backed_up = true;
    }
    fs::rename(&entry.tmp, &entry.target)?;
    entry.placed = true;
    Ok(())
}

/// Undo every placement and restore the previous artifacts
fn rollback(staged: &[Staged]) {
    for entry in staged {
        if entry.placed {
            let _ = fs::remove_file(&entry.target);
        }
        if entry.backed_up {
            if let Err(e) = fs::rename(&entry.backup, &entry.target) {
                warn!(path = %entry.target.display(), error = %e, "Could not restore previous artifact");
            }
        }
        let _ = fs::remove_file(&entry.tmp);
    }
}
