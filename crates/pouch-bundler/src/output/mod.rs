//! Artifact writing and the summary of a finished run.

pub mod writer;

pub use writer::AtomicWriter;

use std::path::PathBuf;
use std::time::Duration;

use crate::mode::BuildMode;

/// An artifact that is on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub path: PathBuf,
    pub bytes: u64,
}

/// What a pipeline run produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub mode: BuildMode,
    pub version: String,
    /// Phase order, then task order within a phase.
    pub artifacts: Vec<WrittenArtifact>,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn total_bytes(&self) -> u64 {
        self.artifacts.iter().map(|a| a.bytes).sum()
    }

    pub fn artifact(&self, path: &std::path::Path) -> Option<&WrittenArtifact> {
        self.artifacts.iter().find(|a| a.path == path)
    }
}
