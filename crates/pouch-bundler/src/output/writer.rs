//! Atomic artifact writes.
//!
//! Content goes to `<path>.tmp` first and is renamed onto `<path>` only once
//! it is completely on disk. `rename()` is atomic on the filesystems we build
//! on, so readers of `<path>` see either the previous artifact or the new one,
//! never a prefix of it.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::WrittenArtifact;
use crate::{Error, Result};

/// Writes artifacts below a package root and logs them relative to it.
#[derive(Debug, Clone)]
pub struct AtomicWriter {
    root: PathBuf,
}

impl AtomicWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `content` to `path` through a temporary sibling.
    ///
    /// The parent directory must already exist; directory lifecycle belongs
    /// to the pipeline. On failure the temporary file is removed best-effort
    /// and `path` is left as it was.
    pub async fn write(&self, path: &Path, content: impl AsRef<[u8]>) -> Result<WrittenArtifact> {
        let content = content.as_ref();
        let temp_path = temp_path_for(path);

        if let Err(source) = tokio::fs::write(&temp_path, content).await {
            discard_temp_file(&temp_path).await;
            return Err(Error::Write {
                path: path.to_path_buf(),
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&temp_path, path).await {
            discard_temp_file(&temp_path).await;
            return Err(Error::Write {
                path: path.to_path_buf(),
                source,
            });
        }

        info!("  ✓ wrote {}", self.relative(path).display());

        Ok(WrittenArtifact {
            path: path.to_path_buf(),
            bytes: content.len() as u64,
        })
    }

    /// `path` relative to the package root when it lies below it.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// `index.js` → `index.js.tmp`; the suffix is appended, never substituted.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Best-effort cleanup - we're already in an error state.
async fn discard_temp_file(temp_path: &Path) {
    match tokio::fs::remove_file(temp_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to clean up temporary file '{}': {}",
            temp_path.display(),
            e
        ),
    }
}
