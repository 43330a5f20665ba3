//! Shared helpers for the build command.

use std::path::{Path, PathBuf};

use pouch_bundler::{ExternalSet, PackageJson};

use crate::config::BuildConfig;
use crate::error::Result;

/// Resolve a path relative to a working directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// Externals in order of precedence: the inline list, the externals file,
/// then the package's runtime dependencies.
pub async fn load_externals(
    config: &BuildConfig,
    base: &Path,
    pkg: &PackageJson,
) -> Result<ExternalSet> {
    if let Some(names) = &config.externals {
        return Ok(ExternalSet::new(names.iter().cloned()));
    }

    let file = resolve_path(&config.externals_file, base);
    if tokio::fs::try_exists(&file).await.unwrap_or(false) {
        tracing::debug!("Loading externals from {}", file.display());
        return Ok(ExternalSet::from_file(&file).await?);
    }

    tracing::debug!(
        "No externals file at {}, using package.json dependencies",
        file.display()
    );
    Ok(ExternalSet::from_package(pkg))
}
