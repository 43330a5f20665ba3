//! Build configuration with multi-source loading.
//!
//! Merges `pouch-build.json`, `POUCH_BUILD_*` environment variables and CLI
//! flags over the PouchDB defaults.
//! Priority: CLI > Environment > File > Defaults

mod defaults;
mod loading;
mod validation;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use pouch_bundler::{LicenseHeader, MinifierCommand, TargetPaths};

pub use defaults::*;
pub use loading::{CONFIG_FILE, ENV_PREFIX};
pub use validation::*;

/// Everything a build needs besides the mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BuildConfig {
    /// Directory holding package.json, `src/`, `lib/` and `dist/`
    #[serde(default = "default_package_root")]
    pub package_root: PathBuf,

    /// Package metadata; `package.json` in the package root when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_json: Option<PathBuf>,

    /// Inline external dependency list. Takes precedence over `externalsFile`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub externals: Option<Vec<String>>,

    /// JSON array of external package names
    #[serde(default = "default_externals_file")]
    pub externals_file: PathBuf,

    /// Token replaced with the package version in every artifact
    #[serde(default = "default_placeholder")]
    pub placeholder: String,

    #[serde(default)]
    pub license: LicenseHeader,

    /// Global the standalone bundles expose
    #[serde(default = "default_global_name")]
    pub global_name: String,

    #[serde(default)]
    pub targets: TargetPaths,

    #[serde(default)]
    pub minifier: MinifierCommand,

    /// Syntax level of the release standalone bundle
    #[serde(default = "default_downlevel_target")]
    pub downlevel_target: String,

    /// Base for relative paths. Empty means the process working directory.
    #[serde(skip)]
    pub cwd: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            package_root: default_package_root(),
            package_json: None,
            externals: None,
            externals_file: default_externals_file(),
            placeholder: default_placeholder(),
            license: LicenseHeader::default(),
            global_name: default_global_name(),
            targets: TargetPaths::default(),
            minifier: MinifierCommand::default(),
            downlevel_target: default_downlevel_target(),
            cwd: PathBuf::new(),
        }
    }
}

impl BuildConfig {
    /// Absolute base directory for every relative path in this config.
    pub fn base_dir(&self) -> std::io::Result<PathBuf> {
        if self.cwd.is_absolute() {
            return Ok(self.cwd.clone());
        }
        let current = std::env::current_dir()?;
        Ok(if self.cwd.as_os_str().is_empty() {
            current
        } else {
            current.join(&self.cwd)
        })
    }

    /// Package root resolved against `base`.
    pub fn package_root_in(&self, base: &Path) -> PathBuf {
        crate::commands::utils::resolve_path(&self.package_root, base)
    }

    /// package.json location resolved against `base`.
    pub fn package_json_in(&self, base: &Path) -> PathBuf {
        let root = self.package_root_in(base);
        match &self.package_json {
            Some(path) => crate::commands::utils::resolve_path(path, base),
            None => root.join("package.json"),
        }
    }
}
