//! Package metadata loading.
//!
//! Only the fields the build needs are parsed: the version that gets stamped
//! into every artifact and the runtime dependencies, which serve as the
//! fallback external list.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Maximum allowed size for package.json files (10MB)
const MAX_PACKAGE_JSON_SIZE: u64 = 10 * 1024 * 1024;

/// Parsed package.json structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageJson {
    pub name: Option<String>,
    pub version: Option<String>,
    /// Production dependencies, ordered by name.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    /// File path this was loaded from
    #[serde(skip)]
    pub path: PathBuf,
}

impl PackageJson {
    /// Load and parse `path`.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let metadata_err = |message: String| Error::Metadata {
            path: path.to_path_buf(),
            message,
        };

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| metadata_err(format!("cannot read package.json: {e}")))?;

        if metadata.len() > MAX_PACKAGE_JSON_SIZE {
            return Err(metadata_err(format!(
                "package.json exceeds maximum size of {}MB",
                MAX_PACKAGE_JSON_SIZE / 1024 / 1024
            )));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| metadata_err(format!("failed to read package.json: {e}")))?;

        let mut pkg = Self::parse(&content).map_err(|e| metadata_err(e.to_string()))?;
        pkg.path = path.to_path_buf();
        Ok(pkg)
    }

    /// Parse package.json content that did not come from disk.
    pub fn parse(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// The version string, required to look like `MAJOR.MINOR.PATCH[-pre][+build]`.
    pub fn version(&self) -> Result<&str> {
        let version = self.version.as_deref().ok_or_else(|| Error::Metadata {
            path: self.path.clone(),
            message: "missing \"version\" field".to_string(),
        })?;

        if !is_semver(version) {
            return Err(Error::Metadata {
                path: self.path.clone(),
                message: format!("\"{version}\" is not a semantic version"),
            });
        }

        Ok(version)
    }

    /// Runtime dependency names, sorted.
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.dependencies.keys().map(String::as_str)
    }
}

fn is_semver(version: &str) -> bool {
    let core = version
        .split_once('+')
        .map_or(version, |(core, _)| core);
    let core = core.split_once('-').map_or(core, |(core, pre)| {
        if pre.is_empty() { "" } else { core }
    });

    let parts: Vec<&str> = core.split('.').collect();
    parts.len() == 3
        && parts
            .iter()
            .all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn loads_version_and_dependencies() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("package.json");
        std::fs::write(
            &path,
            r#"{"name":"pouchdb","version":"7.2.0","dependencies":{"vuvuzela":"1.0.3","argsarray":"0.0.1"}}"#,
        )
        .unwrap();

        let pkg = PackageJson::from_path(&path).await.unwrap();
        assert_eq!(pkg.version().unwrap(), "7.2.0");
        assert_eq!(
            pkg.dependency_names().collect::<Vec<_>>(),
            vec!["argsarray", "vuvuzela"]
        );
        assert_eq!(pkg.path, path);
    }

    #[tokio::test]
    async fn missing_file_is_a_metadata_error() {
        let temp = TempDir::new().unwrap();
        let err = PackageJson::from_path(&temp.path().join("package.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Metadata { .. }));
    }

    #[test]
    fn missing_version_is_rejected() {
        let pkg = PackageJson::parse(r#"{"name":"pouchdb"}"#).unwrap();
        assert!(matches!(pkg.version(), Err(Error::Metadata { .. })));
    }

    #[test]
    fn semver_shapes() {
        assert!(is_semver("7.2.0"));
        assert!(is_semver("7.3.0-prerelease"));
        assert!(is_semver("1.0.0-beta.1+build.5"));
        assert!(!is_semver("7.2"));
        assert!(!is_semver("v7.2.0"));
        assert!(!is_semver("7.2.0-"));
        assert!(!is_semver(""));
    }
}
