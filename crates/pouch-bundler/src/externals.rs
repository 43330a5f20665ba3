//! The set of package names left as `require()` calls in every output.

use std::path::Path;
use std::sync::Arc;

use rolldown::IsExternal;
use rustc_hash::FxHashSet;

use crate::package_json::PackageJson;
use crate::{Error, Result};

/// Ordered, deduplicated package names that are never inlined.
///
/// Cloning shares the underlying list, so every linker and packager call in a
/// run sees the same names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalSet(Arc<[String]>);

impl ExternalSet {
    /// Build a set from names, keeping first occurrences in order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = FxHashSet::default();
        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .filter(|name| !name.is_empty() && seen.insert(name.clone()))
            .collect();
        Self(names.into())
    }

    /// Load a JSON array of package names.
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::InvalidConfig(format!(
                "Failed to read external dependency list '{}': {}",
                path.display(),
                e
            ))
        })?;
        let names: Vec<String> = serde_json::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "External dependency list '{}' must be a JSON array of strings: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new(names))
    }

    /// Every runtime dependency of the package.
    pub fn from_package(pkg: &PackageJson) -> Self {
        Self::new(pkg.dependency_names())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Whether two handles share one list.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn to_rolldown(&self) -> IsExternal {
        IsExternal::from(self.0.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn keeps_first_occurrence_order() {
        let set = ExternalSet::new(["b", "a", "b", "", "c"]);
        assert_eq!(set.names(), &["b", "a", "c"]);
        assert!(set.contains("a"));
        assert!(!set.contains("d"));
    }

    #[test]
    fn clones_share_storage() {
        let set = ExternalSet::new(["vuvuzela"]);
        let clone = set.clone();
        assert!(set.ptr_eq(&clone));
    }

    #[tokio::test]
    async fn loads_json_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("external-deps.json");
        std::fs::write(&path, r#"["spark-md5", "vuvuzela"]"#).unwrap();

        let set = ExternalSet::from_file(&path).await.unwrap();
        assert_eq!(set.names(), &["spark-md5", "vuvuzela"]);
    }

    #[tokio::test]
    async fn rejects_non_array() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("external-deps.json");
        std::fs::write(&path, r#"{"spark-md5": true}"#).unwrap();

        let err = ExternalSet::from_file(&path).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn falls_back_to_dependencies() {
        let pkg = PackageJson::parse(
            r#"{"version":"1.0.0","dependencies":{"vuvuzela":"1","argsarray":"0"}}"#,
        )
        .unwrap();
        assert_eq!(
            ExternalSet::from_package(&pkg).names(),
            &["argsarray", "vuvuzela"]
        );
    }
}
