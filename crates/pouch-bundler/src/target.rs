//! Output targets and the package layout they are derived from.

use std::path::{Component, Path, PathBuf};

use path_clean::PathClean;
use serde::{Deserialize, Serialize};

use crate::externals::ExternalSet;
use crate::{Error, Result};

/// Package-relative paths of every entry and artifact.
///
/// Defaults follow the PouchDB package layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TargetPaths {
    pub source_entry: PathBuf,
    pub node_output: PathBuf,
    pub browser_output: PathBuf,
    pub standalone_output: PathBuf,
    pub minified_output: PathBuf,
    pub next_entry: PathBuf,
    pub next_output: PathBuf,
    pub lib_dir: PathBuf,
    pub dist_dir: PathBuf,
}

impl Default for TargetPaths {
    fn default() -> Self {
        Self {
            source_entry: PathBuf::from("src/index.js"),
            node_output: PathBuf::from("lib/index.js"),
            browser_output: PathBuf::from("lib/index-browser.js"),
            standalone_output: PathBuf::from("dist/pouchdb.js"),
            minified_output: PathBuf::from("dist/pouchdb.min.js"),
            next_entry: PathBuf::from("src/next.js"),
            next_output: PathBuf::from("dist/pouchdb-next.js"),
            lib_dir: PathBuf::from("lib"),
            dist_dir: PathBuf::from("dist"),
        }
    }
}

impl TargetPaths {
    /// Every output path and output directory, for containment checks.
    pub fn outputs(&self) -> [&Path; 7] {
        [
            &self.node_output,
            &self.browser_output,
            &self.standalone_output,
            &self.minified_output,
            &self.next_output,
            &self.lib_dir,
            &self.dist_dir,
        ]
    }
}

/// One produced artifact: where it comes from and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    /// Package-relative output path, used in logs and errors.
    pub name: String,
    pub entry: PathBuf,
    pub output: PathBuf,
    /// Prefer `browser` fields and conditions during resolution.
    pub browser: bool,
    /// Global symbol for standalone bundles.
    pub standalone: Option<String>,
    pub externals: ExternalSet,
}

/// Every target of one run, resolved against the package root.
#[derive(Debug, Clone)]
pub struct TargetSet {
    pub root: PathBuf,
    pub node: TargetDescriptor,
    pub browser: TargetDescriptor,
    /// Bundled from the browser module.
    pub standalone: TargetDescriptor,
    pub minified_output: PathBuf,
    pub next: TargetDescriptor,
    pub lib_dir: PathBuf,
    pub dist_dir: PathBuf,
}

impl TargetSet {
    pub fn resolve(
        root: &Path,
        paths: &TargetPaths,
        externals: &ExternalSet,
        global_name: &str,
    ) -> Result<Self> {
        let root = root.clean();
        let at = |rel: &Path| resolve_within(&root, rel);
        let descriptor = |entry: &Path, output: &Path, browser: bool, standalone: bool| {
            Ok::<_, Error>(TargetDescriptor {
                name: output.to_string_lossy().replace('\\', "/"),
                entry: at(entry)?,
                output: at(output)?,
                browser,
                standalone: standalone.then(|| global_name.to_string()),
                externals: externals.clone(),
            })
        };

        Ok(Self {
            node: descriptor(&paths.source_entry, &paths.node_output, false, false)?,
            browser: descriptor(&paths.source_entry, &paths.browser_output, true, false)?,
            standalone: descriptor(&paths.browser_output, &paths.standalone_output, true, true)?,
            minified_output: at(&paths.minified_output)?,
            next: descriptor(&paths.next_entry, &paths.next_output, true, true)?,
            lib_dir: at(&paths.lib_dir)?,
            dist_dir: at(&paths.dist_dir)?,
            root,
        })
    }

    /// Path relative to the package root, for display.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Join `rel` onto `root`, rejecting anything that escapes it.
pub fn resolve_within(root: &Path, rel: &Path) -> Result<PathBuf> {
    if rel.as_os_str().is_empty() {
        return Err(Error::InvalidConfig("empty path in target layout".to_string()));
    }
    if rel.is_absolute() || rel.components().any(|c| matches!(c, Component::Prefix(_))) {
        return Err(Error::InvalidConfig(format!(
            "target path '{}' must be relative to the package root",
            rel.display()
        )));
    }

    let full = root.join(rel).clean();
    if !full.starts_with(root) || full == root {
        return Err(Error::InvalidConfig(format!(
            "target path '{}' escapes the package root '{}'",
            rel.display(),
            root.display()
        )));
    }
    Ok(full)
}
