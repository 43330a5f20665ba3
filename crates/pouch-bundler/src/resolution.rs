//! Rolldown option wiring shared by the linker and the packager.

use std::path::{Path, PathBuf};

use path_clean::PathClean;
use rolldown::{BundleOutput, BundlerOptions, InputItem, Platform, ResolveOptions};
use rolldown_common::Output;

use crate::externals::ExternalSet;
use crate::{Error, Result};

const NODE_CONDITIONS: &[&str] = &["node", "require", "module", "default"];
const BROWSER_CONDITIONS: &[&str] = &["browser", "require", "module", "default"];

/// Options common to every Rolldown invocation for one entry.
pub(crate) fn base_options(
    entry: &Path,
    cwd: &Path,
    externals: &ExternalSet,
    browser: bool,
) -> BundlerOptions {
    BundlerOptions {
        input: Some(vec![InputItem {
            name: None,
            import: entry.clean().to_string_lossy().into_owned(),
        }]),
        cwd: Some(cwd.to_path_buf()),
        external: Some(externals.to_rolldown()),
        platform: Some(if browser {
            Platform::Browser
        } else {
            Platform::Node
        }),
        resolve: Some(resolve_options(cwd, browser)),
        ..Default::default()
    }
}

/// Module resolution with `browser` fields and conditions preferred when asked.
pub(crate) fn resolve_options(cwd: &Path, browser: bool) -> ResolveOptions {
    let main_fields = if browser {
        vec!["browser".to_string(), "module".to_string(), "main".to_string()]
    } else {
        vec!["module".to_string(), "main".to_string()]
    };
    let conditions = if browser {
        BROWSER_CONDITIONS
    } else {
        NODE_CONDITIONS
    };

    ResolveOptions {
        main_fields: Some(main_fields),
        condition_names: Some(conditions.iter().map(|c| c.to_string()).collect()),
        extensions: Some(vec![".js".to_string(), ".json".to_string(), ".mjs".to_string()]),
        modules: Some(node_modules_chain(cwd)),
        symlinks: Some(true),
        ..Default::default()
    }
}

/// `node_modules` directories from `cwd` up to the filesystem root.
fn node_modules_chain(cwd: &Path) -> Vec<String> {
    let mut paths: Vec<String> = cwd
        .ancestors()
        .map(|dir| dir.join("node_modules").to_string_lossy().into_owned())
        .collect();
    paths.push("node_modules".to_string());
    paths
}

/// Code of the single entry chunk Rolldown produced for `entry`.
pub(crate) fn entry_chunk_code(output: BundleOutput, entry: &Path) -> Result<String> {
    output
        .assets
        .into_iter()
        .find_map(|item| match item {
            Output::Chunk(chunk) if chunk.is_entry => Some(chunk.code.clone()),
            _ => None,
        })
        .ok_or_else(|| Error::Transform {
            file: entry.display().to_string(),
            message: "bundler produced no entry chunk".to_string(),
        })
}

pub(crate) fn display_entry(entry: &Path, root: &Path) -> PathBuf {
    entry.strip_prefix(root).unwrap_or(entry).to_path_buf()
}
