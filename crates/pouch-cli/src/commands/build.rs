//! Build command implementation.
//!
//! Loads the configuration layers, reads the package metadata and hands a
//! [`PipelineOptions`] to the bundler's [`Pipeline`].

use std::path::Path;
use std::sync::Arc;

use pouch_bundler::{
    BuildMode, BuildReport, BundlerCache, PackageJson, Pipeline, PipelineOptions,
};

use crate::cli::Cli;
use crate::commands::utils::{self, resolve_path};
use crate::config::BuildConfig;
use crate::error::{CliError, Result, ResultExt};
use crate::ui;

/// Execute the build command.
///
/// # Build Process
///
/// 1. Load and validate configuration (CLI > Env > File > Defaults)
/// 2. Read the mode from `BUILD_NODE` / `CLIENT`
/// 3. Run the pipeline
/// 4. Display the build summary unless `--quiet`
pub async fn execute(args: Cli) -> Result<BuildReport> {
    let current = std::env::current_dir()?;
    let cwd = match &args.cwd {
        Some(dir) => resolve_path(dir, &current),
        None => current,
    };
    if !cwd.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "working directory does not exist: {}",
            cwd.display()
        )));
    }

    let config = BuildConfig::load(&args, &cwd)?;
    let mode = BuildMode::from_env();

    if !args.quiet {
        ui::info(&format!("Building PouchDB ({mode})"));
    }

    let report = do_build(&config, mode).await?;

    if !args.quiet {
        let root = config.package_root_in(&cwd);
        ui::print_build_summary(&report, &root);
        ui::success(&format!(
            "Built {} {} in {}",
            report.artifacts.len(),
            if report.artifacts.len() == 1 { "artifact" } else { "artifacts" },
            ui::format_duration(report.elapsed)
        ));
    }

    Ok(report)
}

/// Build the package described by `config` in `mode`.
///
/// This is the library entry for parent build drivers: the same work as the
/// `build-pouchdb` binary, with the outcome returned instead of turned into an
/// exit code.
pub async fn do_build(config: &BuildConfig, mode: BuildMode) -> Result<BuildReport> {
    do_build_with_cache(config, mode, Arc::new(BundlerCache::new())).await
}

/// [`do_build`] against a caller-held session cache.
///
/// Drivers that rebuild in one process pass the same `cache` every time; the
/// standalone and next bundles then reuse their Rolldown sessions instead of
/// opening new ones.
pub async fn do_build_with_cache(
    config: &BuildConfig,
    mode: BuildMode,
    cache: Arc<BundlerCache>,
) -> Result<BuildReport> {
    config.validate()?;

    let base = config.base_dir()?;
    let root = config.package_root_in(&base);
    ensure_package_root(&root)?;

    let pkg = PackageJson::from_path(&config.package_json_in(&base)).await?;
    let version = pkg.version()?.to_string();
    let externals = utils::load_externals(config, &base, &pkg).await?;

    tracing::debug!(
        "Building {} {} in {} mode with {} externals",
        pkg.name.as_deref().unwrap_or("package"),
        version,
        mode,
        externals.len()
    );

    let options = PipelineOptions::new(root, version)
        .externals(externals)
        .placeholder(config.placeholder.clone())
        .license(config.license.clone())
        .global_name(config.global_name.clone())
        .targets(config.targets.clone())
        .minifier(config.minifier.clone())
        .downlevel_target(config.downlevel_target.clone());

    Ok(Pipeline::new(options, mode).with_cache(cache).run().await?)
}

fn ensure_package_root(root: &Path) -> Result<()> {
    let metadata = std::fs::metadata(root)
        .with_path(root)
        .with_hint("Set packageRoot in pouch-build.json or pass --package-root")?;
    if !metadata.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "package root is not a directory: {}",
            root.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_package_root_names_the_path() {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig {
            cwd: temp.path().to_path_buf(),
            ..BuildConfig::default()
        };

        let err = do_build(&config, BuildMode::NodeOnly).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("packages/node_modules/pouchdb"), "{msg}");
        assert!(msg.contains("Hint:"), "{msg}");
    }

    #[tokio::test]
    async fn invalid_config_fails_before_touching_disk() {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig {
            cwd: temp.path().to_path_buf(),
            global_name: "not-an-identifier".to_string(),
            ..BuildConfig::default()
        };

        let err = do_build(&config, BuildMode::FullRelease).await.unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[tokio::test]
    async fn package_without_version_is_a_metadata_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{ "name": "pouchdb" }"#).unwrap();
        let config = BuildConfig {
            cwd: temp.path().to_path_buf(),
            package_root: ".".into(),
            ..BuildConfig::default()
        };

        let err = do_build(&config, BuildMode::NodeOnly).await.unwrap_err();
        assert!(
            matches!(err, CliError::Build(pouch_bundler::Error::Metadata { .. })),
            "{err:?}"
        );
    }
}
