//! # pouch-bundler
//!
//! Multi-target build orchestration for the PouchDB package.
//!
//! One source entry point fans out into several artifacts: a CommonJS module
//! for servers, a browser-resolved CommonJS module for downstream bundlers,
//! and a self-contained browser bundle in full and minified form. The
//! [`Pipeline`] sequences the stages, the engines behind them are trait seams
//! ([`LinkEngine`], [`BundleEngine`], [`Minify`]) with Rolldown, oxc and an
//! external minifier process as the defaults.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pouch_bundler::{BuildMode, ExternalSet, LicenseHeader, Pipeline, PipelineOptions, TargetPaths};
//!
//! # async fn run() -> pouch_bundler::Result<()> {
//! let root = std::path::Path::new("packages/node_modules/pouchdb");
//! let options = PipelineOptions::new(root, "7.2.0")
//!     .externals(ExternalSet::new(["vuvuzela", "spark-md5"]))
//!     .license(LicenseHeader::default())
//!     .targets(TargetPaths::default());
//!
//! let report = Pipeline::new(options, BuildMode::from_env()).run().await?;
//! for artifact in &report.artifacts {
//!     println!("{} ({} bytes)", artifact.path.display(), artifact.bytes);
//! }
//! # Ok(()) }
//! ```
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the binary.

use std::path::PathBuf;

pub mod diagnostics;
pub mod externals;
pub mod linker;
pub mod minifier;
pub mod mode;
pub mod output;
pub mod package_json;
pub mod packager;
pub mod pipeline;
mod resolution;
pub mod stages;
pub mod target;
pub mod version;

pub use externals::ExternalSet;
pub use linker::{LinkEngine, LinkRequest, ModuleGraphLinker, RolldownLinker};
pub use minifier::{MinifierBridge, MinifierCommand, MinifierProcess, Minify, ProcessMinifier};
pub use mode::BuildMode;
pub use output::{AtomicWriter, BuildReport, WrittenArtifact};
pub use package_json::PackageJson;
pub use packager::{
    BundleEngine, BundleRequest, BundleSession, BundlerCache, CodeTransform, EsDownlevel,
    PackageOptions, ReferenceCollapse, RolldownPackager, WholeBundlePackager,
};
pub use pipeline::{Pipeline, PipelineOptions};
pub use stages::{Stage, StageTask, join_stages};
pub use target::{TargetDescriptor, TargetPaths, TargetSet};
pub use version::{LicenseHeader, VERSION_PLACEHOLDER, VersionInjector};

/// Error types for pouch-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A non-external import could not be resolved from an entry.
    #[error("Resolution failed for {}: {message}", entry.display())]
    Resolution { entry: PathBuf, message: String },

    /// Bundling or a post-processing pass rejected the code.
    #[error("Transform failed for {file}: {message}")]
    Transform { file: String, message: String },

    /// The minifier process failed to start, exited non-zero, or a stream broke.
    #[error("Minifier `{program}` failed: {reason}")]
    Subprocess { program: String, reason: String },

    /// Writing or renaming an artifact failed.
    #[error("Failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Removing or creating an output directory failed.
    #[error("Failed to prepare directory {}", path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Package metadata is missing, unreadable, or has no usable version.
    #[error("Invalid package metadata in {}: {message}", path.display())]
    Metadata { path: PathBuf, message: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stage failed; carries which stage and which target.
    #[error("{stage} stage failed for {target}")]
    Stage {
        stage: Stage,
        target: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for pouch-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Tag an error with the stage and target it came from.
    ///
    /// Already-tagged errors are returned unchanged so the innermost stage wins.
    pub fn in_stage(self, stage: Stage, target: impl Into<String>) -> Self {
        match self {
            tagged @ Error::Stage { .. } => tagged,
            other => Error::Stage {
                stage,
                target: target.into(),
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping stage tags.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Resolution { .. } => "RESOLUTION_ERROR",
            Error::Transform { .. } => "TRANSFORM_ERROR",
            Error::Subprocess { .. } => "SUBPROCESS_ERROR",
            Error::Write { .. } => "WRITE_ERROR",
            Error::Directory { .. } => "DIRECTORY_ERROR",
            Error::Metadata { .. } => "METADATA_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Io(_) => "IO_ERROR",
            Error::Stage { source, .. } => return source.code(),
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::Resolution { .. } => Some(Box::new(
                "Install the missing package, or add it to the external dependency list if it should stay a require() call.",
            )),
            Error::Transform { .. } => Some(Box::new(
                "The generated bundle could not be parsed or transformed. Check the source for syntax the downlevel target cannot express.",
            )),
            Error::Subprocess { program, .. } => Some(Box::new(format!(
                "Make sure `{}` is installed and on PATH, or set a different minifier in pouch-build.json.",
                program
            ))),
            Error::Write { path, .. } => Some(Box::new(format!(
                "Failed to write '{}'. Check disk space and permissions.",
                path.display()
            ))),
            Error::Directory { path, .. } => Some(Box::new(format!(
                "Could not reset '{}'. Check that no other process holds files in it.",
                path.display()
            ))),
            Error::Metadata { .. } => Some(Box::new(
                "package.json must contain a \"version\" field such as \"7.2.0\".",
            )),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your configuration file for syntax errors.\nError: {}",
                msg
            ))),
            Error::Stage { source, .. } => source.help(),
            Error::Io(_) => None,
        }
    }

    fn diagnostic_source(&self) -> Option<&dyn miette::Diagnostic> {
        match self {
            Error::Stage { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Diagnostic;

    #[test]
    fn stage_tag_keeps_inner_code_and_help() {
        let err = Error::Subprocess {
            program: "uglifyjs".into(),
            reason: "exited with status 1".into(),
        }
        .in_stage(Stage::Minify, "dist/pouchdb.min.js");

        assert_eq!(err.code().map(|c| c.to_string()).as_deref(), Some("SUBPROCESS_ERROR"));
        assert!(err.help().is_some());
        assert!(err.to_string().contains("minify stage failed for dist/pouchdb.min.js"));
        assert!(matches!(err.root(), Error::Subprocess { .. }));
    }

    #[test]
    fn innermost_stage_wins() {
        let err = Error::InvalidConfig("bad".into())
            .in_stage(Stage::Link, "lib/index.js")
            .in_stage(Stage::Write, "somewhere-else");

        match err {
            Error::Stage { stage, target, .. } => {
                assert_eq!(stage, Stage::Link);
                assert_eq!(target, "lib/index.js");
            }
            other => panic!("expected stage error, got {other:?}"),
        }
    }
}
