//! build-pouchdb - builds the PouchDB package for every consumer at once.
//!
//! This crate wraps [`pouch_bundler`] with configuration loading, logging and
//! terminal output. The binary reads the build mode from `BUILD_NODE` and
//! `CLIENT`; parent build drivers can skip the process boundary and call
//! [`do_build`] directly.
//!
//! - [`error`] - CLI error types and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - status lines and the build summary
//! - [`config`] - `pouch-build.json` / `POUCH_BUILD_*` loading and validation
//! - [`commands`] - the build command
//!
//! # Example
//!
//! ```rust,no_run
//! use pouch_cli::{BuildConfig, BuildMode, do_build};
//!
//! # async fn run() -> pouch_cli::Result<()> {
//! let config = BuildConfig::default();
//! let report = do_build(&config, BuildMode::NodeOnly).await?;
//! assert_eq!(report.artifacts.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use commands::{do_build, do_build_with_cache};
pub use config::BuildConfig;
pub use error::{CliError, ConfigError, Result, ResultExt};
pub use pouch_bundler::{BuildMode, BuildReport, BundlerCache};
