//! Command-line interface definition for build-pouchdb.
//!
//! There are no positional arguments and no subcommands: what gets built is
//! decided by `BUILD_NODE` and `CLIENT`, where the package lives by the
//! configuration layers.

use std::path::PathBuf;

use clap::Parser;

/// Build the PouchDB package: server module, browser module, standalone bundles
#[derive(Parser, Debug, Default)]
#[command(
    name = "build-pouchdb",
    version,
    about = "Build the PouchDB package for node, bundlers and browsers",
    long_about = "Builds lib/index.js, lib/index-browser.js and the dist/ bundles of the PouchDB package.\n\n\
                  Modes are chosen from the environment:\n  \
                  BUILD_NODE=1  only lib/index.js\n  \
                  CLIENT=dev    development build, no minifier, no directory reset\n  \
                  (neither)     full release build"
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Config file (default: pouch-build.json in the working directory)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory relative paths are resolved against
    #[arg(short = 'C', long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Package root, overriding every config layer
    #[arg(long, value_name = "DIR")]
    pub package_root: Option<PathBuf>,
}
