//! Command implementations for build-pouchdb.
//!
//! There is a single command, [`build`]. Its [`execute`](build::execute) is
//! what the binary runs; [`do_build`](build::do_build) is the same build
//! without argument parsing or environment lookups, and
//! [`do_build_with_cache`](build::do_build_with_cache) keeps sessions alive
//! across calls.

pub mod build;
pub(crate) mod utils;

pub use build::{do_build, do_build_with_cache, execute};
