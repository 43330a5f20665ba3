//! Rolldown-backed whole-bundle sessions.

use std::path::PathBuf;

use async_trait::async_trait;
use rolldown::{
    Bundler, BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, ExperimentalOptions,
    OutputFormat, SourceMapType,
};

use super::{BundleEngine, BundleRequest, BundleSession};
use crate::resolution::{base_options, entry_chunk_code};
use crate::{Result, diagnostics};

/// Opens one UMD-producing Rolldown bundler per entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolldownPackager;

impl BundleEngine for RolldownPackager {
    fn open(&self, request: BundleRequest<'_>) -> Result<Box<dyn BundleSession>> {
        let options = BundlerOptions {
            format: Some(OutputFormat::Umd),
            name: request.global_name.map(str::to_string),
            sourcemap: request.mode.is_development().then_some(SourceMapType::Inline),
            experimental: Some(ExperimentalOptions {
                incremental_build: Some(true),
                ..Default::default()
            }),
            ..base_options(request.entry, request.cwd, request.externals, true)
        };

        let bundler = RolldownBundlerBuilder::default()
            .with_options(options)
            .build()
            .map_err(|e| diagnostics::engine_error(request.entry, &e))?;

        Ok(Box::new(RolldownSession {
            bundler,
            entry: request.entry.to_path_buf(),
        }))
    }
}

/// A live bundler; later calls go through its incremental build cache.
struct RolldownSession {
    bundler: Bundler,
    entry: PathBuf,
}

#[async_trait]
impl BundleSession for RolldownSession {
    async fn bundle(&mut self) -> Result<String> {
        let output = self
            .bundler
            .generate()
            .await
            .map_err(|e| diagnostics::engine_error(&self.entry, &e))?;
        entry_chunk_code(output, &self.entry)
    }
}
