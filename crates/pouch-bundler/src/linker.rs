//! Module-graph linking: one entry file in, one flat CommonJS module out.
//!
//! Every name in the [`ExternalSet`] stays a `require()` call; everything else
//! reachable from the entry is inlined. The browser flag only changes which
//! package fields and export conditions win during resolution.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use rolldown::{BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, OutputFormat};
use tracing::{debug, info};

use crate::externals::ExternalSet;
use crate::mode::BuildMode;
use crate::output::{AtomicWriter, WrittenArtifact};
use crate::resolution::{base_options, display_entry, entry_chunk_code};
use crate::stages::Stage;
use crate::version::VersionInjector;
use crate::{Result, diagnostics};

/// What a link engine is asked to do.
#[derive(Debug, Clone, Copy)]
pub struct LinkRequest<'a> {
    pub entry: &'a Path,
    /// Directory resolution starts from.
    pub cwd: &'a Path,
    pub externals: &'a ExternalSet,
    pub browser: bool,
}

/// Produces CommonJS code for an entry; never touches the filesystem output.
#[async_trait]
pub trait LinkEngine: Send + Sync {
    async fn link(&self, request: LinkRequest<'_>) -> Result<String>;
}

/// Rolldown in CommonJS mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct RolldownLinker;

#[async_trait]
impl LinkEngine for RolldownLinker {
    async fn link(&self, request: LinkRequest<'_>) -> Result<String> {
        let options = BundlerOptions {
            format: Some(OutputFormat::Cjs),
            ..base_options(request.entry, request.cwd, request.externals, request.browser)
        };

        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(options)
            .build()
            .map_err(|e| diagnostics::engine_error(request.entry, &e))?;

        let output = bundler
            .generate()
            .await
            .map_err(|e| diagnostics::engine_error(request.entry, &e))?;

        entry_chunk_code(output, request.entry)
    }
}

/// Links an entry, stamps the version into it and writes it atomically.
pub struct ModuleGraphLinker {
    engine: Arc<dyn LinkEngine>,
    externals: ExternalSet,
    injector: VersionInjector,
    writer: AtomicWriter,
    mode: BuildMode,
}

impl ModuleGraphLinker {
    pub fn new(
        engine: Arc<dyn LinkEngine>,
        externals: ExternalSet,
        injector: VersionInjector,
        writer: AtomicWriter,
        mode: BuildMode,
    ) -> Self {
        Self {
            engine,
            externals,
            injector,
            writer,
            mode,
        }
    }

    pub async fn link(
        &self,
        entry: &Path,
        output: &Path,
        optimize_for_browser: bool,
    ) -> Result<WrittenArtifact> {
        let started = Instant::now();
        debug!(
            entry = %entry.display(),
            browser = optimize_for_browser,
            "linking"
        );

        let code = self
            .engine
            .link(LinkRequest {
                entry,
                cwd: self.writer.root(),
                externals: &self.externals,
                browser: optimize_for_browser,
            })
            .await?;
        let code = self.injector.inject(&code);

        if self.mode.is_development() {
            info!(
                "took {} ms to link {}",
                started.elapsed().as_millis(),
                display_entry(entry, self.writer.root()).display()
            );
        }

        self.writer.write(output, code).await.map_err(|e| {
            e.in_stage(
                Stage::Write,
                self.writer.relative(output).display().to_string(),
            )
        })
    }
}

impl std::fmt::Debug for ModuleGraphLinker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraphLinker")
            .field("externals", &self.externals)
            .field("version", &self.injector.version())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
