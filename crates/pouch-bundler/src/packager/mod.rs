//! Whole-bundle packaging: a linked module becomes a self-contained script
//! exposing one global.
//!
//! Bundler sessions are kept per entry path in a [`BundlerCache`] so repeated
//! builds in one process re-scan incrementally instead of starting cold. In
//! release builds the bundle then runs through the configured
//! [`CodeTransform`] passes; development builds skip them and carry an inline
//! source map instead.

mod cache;
mod session;
mod transforms;

pub use cache::{BundlerCache, SessionHandle};
pub use session::RolldownPackager;
pub use transforms::{CodeTransform, EsDownlevel, ReferenceCollapse};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::Result;
use crate::externals::ExternalSet;
use crate::mode::BuildMode;
use crate::resolution::display_entry;

/// Everything needed to open a session for one entry.
#[derive(Debug, Clone, Copy)]
pub struct BundleRequest<'a> {
    pub entry: &'a Path,
    pub cwd: &'a Path,
    pub externals: &'a ExternalSet,
    pub global_name: Option<&'a str>,
    pub mode: BuildMode,
}

/// Creates bundler sessions.
pub trait BundleEngine: Send + Sync {
    fn open(&self, request: BundleRequest<'_>) -> Result<Box<dyn BundleSession>>;
}

/// A stateful bundler bound to one entry.
#[async_trait]
pub trait BundleSession: Send {
    async fn bundle(&mut self) -> Result<String>;
}

/// Per-call packaging options.
///
/// They take effect when a session is opened; later calls for the same entry
/// reuse the session as it was opened.
#[derive(Debug, Clone, Default)]
pub struct PackageOptions {
    pub externals: ExternalSet,
    pub global_name: Option<String>,
}

impl PackageOptions {
    pub fn new(externals: ExternalSet) -> Self {
        Self {
            externals,
            global_name: None,
        }
    }

    pub fn global_name(mut self, name: impl Into<String>) -> Self {
        self.global_name = Some(name.into());
        self
    }
}

pub struct WholeBundlePackager {
    engine: Arc<dyn BundleEngine>,
    cache: Arc<BundlerCache>,
    transforms: Vec<Arc<dyn CodeTransform>>,
    root: PathBuf,
    mode: BuildMode,
}

impl WholeBundlePackager {
    /// Release transforms default to downleveling to ES2015 then collapsing.
    pub fn new(
        engine: Arc<dyn BundleEngine>,
        cache: Arc<BundlerCache>,
        root: impl Into<PathBuf>,
        mode: BuildMode,
    ) -> Self {
        Self {
            engine,
            cache,
            transforms: vec![Arc::new(EsDownlevel::default()), Arc::new(ReferenceCollapse)],
            root: root.into(),
            mode,
        }
    }

    /// Replace the release transform chain; passes run in order.
    pub fn with_transforms(mut self, transforms: Vec<Arc<dyn CodeTransform>>) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn cache(&self) -> &Arc<BundlerCache> {
        &self.cache
    }

    pub async fn bundle(&self, entry: &Path, options: &PackageOptions) -> Result<String> {
        let started = Instant::now();

        let session = self.cache.get_or_open(entry, || {
            self.engine.open(BundleRequest {
                entry,
                cwd: &self.root,
                externals: &options.externals,
                global_name: options.global_name.as_deref(),
                mode: self.mode,
            })
        })?;

        let mut code = {
            let mut session = session.lock().await;
            session.bundle().await?
        };

        if self.mode.is_release() {
            let file = display_entry(entry, &self.root).display().to_string();
            for transform in &self.transforms {
                debug!(pass = transform.name(), %file, "applying transform");
                code = transform.apply(&code, &file)?;
            }
        }

        if self.mode.is_development() {
            info!(
                "took {} ms to bundle {}",
                started.elapsed().as_millis(),
                display_entry(entry, &self.root).display()
            );
        }

        Ok(code)
    }
}

impl std::fmt::Debug for WholeBundlePackager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WholeBundlePackager")
            .field("cache", &self.cache)
            .field(
                "transforms",
                &self.transforms.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}
