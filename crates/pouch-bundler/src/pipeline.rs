//! The build pipeline: directory lifecycle, phase ordering and fan-out.
//!
//! ```text
//! NodeOnly     ensure lib/ ─▶ link server module
//! Development  ensure lib/ dist/ ─▶ link {server, browser} ─▶ {standalone, next}
//! FullRelease  reset  lib/ dist/ ─▶ link {server, browser} ─▶ {standalone ─▶ {full, minified}, next}
//! ```
//!
//! Braces are concurrent branches joined with [`join_stages`]; arrows are
//! strict ordering. The standalone bundle is built from the browser module,
//! so bundling waits for both links.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::externals::ExternalSet;
use crate::linker::{LinkEngine, ModuleGraphLinker, RolldownLinker};
use crate::minifier::{MinifierBridge, MinifierCommand, Minify, ProcessMinifier};
use crate::mode::BuildMode;
use crate::output::{AtomicWriter, BuildReport, WrittenArtifact};
use crate::packager::{
    BundleEngine, BundlerCache, CodeTransform, EsDownlevel, PackageOptions, ReferenceCollapse,
    RolldownPackager, WholeBundlePackager,
};
use crate::stages::{Stage, StageTask, join_stages};
use crate::target::{TargetDescriptor, TargetPaths, TargetSet};
use crate::version::{LicenseHeader, VERSION_PLACEHOLDER, VersionInjector};
use crate::{Error, Result};

/// Inputs of one build, fixed for the lifetime of a [`Pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub root: PathBuf,
    pub version: String,
    pub placeholder: String,
    pub externals: ExternalSet,
    pub license: LicenseHeader,
    pub global_name: String,
    pub targets: TargetPaths,
    pub minifier: MinifierCommand,
    pub downlevel_target: String,
}

impl PipelineOptions {
    pub fn new(root: impl Into<PathBuf>, version: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            version: version.into(),
            placeholder: VERSION_PLACEHOLDER.to_string(),
            externals: ExternalSet::default(),
            license: LicenseHeader::default(),
            global_name: "PouchDB".to_string(),
            targets: TargetPaths::default(),
            minifier: MinifierCommand::default(),
            downlevel_target: "es2015".to_string(),
        }
    }

    pub fn externals(mut self, externals: ExternalSet) -> Self {
        self.externals = externals;
        self
    }

    pub fn license(mut self, license: LicenseHeader) -> Self {
        self.license = license;
        self
    }

    pub fn targets(mut self, targets: TargetPaths) -> Self {
        self.targets = targets;
        self
    }

    pub fn global_name(mut self, name: impl Into<String>) -> Self {
        self.global_name = name.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn minifier(mut self, minifier: MinifierCommand) -> Self {
        self.minifier = minifier;
        self
    }

    pub fn downlevel_target(mut self, target: impl Into<String>) -> Self {
        self.downlevel_target = target.into();
        self
    }
}

/// Sequences linking, bundling, minification and writes for one package.
///
/// The pipeline owns the [`BundlerCache`]; calling [`Pipeline::run`] again on
/// the same value reuses every bundler session opened by earlier runs.
pub struct Pipeline {
    options: PipelineOptions,
    mode: BuildMode,
    cache: Arc<BundlerCache>,
    link_engine: Arc<dyn LinkEngine>,
    bundle_engine: Arc<dyn BundleEngine>,
    minify_engine: Arc<dyn Minify>,
    transforms: Vec<Arc<dyn CodeTransform>>,
}

impl Pipeline {
    pub fn new(options: PipelineOptions, mode: BuildMode) -> Self {
        let minify_engine = Arc::new(ProcessMinifier::new(options.minifier.clone()));
        let transforms: Vec<Arc<dyn CodeTransform>> = vec![
            Arc::new(EsDownlevel::new(options.downlevel_target.clone())),
            Arc::new(ReferenceCollapse),
        ];
        Self {
            options,
            mode,
            cache: Arc::new(BundlerCache::new()),
            link_engine: Arc::new(RolldownLinker),
            bundle_engine: Arc::new(RolldownPackager),
            minify_engine,
            transforms,
        }
    }

    /// Share a session cache with other pipelines, so repeated builds reuse
    /// the whole-bundle sessions opened by earlier ones.
    pub fn with_cache(mut self, cache: Arc<BundlerCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_link_engine(mut self, engine: Arc<dyn LinkEngine>) -> Self {
        self.link_engine = engine;
        self
    }

    pub fn with_bundle_engine(mut self, engine: Arc<dyn BundleEngine>) -> Self {
        self.bundle_engine = engine;
        self
    }

    pub fn with_minifier(mut self, engine: Arc<dyn Minify>) -> Self {
        self.minify_engine = engine;
        self
    }

    pub fn with_transforms(mut self, transforms: Vec<Arc<dyn CodeTransform>>) -> Self {
        self.transforms = transforms;
        self
    }

    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn cache(&self) -> &Arc<BundlerCache> {
        &self.cache
    }

    pub async fn run(&self) -> Result<BuildReport> {
        let started = Instant::now();
        let options = &self.options;
        let targets = TargetSet::resolve(
            &options.root,
            &options.targets,
            &options.externals,
            &options.global_name,
        )?;
        let writer = AtomicWriter::new(&targets.root);
        let linker = ModuleGraphLinker::new(
            Arc::clone(&self.link_engine),
            options.externals.clone(),
            VersionInjector::new(options.version.as_str())
                .with_placeholder(options.placeholder.as_str()),
            writer.clone(),
            self.mode,
        );

        info!(
            "building {} {} ({} mode)",
            options.license.product, options.version, self.mode
        );

        let mut artifacts = Vec::new();

        if !self.mode.builds_browser() {
            ensure_dir(&targets.lib_dir).await?;
            let node = &targets.node;
            let artifact = linker
                .link(&node.entry, &node.output, node.browser)
                .await
                .map_err(|e| e.in_stage(Stage::Link, node.name.as_str()))?;
            artifacts.push(artifact);
            return Ok(self.report(artifacts, started));
        }

        if self.mode.resets_output() {
            futures::try_join!(reset_dir(&targets.lib_dir), reset_dir(&targets.dist_dir))?;
        } else {
            futures::try_join!(ensure_dir(&targets.lib_dir), ensure_dir(&targets.dist_dir))?;
        }

        let linked = join_stages(vec![
            link_task(&linker, &targets.node),
            link_task(&linker, &targets.browser),
        ])
        .await?;
        artifacts.extend(linked);

        let packager = WholeBundlePackager::new(
            Arc::clone(&self.bundle_engine),
            Arc::clone(&self.cache),
            targets.root.clone(),
            self.mode,
        )
        .with_transforms(self.transforms.clone());
        let bridge = MinifierBridge::new(Arc::clone(&self.minify_engine), self.mode);
        let header = options.license.render_current(&options.version);

        let bundled = join_stages(vec![
            StageTask::new(
                Stage::Bundle,
                targets.standalone.name.clone(),
                self.standalone_branch(&packager, &bridge, &writer, &targets, &header),
            ),
            StageTask::new(
                Stage::Bundle,
                targets.next.name.clone(),
                self.secondary_branch(&packager, &writer, &targets.next),
            ),
        ])
        .await?;
        artifacts.extend(bundled.into_iter().flatten());

        Ok(self.report(artifacts, started))
    }

    /// Bundle the browser module, then write it and (release only) its
    /// minified twin concurrently.
    async fn standalone_branch(
        &self,
        packager: &WholeBundlePackager,
        bridge: &MinifierBridge,
        writer: &AtomicWriter,
        targets: &TargetSet,
        header: &str,
    ) -> Result<Vec<WrittenArtifact>> {
        let target = &targets.standalone;
        let code = packager
            .bundle(&target.entry, &package_options(target))
            .await?;
        let full = format!("{header}{code}");
        let minified_name = targets.relative(&targets.minified_output).display().to_string();

        let mut tasks = vec![StageTask::new(Stage::Write, target.name.clone(), async {
            writer.write(&target.output, &full).await.map(Some)
        })];

        if self.mode.runs_minifier() {
            let name = minified_name.clone();
            tasks.push(StageTask::new(Stage::Minify, minified_name, async move {
                let Some(minified) = bridge.minify(&code, header).await? else {
                    return Ok(None);
                };
                writer
                    .write(&targets.minified_output, minified)
                    .await
                    .map(Some)
                    .map_err(|e| e.in_stage(Stage::Write, name))
            }));
        }

        Ok(join_stages(tasks).await?.into_iter().flatten().collect())
    }

    /// The experimental bundle: built from source, no banner.
    async fn secondary_branch(
        &self,
        packager: &WholeBundlePackager,
        writer: &AtomicWriter,
        target: &TargetDescriptor,
    ) -> Result<Vec<WrittenArtifact>> {
        let code = packager
            .bundle(&target.entry, &package_options(target))
            .await?;
        let artifact = writer
            .write(&target.output, code)
            .await
            .map_err(|e| e.in_stage(Stage::Write, target.name.as_str()))?;
        Ok(vec![artifact])
    }

    fn report(&self, artifacts: Vec<WrittenArtifact>, started: Instant) -> BuildReport {
        let report = BuildReport {
            mode: self.mode,
            version: self.options.version.clone(),
            artifacts,
            elapsed: started.elapsed(),
        };
        debug!(
            artifacts = report.artifacts.len(),
            bytes = report.total_bytes(),
            sessions = self.cache.len(),
            "build finished"
        );
        report
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("mode", &self.mode)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

fn link_task<'a>(
    linker: &'a ModuleGraphLinker,
    target: &'a TargetDescriptor,
) -> StageTask<'a, WrittenArtifact> {
    StageTask::new(
        Stage::Link,
        target.name.clone(),
        linker.link(&target.entry, &target.output, target.browser),
    )
}

fn package_options(target: &TargetDescriptor) -> PackageOptions {
    PackageOptions {
        externals: target.externals.clone(),
        global_name: target.standalone.clone(),
    }
}

/// Remove `path` entirely, then recreate it empty.
async fn reset_dir(path: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(Error::Directory {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    debug!(dir = %path.display(), "reset output directory");
    ensure_dir(path).await
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| Error::Directory {
            path: path.to_path_buf(),
            source,
        })
}
