//! Shared test utilities for pouch-bundler tests
//!
//! Counting fakes for every engine seam plus a PouchDB-shaped temp project.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use pouch_bundler::{
    BuildMode, BundleEngine, BundleRequest, BundleSession, Error, ExternalSet, LinkEngine,
    LinkRequest, Minify, Pipeline, PipelineOptions, Result,
};
use tempfile::TempDir;

pub const VERSION: &str = "7.2.0";

/// Temp project laid out like the PouchDB package.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        let project = Self { dir };
        project.write(
            "package.json",
            &format!(r#"{{"name":"pouchdb","version":"{VERSION}","dependencies":{{"bar-dep":"1.0.0"}}}}"#),
        );
        project.write(
            "src/index.js",
            "var bar = require('bar-dep');\nfunction Foo() { return bar; }\nFoo.version = '__VERSION__';\nmodule.exports = Foo;\n",
        );
        project.write("src/next.js", "module.exports = { next: true };\n");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write fixture");
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel))
            .unwrap_or_else(|e| panic!("failed to read {rel}: {e}"))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    pub fn options(&self) -> PipelineOptions {
        PipelineOptions::new(self.root(), VERSION).externals(ExternalSet::new(["bar-dep"]))
    }
}

/// Echoes the entry file with a marker instead of linking.
#[derive(Default)]
pub struct FakeLinker {
    pub requests: Mutex<Vec<(PathBuf, bool)>>,
}

impl FakeLinker {
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LinkEngine for FakeLinker {
    async fn link(&self, request: LinkRequest<'_>) -> Result<String> {
        self.requests
            .lock()
            .push((request.entry.to_path_buf(), request.browser));
        let source = tokio::fs::read_to_string(request.entry)
            .await
            .map_err(|e| Error::Resolution {
                entry: request.entry.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(format!(
            "/* linked browser={} externals={} */\n{}",
            request.browser,
            request.externals.names().join(","),
            source
        ))
    }
}

/// Fails every browser link.
#[derive(Default)]
pub struct BrowserFailingLinker {
    inner: FakeLinker,
}

#[async_trait]
impl LinkEngine for BrowserFailingLinker {
    async fn link(&self, request: LinkRequest<'_>) -> Result<String> {
        if request.browser {
            return Err(Error::Resolution {
                entry: request.entry.to_path_buf(),
                message: "Could not resolve 'browser-only-dep'".to_string(),
            });
        }
        self.inner.link(request).await
    }
}

/// Opens sessions that wrap the entry file in an IIFE on every call.
#[derive(Default)]
pub struct FakePackager {
    pub opened: AtomicUsize,
    pub bundles: Arc<AtomicUsize>,
}

impl FakePackager {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn bundles(&self) -> usize {
        self.bundles.load(Ordering::SeqCst)
    }
}

impl BundleEngine for FakePackager {
    fn open(&self, request: BundleRequest<'_>) -> Result<Box<dyn BundleSession>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            entry: request.entry.to_path_buf(),
            global: request.global_name.unwrap_or("").to_string(),
            bundles: Arc::clone(&self.bundles),
        }))
    }
}

struct FakeSession {
    entry: PathBuf,
    global: String,
    bundles: Arc<AtomicUsize>,
}

#[async_trait]
impl BundleSession for FakeSession {
    async fn bundle(&mut self) -> Result<String> {
        self.bundles.fetch_add(1, Ordering::SeqCst);
        let source = tokio::fs::read_to_string(&self.entry)
            .await
            .map_err(|e| Error::Resolution {
                entry: self.entry.clone(),
                message: e.to_string(),
            })?;
        Ok(format!(
            "(function (global) {{\n    global.{} = (function () {{\n        {}\n    }})();\n}})(this);\n",
            self.global,
            source.trim()
        ))
    }
}

/// Collapses whitespace runs and counts calls.
#[derive(Default)]
pub struct FakeMinifier {
    pub calls: AtomicUsize,
}

impl FakeMinifier {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Minify for FakeMinifier {
    async fn minify(&self, code: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(code.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

pub struct FailingMinifier;

#[async_trait]
impl Minify for FailingMinifier {
    async fn minify(&self, _code: &str) -> Result<String> {
        Err(Error::Subprocess {
            program: "uglifyjs".to_string(),
            reason: "exited with exit status: 1".to_string(),
        })
    }
}

/// The fakes a pipeline was wired with.
pub struct Fakes {
    pub linker: Arc<FakeLinker>,
    pub packager: Arc<FakePackager>,
    pub minifier: Arc<FakeMinifier>,
}

/// A pipeline over `project` with counting fakes and no post-processing passes.
pub fn fake_pipeline(project: &Project, mode: BuildMode) -> (Pipeline, Fakes) {
    let fakes = Fakes {
        linker: Arc::new(FakeLinker::default()),
        packager: Arc::new(FakePackager::default()),
        minifier: Arc::new(FakeMinifier::default()),
    };
    let pipeline = Pipeline::new(project.options(), mode)
        .with_link_engine(fakes.linker.clone())
        .with_bundle_engine(fakes.packager.clone())
        .with_minifier(fakes.minifier.clone())
        .with_transforms(Vec::new());
    (pipeline, fakes)
}
