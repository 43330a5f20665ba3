//! Shared test utilities for pouch-cli tests
//!
//! A temp repository checkout with the PouchDB package under
//! `packages/node_modules/pouchdb` and an externals list under `bin/`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub const VERSION: &str = "7.2.0";
pub const PACKAGE: &str = "packages/node_modules/pouchdb";
/// Body of the installed `bar-dep`; never inlined while it is external.
pub const BAR_DEP_BODY: &str = "bar-dep body must stay external";

pub struct Checkout {
    pub dir: TempDir,
}

impl Checkout {
    pub fn new() -> Self {
        let checkout = Self {
            dir: TempDir::new().expect("temp dir"),
        };
        checkout.write(
            &format!("{PACKAGE}/package.json"),
            &format!(
                r#"{{"name":"pouchdb","version":"{VERSION}","dependencies":{{"bar-dep":"1.0.0","baz-dep":"2.0.0"}}}}"#
            ),
        );
        checkout.write(
            &format!("{PACKAGE}/src/index.js"),
            "var bar = require('bar-dep');\n\
             var greet = require('./greet');\n\
             function Foo() {\n  return greet(bar);\n}\n\
             Foo.version = '__VERSION__';\n\
             module.exports = Foo;\n",
        );
        checkout.write(
            &format!("{PACKAGE}/src/greet.js"),
            "module.exports = function greet(name) {\n  return 'hello ' + name;\n};\n",
        );
        checkout.write(
            &format!("{PACKAGE}/src/next.js"),
            "module.exports = function Next() {\n  return 'next';\n};\n",
        );
        checkout.write(
            &format!("{PACKAGE}/node_modules/bar-dep/package.json"),
            r#"{"name":"bar-dep","version":"1.0.0","main":"index.js"}"#,
        );
        checkout.write(
            &format!("{PACKAGE}/node_modules/bar-dep/index.js"),
            &format!("module.exports = '{BAR_DEP_BODY}';\n"),
        );
        checkout.write("bin/external-deps.json", r#"["bar-dep"]"#);
        checkout
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Path inside the package.
    pub fn package_path(&self, rel: &str) -> PathBuf {
        self.root().join(PACKAGE).join(rel)
    }

    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write fixture");
    }

    pub fn read_package(&self, rel: &str) -> String {
        std::fs::read_to_string(self.package_path(rel))
            .unwrap_or_else(|e| panic!("failed to read {rel}: {e}"))
    }
}
