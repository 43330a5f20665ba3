//! Version placeholder substitution and the license banner.

use std::sync::Arc;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

/// Token replaced by the package version in linked modules.
pub const VERSION_PLACEHOLDER: &str = "__VERSION__";

/// Replaces the version placeholder in generated code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInjector {
    version: Arc<str>,
    placeholder: Arc<str>,
}

impl VersionInjector {
    pub fn new(version: impl Into<Arc<str>>) -> Self {
        Self {
            version: version.into(),
            placeholder: Arc::from(VERSION_PLACEHOLDER),
        }
    }

    /// Use a different token. An empty token leaves code untouched.
    pub fn with_placeholder(mut self, placeholder: impl Into<Arc<str>>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Replace every occurrence of the placeholder.
    pub fn inject(&self, code: &str) -> String {
        if self.placeholder.is_empty() {
            return code.to_string();
        }
        code.replace(&*self.placeholder, &self.version)
    }
}

/// Comment banner prepended to the standalone bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct LicenseHeader {
    pub product: String,
    /// First year of the copyright range.
    pub since: i32,
    pub holder: String,
    pub license: String,
    pub homepage: String,
}

impl Default for LicenseHeader {
    fn default() -> Self {
        Self {
            product: "PouchDB".to_string(),
            since: 2012,
            holder: "Dale Harvey and the PouchDB team".to_string(),
            license: "the Apache license, version 2.0".to_string(),
            homepage: "http://pouchdb.com".to_string(),
        }
    }
}

impl LicenseHeader {
    /// Render the banner for `version` with the range ending at `year`.
    pub fn render(&self, version: &str, year: i32) -> String {
        format!(
            "// {product} {version}\n\
             // \n\
             // (c) {since}-{year} {holder}\n\
             // {product} may be freely distributed under {license}.\n\
             // For all details and documentation:\n\
             // {homepage}\n",
            product = self.product,
            since = self.since,
            holder = self.holder,
            license = self.license,
            homepage = self.homepage,
        )
    }

    /// Render with the current local year.
    pub fn render_current(&self, version: &str) -> String {
        self.render(version, chrono::Local::now().year())
    }
}
