//! Build mode selection.

use std::fmt;

/// Set to any non-empty value to build only the server module.
pub const NODE_ONLY_VAR: &str = "BUILD_NODE";
/// `CLIENT=dev` selects the development loop.
pub const CLIENT_VAR: &str = "CLIENT";
pub const DEV_CLIENT: &str = "dev";

/// Which stages run and whether output directories are reset.
///
/// Computed once per invocation and passed down by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BuildMode {
    /// Only `lib/index.js`.
    NodeOnly,
    /// Everything except the minifier, no directory reset, inline source maps.
    Development,
    /// Clean rebuild of every artifact.
    #[default]
    FullRelease,
}

impl BuildMode {
    /// Read the mode from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve the mode through an arbitrary variable lookup.
    ///
    /// `BUILD_NODE` is checked first and wins over `CLIENT`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup(NODE_ONLY_VAR).is_some_and(|v| !v.is_empty()) {
            return BuildMode::NodeOnly;
        }
        match lookup(CLIENT_VAR).as_deref() {
            Some(DEV_CLIENT) => BuildMode::Development,
            _ => BuildMode::FullRelease,
        }
    }

    pub fn is_development(self) -> bool {
        self == BuildMode::Development
    }

    pub fn is_release(self) -> bool {
        self == BuildMode::FullRelease
    }

    /// Whether `lib/` and `dist/` are removed and recreated before building.
    pub fn resets_output(self) -> bool {
        self.is_release()
    }

    pub fn runs_minifier(self) -> bool {
        self.is_release()
    }

    /// Whether the browser module and the standalone bundles are produced.
    pub fn builds_browser(self) -> bool {
        self != BuildMode::NodeOnly
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BuildMode::NodeOnly => "node-only",
            BuildMode::Development => "development",
            BuildMode::FullRelease => "release",
        })
    }
}
