use std::path::PathBuf;

pub fn default_package_root() -> PathBuf {
    PathBuf::from("packages/node_modules/pouchdb")
}

pub fn default_externals_file() -> PathBuf {
    PathBuf::from("bin/external-deps.json")
}

pub fn default_placeholder() -> String {
    pouch_bundler::VERSION_PLACEHOLDER.to_string()
}

pub fn default_global_name() -> String {
    "PouchDB".to_string()
}

pub fn default_downlevel_target() -> String {
    "es2015".to_string()
}
