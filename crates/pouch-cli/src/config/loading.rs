use crate::cli::Cli;
use crate::commands::utils::resolve_path;
use crate::config::BuildConfig;
use crate::error::{ConfigError, Result};
use figment::{
    Figment,
    providers::{Env, Format as _, Json, Serialized},
};
use std::path::Path;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "pouch-build.json";

/// Prefix of the environment layer (`POUCH_BUILD_GLOBAL_NAME`, ...).
pub const ENV_PREFIX: &str = "POUCH_BUILD_";

impl BuildConfig {
    /// Load configuration from every layer.
    /// Priority: CLI args > environment variables > config file > defaults
    pub fn load(args: &Cli, cwd: &Path) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match &args.config {
            Some(path) => {
                let path = resolve_path(path, cwd);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = cwd.join(CONFIG_FILE);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(env_provider());

        if let Some(root) = &args.package_root {
            figment = figment.merge(Serialized::default("packageRoot", root));
        }

        let mut config: Self = figment
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.cwd = cwd.to_path_buf();
        Ok(config)
    }
}

/// `POUCH_BUILD_GLOBAL_NAME` -> `globalName`, `POUCH_BUILD_MINIFIER__PROGRAM`
/// -> `minifier.program`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX)
        .lowercase(false)
        .map(|key| env_key_to_field(key.as_str()).into())
}

fn env_key_to_field(key: &str) -> String {
    key.split("__")
        .map(|segment| {
            let mut out = String::with_capacity(segment.len());
            let mut upper_next = false;
            for c in segment.chars() {
                if c == '_' {
                    upper_next = !out.is_empty();
                } else if upper_next {
                    out.push(c.to_ascii_uppercase());
                    upper_next = false;
                } else {
                    out.push(c.to_ascii_lowercase());
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn cli() -> Cli {
        Cli::default()
    }

    #[test]
    fn env_keys_map_to_camel_case_fields() {
        assert_eq!(env_key_to_field("GLOBAL_NAME"), "globalName");
        assert_eq!(env_key_to_field("PACKAGE_ROOT"), "packageRoot");
        assert_eq!(env_key_to_field("PLACEHOLDER"), "placeholder");
        assert_eq!(env_key_to_field("MINIFIER__PROGRAM"), "minifier.program");
        assert_eq!(
            env_key_to_field("TARGETS__NEXT_OUTPUT"),
            "targets.nextOutput"
        );
    }

    #[test]
    #[serial]
    fn defaults_without_any_layer() {
        let temp = TempDir::new().unwrap();
        let config = BuildConfig::load(&cli(), temp.path()).unwrap();

        assert_eq!(
            config.package_root,
            PathBuf::from("packages/node_modules/pouchdb")
        );
        assert_eq!(config.global_name, "PouchDB");
        assert_eq!(config.placeholder, "__VERSION__");
        assert_eq!(config.minifier.program, "uglifyjs");
        assert_eq!(config.downlevel_target, "es2015");
        assert!(config.externals.is_none());
        assert_eq!(config.cwd, temp.path());
    }

    #[test]
    #[serial]
    fn config_file_in_cwd_is_picked_up() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            r#"{
                "packageRoot": "pkg",
                "externals": ["vuvuzela", "spark-md5"],
                "license": { "since": 2013 },
                "targets": { "nextOutput": "dist/next.js" }
            }"#,
        )
        .unwrap();

        let config = BuildConfig::load(&cli(), temp.path()).unwrap();
        assert_eq!(config.package_root, PathBuf::from("pkg"));
        assert_eq!(
            config.externals.as_deref(),
            Some(&["vuvuzela".to_string(), "spark-md5".to_string()][..])
        );
        assert_eq!(config.license.since, 2013);
        assert_eq!(config.license.product, "PouchDB");
        assert_eq!(config.targets.next_output, PathBuf::from("dist/next.js"));
        assert_eq!(config.targets.node_output, PathBuf::from("lib/index.js"));
    }

    #[test]
    #[serial]
    fn explicit_config_must_exist() {
        let temp = TempDir::new().unwrap();
        let args = Cli {
            config: Some(PathBuf::from("missing.json")),
            ..Cli::default()
        };
        let err = BuildConfig::load(&args, temp.path()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::CliError::Config(ConfigError::NotFound(_))
        ));
    }

    #[test]
    #[serial]
    fn unknown_fields_are_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), r#"{ "entry": "x" }"#).unwrap();
        let err = BuildConfig::load(&cli(), temp.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"), "{err}");
    }

    #[test]
    #[serial]
    fn env_overrides_file_and_cli_overrides_env() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE),
            r#"{ "globalName": "FromFile", "packageRoot": "from-file" }"#,
        )
        .unwrap();

        unsafe {
            std::env::set_var("POUCH_BUILD_GLOBAL_NAME", "FromEnv");
            std::env::set_var("POUCH_BUILD_PACKAGE_ROOT", "from-env");
            std::env::set_var("POUCH_BUILD_MINIFIER__PROGRAM", "terser");
        }

        let args = Cli {
            package_root: Some(PathBuf::from("from-cli")),
            ..Cli::default()
        };
        let result = BuildConfig::load(&args, temp.path());

        unsafe {
            std::env::remove_var("POUCH_BUILD_GLOBAL_NAME");
            std::env::remove_var("POUCH_BUILD_PACKAGE_ROOT");
            std::env::remove_var("POUCH_BUILD_MINIFIER__PROGRAM");
        }

        let config = result.unwrap();
        assert_eq!(config.global_name, "FromEnv");
        assert_eq!(config.minifier.program, "terser");
        assert_eq!(config.minifier.args, vec!["-c", "-m"]);
        assert_eq!(config.package_root, PathBuf::from("from-cli"));
    }
}
