use crate::config::BuildConfig;
use crate::error::{ConfigError, Result};
use pouch_bundler::target::resolve_within;
use std::path::Path;

/// Validate that `name` is usable as a JavaScript global.
pub fn validate_global_name(name: &str) -> Result<()> {
    let Some(first) = name.chars().next() else {
        return Err(ConfigError::InvalidValue {
            field: "globalName".to_string(),
            value: String::new(),
            hint: "Global name cannot be empty".to_string(),
        }
        .into());
    };

    if !first.is_alphabetic() && first != '_' && first != '$' {
        return Err(ConfigError::InvalidValue {
            field: "globalName".to_string(),
            value: name.to_string(),
            hint: format!("Must start with letter, underscore, or dollar sign (got '{first}')"),
        }
        .into());
    }

    if let Some(c) = name
        .chars()
        .find(|c| !c.is_alphanumeric() && *c != '_' && *c != '$')
    {
        return Err(ConfigError::InvalidValue {
            field: "globalName".to_string(),
            value: name.to_string(),
            hint: format!("Invalid character '{c}' in identifier"),
        }
        .into());
    }

    Ok(())
}

impl BuildConfig {
    /// Validate configuration for logical consistency.
    ///
    /// Paths are checked lexically against a placeholder root; the package
    /// does not have to exist yet.
    pub fn validate(&self) -> Result<()> {
        validate_global_name(&self.global_name)?;

        if self.minifier.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "minifier.program".to_string(),
                value: self.minifier.program.clone(),
                hint: "Name a minifier that reads stdin and writes stdout, e.g. uglifyjs"
                    .to_string(),
            }
            .into());
        }

        if self.placeholder.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "placeholder".to_string(),
                value: String::new(),
                hint: "The version placeholder cannot be empty".to_string(),
            }
            .into());
        }

        if self.downlevel_target.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "downlevelTarget".to_string(),
                value: self.downlevel_target.clone(),
                hint: "Use an ECMAScript target such as es2015".to_string(),
            }
            .into());
        }

        let root = Path::new("/package-root");
        for output in self.targets.outputs() {
            if let Err(e) = resolve_within(root, output) {
                return Err(ConfigError::InvalidValue {
                    field: "targets".to_string(),
                    value: output.display().to_string(),
                    hint: format!("Outputs must stay inside the package root ({e})"),
                }
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn global_names() {
        assert!(validate_global_name("PouchDB").is_ok());
        assert!(validate_global_name("_pouch$").is_ok());
        assert!(validate_global_name("").is_err());
        assert!(validate_global_name("1pouch").is_err());
        assert!(validate_global_name("pouch-db").is_err());
    }

    #[test]
    fn defaults_are_valid() {
        BuildConfig::default().validate().unwrap();
    }

    #[test]
    fn empty_minifier_program() {
        let mut config = BuildConfig::default();
        config.minifier.program = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("minifier.program"));
    }

    #[test]
    fn outputs_must_stay_inside_the_package() {
        let mut config = BuildConfig::default();
        config.targets.standalone_output = PathBuf::from("../outside/pouchdb.js");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("../outside/pouchdb.js"), "{err}");

        let mut config = BuildConfig::default();
        config.targets.dist_dir = PathBuf::from("/tmp/dist");
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_placeholder() {
        let config = BuildConfig {
            placeholder: String::new(),
            ..BuildConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
