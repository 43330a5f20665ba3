//! Release-only post-processing passes over a finished bundle.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_codegen::Codegen;
use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{TransformOptions, Transformer};

use crate::{Error, Result};

/// A source-to-source pass applied to bundled code.
pub trait CodeTransform: Send + Sync {
    fn name(&self) -> &'static str;

    /// `file` only labels errors.
    fn apply(&self, code: &str, file: &str) -> Result<String>;
}

/// Lowers syntax newer than the configured ECMAScript target.
#[derive(Debug, Clone)]
pub struct EsDownlevel {
    target: String,
}

impl EsDownlevel {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl Default for EsDownlevel {
    fn default() -> Self {
        Self::new("es2015")
    }
}

impl CodeTransform for EsDownlevel {
    fn name(&self) -> &'static str {
        "downlevel"
    }

    fn apply(&self, code: &str, file: &str) -> Result<String> {
        let options = TransformOptions::from_target(&self.target).map_err(|message| {
            Error::InvalidConfig(format!(
                "unsupported downlevel target '{}': {}",
                self.target, message
            ))
        })?;

        let allocator = Allocator::default();
        let mut program = parse(&allocator, code, file)?;
        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();

        let ret = Transformer::new(&allocator, Path::new(file), &options)
            .build_with_scoping(scoping, &mut program);
        if !ret.errors.is_empty() {
            return Err(transform_error(file, "downlevel", &ret.errors));
        }

        Ok(Codegen::new().build(&program).code)
    }
}

/// Folds constant expressions and collapses redundant references without
/// renaming anything, so the output stays readable and globals stay intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceCollapse;

impl CodeTransform for ReferenceCollapse {
    fn name(&self) -> &'static str {
        "reference-collapse"
    }

    fn apply(&self, code: &str, file: &str) -> Result<String> {
        let allocator = Allocator::default();
        let mut program = parse(&allocator, code, file)?;

        let options = MinifierOptions {
            mangle: None,
            compress: Some(CompressOptions::default()),
            ..Default::default()
        };
        Minifier::new(options).minify(&allocator, &mut program);

        Ok(Codegen::new().build(&program).code)
    }
}

fn parse<'a>(allocator: &'a Allocator, code: &'a str, file: &str) -> Result<Program<'a>> {
    let ret = Parser::new(allocator, code, SourceType::cjs()).parse();
    if ret.panicked || !ret.errors.is_empty() {
        return Err(transform_error(file, "parse", &ret.errors));
    }
    Ok(ret.program)
}

fn transform_error(file: &str, pass: &str, errors: &[impl std::fmt::Debug]) -> Error {
    let messages: Vec<String> = errors.iter().map(|e| format!("{:?}", e)).collect();
    Error::Transform {
        file: file.to_string(),
        message: if messages.is_empty() {
            format!("{pass} failed")
        } else {
            format!("{pass} failed: {}", messages.join(", "))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downlevel_lowers_newer_syntax() {
        let code = "var a = {}; var b = a?.c ?? 1; module.exports = b;";
        let out = EsDownlevel::default().apply(code, "pouchdb.js").unwrap();
        assert!(!out.contains("?."));
        assert!(!out.contains("??"));
        assert!(out.contains("module.exports"));
    }

    #[test]
    fn downlevel_rejects_unknown_target() {
        let err = EsDownlevel::new("es1999").apply("var a = 1;", "pouchdb.js").unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn collapse_keeps_global_names() {
        let code = "(function (root) { var unused = 1 + 2; root.PouchDB = function PouchDB() {}; })(this);";
        let out = ReferenceCollapse.apply(code, "pouchdb.js").unwrap();
        assert!(out.contains("PouchDB"));
        assert!(out.contains("root") || out.contains("this"));
    }

    #[test]
    fn syntax_errors_are_transform_errors() {
        let err = ReferenceCollapse.apply("var = ;", "pouchdb.js").unwrap_err();
        match err {
            Error::Transform { file, message } => {
                assert_eq!(file, "pouchdb.js");
                assert!(message.starts_with("parse failed"));
            }
            other => panic!("expected transform error, got {other:?}"),
        }
    }
}
