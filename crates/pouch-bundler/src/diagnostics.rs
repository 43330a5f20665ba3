//! Classification of Rolldown failures.
//!
//! Rolldown reports batched diagnostics whose concrete types move between
//! releases, so we work from the debug rendering and sort each failure into a
//! resolution problem or a transform problem.

use std::fmt::Debug;
use std::path::Path;

use crate::Error;

/// Broad category of a bundling failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnresolvedImport,
    UnresolvedEntry,
    ParseError,
    Other,
}

impl DiagnosticKind {
    pub fn classify(text: &str) -> Self {
        if text.contains("UnresolvedEntry") || text.contains("UNRESOLVED_ENTRY") {
            DiagnosticKind::UnresolvedEntry
        } else if text.contains("UnresolvedImport")
            || text.contains("UNRESOLVED_IMPORT")
            || text.contains("Could not resolve")
            || text.contains("Cannot resolve")
        {
            DiagnosticKind::UnresolvedImport
        } else if text.contains("Parse error")
            || text.contains("PARSE_ERROR")
            || text.contains("Unexpected token")
        {
            DiagnosticKind::ParseError
        } else {
            DiagnosticKind::Other
        }
    }

    pub fn is_resolution(self) -> bool {
        matches!(
            self,
            DiagnosticKind::UnresolvedImport | DiagnosticKind::UnresolvedEntry
        )
    }
}

/// Turn a Rolldown error for `entry` into a crate error.
pub fn engine_error(entry: &Path, error: &dyn Debug) -> Error {
    let text = format!("{error:?}");
    let message = summarize(&text);

    if DiagnosticKind::classify(&text).is_resolution() {
        Error::Resolution {
            entry: entry.to_path_buf(),
            message,
        }
    } else {
        Error::Transform {
            file: entry.display().to_string(),
            message,
        }
    }
}

/// Prefer the human message Rolldown embeds over the whole debug dump.
fn summarize(text: &str) -> String {
    for marker in ["message: \"", "Could not resolve", "Cannot resolve"] {
        if let Some(pos) = text.find(marker) {
            let start = if marker.ends_with('"') {
                pos + marker.len()
            } else {
                pos
            };
            let rest = &text[start..];
            let end = rest.find(['"', '\\', '\n']).unwrap_or(rest.len());
            let summary = rest[..end].trim();
            if !summary.is_empty() {
                return summary.to_string();
            }
        }
    }
    text.trim().to_string()
}
