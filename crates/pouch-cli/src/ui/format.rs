//! Formatting for sizes, durations and the build summary.

use std::path::Path;
use std::time::Duration;

use console::Term;
use owo_colors::OwoColorize;
use pouch_bundler::BuildReport;

use super::colors_enabled;

/// Human-readable size with binary units.
///
/// ```
/// use pouch_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.2} {}", UNITS[unit])
    }
}

/// Human-readable duration: milliseconds, seconds, then minutes.
///
/// ```
/// use std::time::Duration;
/// use pouch_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

/// `(path relative to root, formatted size)` for every artifact in the report.
pub fn summary_rows(report: &BuildReport, root: &Path) -> Vec<(String, String)> {
    report
        .artifacts
        .iter()
        .map(|artifact| {
            let rel = artifact.path.strip_prefix(root).unwrap_or(&artifact.path);
            (rel.display().to_string(), format_size(artifact.bytes))
        })
        .collect()
}

/// Print the artifact table to stderr.
pub fn print_build_summary(report: &BuildReport, root: &Path) {
    let rows = summary_rows(report, root);
    let width = (Term::stderr().size().1 as usize).min(60);
    let name_width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let rule = "─".repeat(width);
    let total = format_size(report.total_bytes());
    let elapsed = format_duration(report.elapsed);

    if colors_enabled() {
        eprintln!("\n{} {}", "Build Summary".bold().underline(), report.version.dimmed());
        eprintln!("{rule}");
        for (name, size) in &rows {
            eprintln!(
                "  {} {:<name_width$}  {}",
                "▸".blue(),
                name.bright_white().bold(),
                size.dimmed()
            );
        }
        eprintln!("{rule}");
        eprintln!("  {} {} in {}", "Total:".bold(), total.green(), elapsed.green());
    } else {
        eprintln!("\nBuild Summary {}", report.version);
        eprintln!("{rule}");
        for (name, size) in &rows {
            eprintln!("  ▸ {name:<name_width$}  {size}");
        }
        eprintln!("{rule}");
        eprintln!("  Total: {total} in {elapsed}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pouch_bundler::{BuildMode, WrittenArtifact};
    use std::path::PathBuf;

    fn report() -> BuildReport {
        BuildReport {
            mode: BuildMode::FullRelease,
            version: "7.2.0".to_string(),
            artifacts: vec![
                WrittenArtifact {
                    path: PathBuf::from("/pkg/lib/index.js"),
                    bytes: 2048,
                },
                WrittenArtifact {
                    path: PathBuf::from("/pkg/dist/pouchdb.min.js"),
                    bytes: 512,
                },
            ],
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1024), "1.00 KB");
        assert_eq!(format_size(1_572_864), "1.50 MB");
        assert_eq!(format_size(2_147_483_648), "2.00 GB");
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::ZERO), "0ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn rows_are_relative_to_the_package() {
        let rows = summary_rows(&report(), Path::new("/pkg"));
        assert_eq!(
            rows,
            vec![
                ("lib/index.js".to_string(), "2.00 KB".to_string()),
                ("dist/pouchdb.min.js".to_string(), "512 B".to_string()),
            ]
        );
    }

    #[test]
    fn print_does_not_panic() {
        print_build_summary(&report(), Path::new("/pkg"));
        let empty = BuildReport {
            artifacts: Vec::new(),
            ..report()
        };
        print_build_summary(&empty, Path::new("/pkg"));
    }
}
