//! Terminal output: status lines and the build summary.
//!
//! Everything goes to stderr; stdout only carries the final
//! `build-pouchdb complete` line.
//!
//! ```no_run
//! use pouch_cli::ui;
//!
//! ui::init_colors(false);
//! ui::info("Building PouchDB (release)");
//! ui::success("Built 5 artifacts in 1.20s");
//! ```

mod format;
mod messages;

use std::sync::atomic::{AtomicBool, Ordering};

pub use format::{format_duration, format_size, print_build_summary, summary_rows};
pub use messages::{error, info, success, warning};

static COLORS: AtomicBool = AtomicBool::new(false);

/// `NO_COLOR` wins, then `FORCE_COLOR`, then terminal detection on stderr.
pub fn should_use_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::user_attended_stderr()
}

/// Decide once whether status lines are colored. Call early in `main`.
pub fn init_colors(no_color: bool) {
    COLORS.store(!no_color && should_use_color(), Ordering::Relaxed);
}

pub(crate) fn colors_enabled() -> bool {
    COLORS.load(Ordering::Relaxed)
}
