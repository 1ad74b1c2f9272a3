//! Progress indicators using indicatif

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for a backend round-trip.
#[must_use]
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Hidden bar used when progress output is disabled.
#[must_use]
pub fn hidden() -> ProgressBar {
    ProgressBar::hidden()
}

/// Clear a spinner after a failure; the error is reported separately.
pub fn finish_error(pb: &ProgressBar) {
    pb.finish_and_clear();
}
