//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

/// Centralized stylesheet for CLI output colors. `Default` is the plain,
/// uncoloured sheet used for `--no-color` and non-TTY output.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub info: Style,
    /// Secondary text: registry URLs, labels, field kinds
    pub dim: Style,
    pub bold: Style,
    /// Section titles
    pub header: Style,
    /// `[disabled]` markers on registries and model connections
    pub disabled: Style,
    /// Masked env values
    pub secret: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
        self.disabled = Style::new().yellow().dimmed();
        self.secret = Style::new().magenta().dimmed();
    }
}
