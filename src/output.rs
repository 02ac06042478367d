//! # Output Configuration
//!
//! Controls how the `envcompose` binary decorates its reports: status
//! markers and colored environment, feature and task names.
//!
//! The `--color` flag (`always`, `never`, `auto`) decides. In `auto` mode,
//! decoration is off when `NO_COLOR` is set, when `CLICOLOR=0`, when
//! `TERM=dumb`, or when stdout is not a terminal (unless `CLICOLOR_FORCE`
//! is set).

use console::style;
use std::env;

/// Output configuration for the report commands.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    /// Status marker for a successful step: `✅` or `[OK]`.
    pub fn ok(&self) -> &'static str {
        if self.use_color {
            "✅"
        } else {
            "[OK]"
        }
    }

    /// Status marker for a failed step: `❌` or `[ERR]`.
    pub fn err(&self) -> &'static str {
        if self.use_color {
            "❌"
        } else {
            "[ERR]"
        }
    }

    /// Status marker for a warning: `⚠️` or `[WARN]`.
    pub fn warn(&self) -> &'static str {
        if self.use_color {
            "⚠️"
        } else {
            "[WARN]"
        }
    }

    /// Renders a name (environment, feature, task) in bold cyan when
    /// decoration is on.
    pub fn name(&self, text: &str) -> String {
        if self.use_color {
            style(text).cyan().bold().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }

    /// Renders secondary information dimmed when decoration is on.
    pub fn dim(&self, text: &str) -> String {
        if self.use_color {
            style(text).dim().force_styling(true).to_string()
        } else {
            text.to_string()
        }
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
