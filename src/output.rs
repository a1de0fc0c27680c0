//! # Terminal Output
//!
//! Controls how the `gam` binary renders unit outcomes: colored emoji
//! markers on capable terminals, bracketed plain-text markers everywhere
//! else (pipes, CI logs, `NO_COLOR`).
//!
//! Color is decided once from the `--color` flag and the environment:
//! - `--color=never|always|auto`
//! - `NO_COLOR` disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` disables colors
//! - `CLICOLOR_FORCE=1` forces colors even in non-TTY
//! - `TERM=dumb` disables colors
//!
//! ```rust,ignore
//! use gam::output::{Marker, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{}", out.line(Marker::Ok, "api: default built"));
//! ```

use std::env;

use console::style;

/// Output configuration for controlling colors and emojis.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Whether colors and emojis should be used in output.
    pub use_color: bool,
}

/// Kind of status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Ok,
    Err,
    Warn,
    Info,
}

impl Marker {
    fn emoji(self) -> &'static str {
        match self {
            Marker::Ok => "✅",
            Marker::Err => "❌",
            Marker::Warn => "⚠️",
            Marker::Info => "📦",
        }
    }

    fn plain(self) -> &'static str {
        match self {
            Marker::Ok => "[OK]",
            Marker::Err => "[ERR]",
            Marker::Warn => "[WARN]",
            Marker::Info => "[INFO]",
        }
    }
}

impl OutputConfig {
    /// Create an output configuration from environment and CLI flag.
    ///
    /// `color_flag` is the value of `--color`: "always", "never" or "auto".
    /// Anything unrecognised is treated as "auto".
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };

        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // presence alone disables, even when empty
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

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// The marker prefix for a status line.
    pub fn marker(&self, marker: Marker) -> String {
        if !self.use_color {
            return marker.plain().to_string();
        }
        let emoji = marker.emoji();
        match marker {
            Marker::Ok => style(emoji).green().to_string(),
            Marker::Err => style(emoji).red().to_string(),
            Marker::Warn => style(emoji).yellow().to_string(),
            Marker::Info => emoji.to_string(),
        }
    }

    /// A full status line: marker, space, text.
    pub fn line(&self, marker: Marker, text: &str) -> String {
        format!("{} {}", self.marker(marker), text)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}
