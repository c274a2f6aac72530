//! Terminal styling and color utilities.
//!
//! This module provides ANSI escape code definitions and color detection
//! for terminal output. Colors follow one convention throughout the CLI:
//! cyan for progress, green for success, yellow for empty results and
//! warnings, red for failures.

/// ANSI escape codes for text styling and colors.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";

    /// Cyan for progress lines and section headers.
    pub const CYAN: &str = "\x1b[36m";
    /// Green for successful operations.
    pub const GREEN: &str = "\x1b[32m";
    /// Yellow for empty listings and hints.
    pub const YELLOW: &str = "\x1b[33m";
    /// Red for failures.
    pub const RED: &str = "\x1b[31m";
    /// Gray for secondary details (ids, status text).
    pub const GRAY: &str = "\x1b[90m";
    /// Bright bold white for names.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
}

/// A collection of resolved color codes, either actual ANSI sequences
/// or empty strings when color is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPalette {
    pub reset: &'static str,
    pub cyan: &'static str,
    pub green: &'static str,
    pub yellow: &'static str,
    pub red: &'static str,
    pub gray: &'static str,
    pub white_bold: &'static str,
}

impl ColorPalette {
    /// Create a palette with actual ANSI color codes.
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            reset: colors::RESET,
            cyan: colors::CYAN,
            green: colors::GREEN,
            yellow: colors::YELLOW,
            red: colors::RED,
            gray: colors::GRAY,
            white_bold: colors::WHITE_BOLD,
        }
    }

    /// Create a palette with no colors (empty strings).
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            reset: "",
            cyan: "",
            green: "",
            yellow: "",
            red: "",
            gray: "",
            white_bold: "",
        }
    }

    /// Create a palette based on terminal capabilities.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::detect()
    }
}

/// Check if the terminal supports ANSI color codes.
///
/// This function respects:
/// - The `NO_COLOR` environment variable (https://no-color.org/)
/// - The `TERM=dumb` convention for non-capable terminals
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}

/// Format a byte count using decimal units, the way the engine's own CLI does.
///
/// # Examples
///
/// ```
/// # use dockerpkg_cli::terminal::format_size;
/// assert_eq!(format_size(999), "999B");
/// assert_eq!(format_size(187_600_000), "187.6MB");
/// ```
#[must_use]
pub fn format_size(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
    let bytes = bytes.max(0) as f64;
    if bytes < 1000.0 {
        return format!("{}B", bytes as u64);
    }
    let mut value = bytes;
    let mut unit = 0;
    while value >= 1000.0 && unit + 1 < UNITS.len() {
        value /= 1000.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}
