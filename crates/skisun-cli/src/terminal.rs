//! Terminal styling and color utilities.
//!
//! ANSI escape code definitions and color detection for text output. Colors
//! are dropped entirely when the terminal does not want them.

/// ANSI escape codes for text styling and colors.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";
    /// Bright bold white for run and lift names.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Gray for secondary details.
    pub const GRAY: &str = "\x1b[90m";
    /// Orange (256-color) for lit slopes.
    pub const SUN: &str = "\x1b[38;5;214m";
    /// Blue for shaded slopes.
    pub const SHADE: &str = "\x1b[34m";
}

/// Resolved color codes, either ANSI sequences or empty strings.
#[derive(Debug, Clone, Copy)]
pub struct ColorPalette {
    pub enabled: bool,
    pub reset: &'static str,
    pub white_bold: &'static str,
    pub gray: &'static str,
    pub sun: &'static str,
    pub shade: &'static str,
}

impl ColorPalette {
    #[must_use]
    pub const fn colored() -> Self {
        Self {
            enabled: true,
            reset: colors::RESET,
            white_bold: colors::WHITE_BOLD,
            gray: colors::GRAY,
            sun: colors::SUN,
            shade: colors::SHADE,
        }
    }

    #[must_use]
    pub const fn plain() -> Self {
        Self {
            enabled: false,
            reset: "",
            white_bold: "",
            gray: "",
            sun: "",
            shade: "",
        }
    }

    /// `colored()` if the terminal supports ANSI colors, otherwise `plain()`.
    #[must_use]
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    /// Color for a lit or shaded state.
    #[must_use]
    pub fn light(&self, is_shaded: bool) -> &'static str {
        if is_shaded {
            self.shade
        } else {
            self.sun
        }
    }

    /// Difficulty marker drawn in the piste's map color.
    #[must_use]
    pub fn swatch(&self, hex: &str) -> String {
        match (self.enabled, hex_to_rgb(hex)) {
            (true, Some((r, g, b))) => format!("\x1b[38;2;{r};{g};{b}m●{}", self.reset),
            _ => "-".to_string(),
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
/// Respects the `NO_COLOR` environment variable (https://no-color.org/) and
/// the `TERM=dumb` convention.
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

/// Parse a `#RRGGBB` color.
#[must_use]
pub fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
