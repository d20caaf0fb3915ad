//! Terminal capability detection and colored messages

use owo_colors::{colors::css, OwoColorize};

/// Terminals narrower than this get the compact register view.
const NARROW_COLUMNS: u16 = 80;

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Detects terminal width, returning None if not available
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Check if the terminal is too narrow for the full register table
pub fn is_narrow() -> bool {
    terminal_width().is_some_and(|w| w < NARROW_COLUMNS)
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Success,
    Warning,
    Error,
    Dim,
}

fn paint(text: &str, tone: Tone) -> String {
    if !supports_color() {
        return text.to_string();
    }
    match tone {
        Tone::Success => text.fg::<css::Green>().to_string(),
        Tone::Warning => text.fg::<css::Orange>().to_string(),
        Tone::Error => text.fg::<css::Red>().to_string(),
        Tone::Dim => text.dimmed().to_string(),
    }
}

/// Extension trait for colorizing messages
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Color as error (red)
    fn error(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl<T: AsRef<str> + ?Sized> Colorize for T {
    fn success(&self) -> String {
        paint(self.as_ref(), Tone::Success)
    }

    fn warning(&self) -> String {
        paint(self.as_ref(), Tone::Warning)
    }

    fn error(&self) -> String {
        paint(self.as_ref(), Tone::Error)
    }

    fn dim(&self) -> String {
        paint(self.as_ref(), Tone::Dim)
    }
}
