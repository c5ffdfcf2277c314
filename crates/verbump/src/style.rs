//! Output styling that honors `--color` and whether each stream is a terminal.

use std::fmt;

use owo_colors::{OwoColorize, Stream, Style};

/// Field labels.
pub const LABEL: Style = Style::new().bold();
/// Secondary detail such as old versions and hashes.
pub const DIM: Style = Style::new().dimmed();
/// Success marks.
pub const OK: Style = Style::new().green();
/// The new version.
pub const NEW: Style = Style::new().green().bold();
/// Branch names.
pub const ACCENT: Style = Style::new().cyan();
/// Dry-run markers and warnings.
pub const WARN: Style = Style::new().yellow();
/// Error prefix.
pub const ERROR: Style = Style::new().red().bold();

/// A value styled only if the stream it is written to supports color.
pub struct Painted<T> {
    value: T,
    style: Style,
    stream: Stream,
}

impl<T: fmt::Display> fmt::Display for Painted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = self.style;
        write!(
            f,
            "{}",
            self.value.if_supports_color(self.stream, |v| v.style(style))
        )
    }
}

/// Style `value` for stdout.
pub const fn paint<T>(value: T, style: Style) -> Painted<T> {
    Painted {
        value,
        style,
        stream: Stream::Stdout,
    }
}

/// Style `value` for stderr.
pub const fn epaint<T>(value: T, style: Style) -> Painted<T> {
    Painted {
        value,
        style,
        stream: Stream::Stderr,
    }
}
