//! Terminal styles.
//!
//! Renderers ask for a style by role rather than by color. `console` drops
//! the escape codes on its own when stdout is not a terminal, so piped
//! output and test assertions see plain text.

use console::Style;

pub fn muted() -> Style {
    Style::new().color256(245)
}

pub fn title() -> Style {
    Style::new().bold()
}

pub fn id() -> Style {
    Style::new().color256(178)
}

pub fn success() -> Style {
    Style::new().green()
}

pub fn warning() -> Style {
    Style::new().yellow().bold()
}

pub fn error() -> Style {
    Style::new().red().bold()
}

pub fn info() -> Style {
    Style::new().cyan()
}
