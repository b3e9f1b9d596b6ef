//! CLI theme and styling.

use colored::Colorize;
use firedrill_core::{Persona, Severity};

/// CLI theme configuration.
pub(crate) struct Theme;

impl Theme {
    /// Format a header.
    pub(crate) fn header(text: &str) -> String {
        format!("{}", text.bold().cyan())
    }

    /// Format a success message.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {}", "✓".green(), text)
    }

    /// Format an error message.
    pub(crate) fn error(text: &str) -> String {
        format!("{} {}", "✗".red(), text.red())
    }

    /// Format a warning message.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow(), text.yellow())
    }

    /// Format an info message.
    pub(crate) fn info(text: &str) -> String {
        format!("{} {}", "i".blue(), text)
    }

    /// Format a dimmed message.
    pub(crate) fn dimmed(text: &str) -> String {
        format!("{}", text.dimmed())
    }

    /// Format a separator line.
    pub(crate) fn separator() -> String {
        "━".repeat(50).dimmed().to_string()
    }

    /// A notification line in its severity's style.
    pub(crate) fn notification(severity: Severity, text: &str) -> String {
        match severity {
            Severity::Info => Self::info(text),
            Severity::Success => Self::success(text),
            Severity::Warning => Self::warning(text),
            Severity::Error => Self::error(text),
        }
    }

    /// Speaker label for a persona.
    pub(crate) fn persona(persona: Persona) -> String {
        let label = format!("[{}]", persona.display_name());
        match persona {
            Persona::Sre => label.bold().cyan().to_string(),
            Persona::Security => label.bold().magenta().to_string(),
        }
    }
}
