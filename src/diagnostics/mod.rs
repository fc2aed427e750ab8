//! Reader and REPL diagnostics.
//!
//! Lexer and parser failures are reported as [`Diagnostic`] values built with
//! the chained constructors below and rendered to plain text by the REPL.

pub mod position;

pub use position::Position;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub title: String,
    pub message: Option<String>,
    pub position: Option<Position>,
    pub hints: Vec<String>,
}

impl Diagnostic {
    pub fn error(title: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            message: None,
            position: None,
            hints: Vec::new(),
        }
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            title: title.into(),
            message: None,
            position: None,
            hints: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Plain-text rendering used by the REPL and file runner.
    pub fn render(&self) -> String {
        let mut out = format!("{}: {}", self.severity, self.title);
        if let Some(pos) = self.position {
            out.push_str(&format!(" at {}", pos));
        }
        if let Some(message) = &self.message {
            out.push('\n');
            out.push_str(&format!("  {}", message));
        }
        for hint in &self.hints {
            out.push('\n');
            out.push_str(&format!("  hint: {}", hint));
        }
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
