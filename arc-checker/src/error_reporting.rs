//! Diagnostic collection for the dimensional analyzer
//!
//! Hard dimension errors and magnitude warnings are not returned as `Err`;
//! the analyzer pushes them into a [`DiagnosticSink`] owned by whoever is
//! walking the program, so a single pass can report everything it finds.

use arc_types::Span;
use serde::Serialize;
use std::fmt;

/// Receiver for analyzer diagnostics
pub trait DiagnosticSink {
    fn error(&mut self, location: Span, message: String, hint: Option<String>);
    fn warning(&mut self, location: Span, message: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
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

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: Span,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if !self.location.is_dummy() {
            write!(f, " at {}", self.location)?;
        }
        if let Some(hint) = &self.hint {
            write!(f, " (hint: {})", hint)?;
        }
        Ok(())
    }
}

/// Collecting sink
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> &[Diagnostic] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Errors first, then warnings, each in report order
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

impl DiagnosticSink for Diagnostics {
    fn error(&mut self, location: Span, message: String, hint: Option<String>) {
        self.errors.push(Diagnostic {
            severity: Severity::Error,
            location,
            message,
            hint,
        });
    }

    fn warning(&mut self, location: Span, message: String) {
        self.warnings.push(Diagnostic {
            severity: Severity::Warning,
            location,
            message,
            hint: None,
        });
    }
}
