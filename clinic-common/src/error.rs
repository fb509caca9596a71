//! Error handling for the Argument Clinic DSL
//!
//! This module defines the error taxonomy for a declaration block and the
//! reporter used to collect soft warnings (line lengths, relaxed-mode
//! flags that turned out to be unnecessary, and similar).

use crate::source_loc::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main error type; every DSL failure aborts the current block
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClinicError {
    /// Illegal tabs, outdents, unparsable parameter syntax, duplicate names
    #[error("Error in {location}: {message}")]
    Lexical {
        location: SourceLocation,
        message: String,
    },

    /// Unknown converters, bad defaults, group and marker violations
    #[error("Error in {location}: {message}")]
    Semantic {
        location: SourceLocation,
        message: String,
    },

    /// Summary line and `{parameters}` placement problems
    #[error("Error in {location}: {message}")]
    Docstring {
        location: SourceLocation,
        message: String,
    },

    /// Unknown directives, wrong arity, redefinitions
    #[error("Error in {location}: {message}")]
    Directive {
        location: SourceLocation,
        message: String,
    },

    #[error("Cannot read block: {message}")]
    IoError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl ClinicError {
    pub fn lexical(message: String, location: SourceLocation) -> Self {
        ClinicError::Lexical { location, message }
    }

    pub fn semantic(message: String, location: SourceLocation) -> Self {
        ClinicError::Semantic { location, message }
    }

    pub fn docstring(message: String, location: SourceLocation) -> Self {
        ClinicError::Docstring { location, message }
    }

    pub fn directive(message: String, location: SourceLocation) -> Self {
        ClinicError::Directive { location, message }
    }

    /// Location of the offending line, if the error came from a block
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ClinicError::Lexical { location, .. }
            | ClinicError::Semantic { location, .. }
            | ClinicError::Docstring { location, .. }
            | ClinicError::Directive { location, .. } => Some(location),
            ClinicError::IoError { .. } | ClinicError::InternalError { .. } => None,
        }
    }

    /// 1-based line number of the offending line
    pub fn line(&self) -> Option<u32> {
        self.location().map(|loc| loc.line)
    }

    /// The bare diagnostic text without the location prefix
    pub fn message(&self) -> &str {
        match self {
            ClinicError::Lexical { message, .. }
            | ClinicError::Semantic { message, .. }
            | ClinicError::Docstring { message, .. }
            | ClinicError::Directive { message, .. }
            | ClinicError::IoError { message }
            | ClinicError::InternalError { message } => message,
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ClinicError::Lexical { .. } => Category::Lexical,
            ClinicError::Semantic { .. } => Category::Semantic,
            ClinicError::Docstring { .. } => Category::Docstring,
            ClinicError::Directive { .. } => Category::Directive,
            ClinicError::IoError { .. } | ClinicError::InternalError { .. } => Category::Internal,
        }
    }
}

impl From<std::io::Error> for ClinicError {
    fn from(err: std::io::Error) -> Self {
        ClinicError::IoError {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Which part of the taxonomy a diagnostic belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Lexical,
    Semantic,
    Docstring,
    Directive,
    Internal,
    /// Line lengths and relaxed-mode flags; never fatal
    Style,
}

/// One reported problem, attached to the line that caused it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: Category,
    pub message: String,
    pub location: SourceLocation,
}

impl Diagnostic {
    pub fn error(category: Category, message: String, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message,
            location,
        }
    }

    pub fn warning(message: String, location: SourceLocation) -> Self {
        Self {
            severity: Severity::Warning,
            category: Category::Style,
            message,
            location,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}: {}", self.location, label, self.message)
    }
}

/// Collects diagnostics across blocks
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a soft warning
    pub fn warning(&mut self, message: String, location: SourceLocation) {
        self.diagnostics.push(Diagnostic::warning(message, location));
    }

    /// Record a block that was rejected
    pub fn report(&mut self, err: &ClinicError) {
        let location = err.location().cloned().unwrap_or_else(SourceLocation::dummy);
        self.diagnostics
            .push(Diagnostic::error(err.category(), err.message().to_string(), location));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// e.g. "2 blocks rejected, 1 warning"
    pub fn summary(&self) -> String {
        fn plural(n: usize, word: &str) -> String {
            format!("{} {}{}", n, word, if n == 1 { "" } else { "s" })
        }
        match (self.error_count(), self.warning_count()) {
            (0, 0) => "all blocks parsed cleanly".to_string(),
            (0, w) => plural(w, "warning"),
            (e, 0) => format!("{} rejected", plural(e, "block")),
            (e, w) => format!("{} rejected, {}", plural(e, "block"), plural(w, "warning")),
        }
    }
}
