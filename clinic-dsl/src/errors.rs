//! DSL error definitions
//!
//! Handlers raise a location-free `DslError`; the state machine attaches
//! the line being processed when it converts the error into a
//! `ClinicError`.

use clinic_common::{ClinicError, SourceLocation};
use thiserror::Error;

/// Errors raised while processing one line of a declaration block
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DslError {
    #[error("{0}")]
    Lexical(String),
    #[error("{0}")]
    Semantic(String),
    #[error("{0}")]
    Docstring(String),
    #[error("{0}")]
    Directive(String),
    /// Parser state that should be unreachable from any input
    #[error("{0}")]
    Internal(String),
}

pub type DslResult<T> = Result<T, DslError>;

impl DslError {
    pub fn lexical(message: impl Into<String>) -> Self {
        DslError::Lexical(message.into())
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        DslError::Semantic(message.into())
    }

    pub fn docstring(message: impl Into<String>) -> Self {
        DslError::Docstring(message.into())
    }

    pub fn directive(message: impl Into<String>) -> Self {
        DslError::Directive(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DslError::Internal(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            DslError::Lexical(m)
            | DslError::Semantic(m)
            | DslError::Docstring(m)
            | DslError::Directive(m)
            | DslError::Internal(m) => m,
        }
    }

    /// Attach the offending line
    pub fn at(self, location: SourceLocation) -> ClinicError {
        match self {
            DslError::Lexical(message) => ClinicError::lexical(message, location),
            DslError::Semantic(message) => ClinicError::semantic(message, location),
            DslError::Docstring(message) => ClinicError::docstring(message, location),
            DslError::Directive(message) => ClinicError::directive(message, location),
            DslError::Internal(message) => ClinicError::InternalError {
                message: format!("{} (at {})", message, location),
            },
        }
    }
}
