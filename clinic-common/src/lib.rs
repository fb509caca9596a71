//! Argument Clinic DSL - Common Diagnostics
//!
//! This crate contains the error taxonomy, diagnostic collection and
//! source location types shared by the DSL parser and the driver.

pub mod error;
pub mod source_loc;

pub use error::{Category, ClinicError, Diagnostic, ErrorReporter, Severity};
pub use source_loc::SourceLocation;
