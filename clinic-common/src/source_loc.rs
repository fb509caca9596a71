//! Source location tracking for diagnostics
//!
//! DSL blocks are line oriented, so a location is a filename plus a
//! 1-based line number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in an input file (line is 1-based, 0 means unknown)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
        }
    }

    /// Placeholder before the first line of a block is seen
    pub fn dummy() -> Self {
        Self::new("<unknown>", 0)
    }

    /// Location of another line in the same file
    pub fn with_line(&self, line: u32) -> Self {
        Self {
            filename: self.filename.clone(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.filename, self.line)
    }
}
