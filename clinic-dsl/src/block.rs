use std::fs;
use std::path::Path;

use clinic_common::ClinicError;
use serde::Serialize;

use crate::registry::Signature;

/// One extracted declaration block and what parsing it produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Block {
    pub input: String,
    /// Passthrough text requested by directives
    pub output: String,
    /// Modules, classes and functions declared by this block
    pub signatures: Vec<Signature>,
}

impl Block {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    /// A file holding exactly one extracted block
    pub fn read(path: &Path) -> Result<Self, ClinicError> {
        Ok(Self::new(fs::read_to_string(path)?))
    }
}

/// Where a block came from, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub filename: String,
    /// 1-based line number of the block's first line
    pub first_line: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            filename: "<input>".to_string(),
            first_line: 1,
        }
    }
}

impl ParseOptions {
    pub fn new(filename: impl Into<String>, first_line: u32) -> Self {
        Self {
            filename: filename.into(),
            first_line,
        }
    }
}
