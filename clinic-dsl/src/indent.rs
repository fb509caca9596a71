//! Indentation tracking for the line-oriented DSL
//!
//! The tracker keeps a stack of margin widths. Each call to `infer`
//! reports whether a line indented (+1), kept the margin (0), or dedented
//! through N recorded margins (-N).

use crate::errors::{DslError, DslResult};

#[derive(Debug, Clone, Default)]
pub struct IndentTracker {
    indents: Vec<usize>,
    margin: Option<usize>,
}

impl IndentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Width of the line's margin; blank lines inherit the current margin
    pub fn measure(&self, line: &str) -> DslResult<usize> {
        if line.contains('\t') {
            return Err(DslError::lexical(
                "Tab characters are illegal in the Argument Clinic DSL.",
            ));
        }
        // Only ASCII spaces count towards the margin
        let stripped = line.trim_start_matches(' ');
        if stripped.trim().is_empty() {
            return self
                .indents
                .last()
                .copied()
                .ok_or_else(|| DslError::lexical("IndentTracker expected indents, but none are defined."));
        }
        Ok(line.len() - stripped.len())
    }

    /// Infer the current margin from this line
    pub fn infer(&mut self, line: &str) -> DslResult<isize> {
        let indent = self.measure(line)?;
        let Some(&current) = self.indents.last() else {
            self.indents.push(indent);
            self.margin = Some(indent);
            return Ok(1);
        };

        if indent == current {
            return Ok(0);
        }
        if indent > current {
            self.indents.push(indent);
            self.margin = Some(indent);
            return Ok(1);
        }

        if !self.indents.contains(&indent) {
            return Err(DslError::lexical("Illegal outdent."));
        }
        let mut outdent_count = 0;
        while self.indents.last() != Some(&indent) {
            self.indents.pop();
            outdent_count -= 1;
        }
        self.margin = Some(indent);
        Ok(outdent_count)
    }

    /// Number of recorded margins
    pub fn depth(&self) -> usize {
        self.indents.len()
    }

    /// Width of the most recently inferred margin
    pub fn margin(&self) -> usize {
        self.margin.unwrap_or(0)
    }

    /// Strip the current margin from a line
    pub fn dedent<'a>(&self, line: &'a str) -> DslResult<&'a str> {
        let width = self.margin();
        let matches = line.len() >= width && line.as_bytes()[..width].iter().all(|&b| b == b' ');
        if !matches {
            return Err(DslError::lexical(
                "Cannot dedent; line does not start with the previous margin.",
            ));
        }
        Ok(&line[width..])
    }
}
