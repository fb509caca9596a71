//! Docstring composition
//!
//! A composed docstring is the calling-convention line, the `--` end
//! marker, the authored summary, and the per-parameter documentation,
//! assembled by substituting the `{signature}` and `{parameters}`
//! markers into the authored text.

use crate::errors::{DslError, DslResult};
use crate::model::{Function, Parameter};

/// Separates the calling-convention line from the rest of a docstring
pub const SIG_END_MARKER: &str = "--";

/// A composed docstring plus the soft warnings raised while composing it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedDocstring {
    pub text: String,
    pub warnings: Vec<String>,
}

pub struct DocstringComposer<'a> {
    function: &'a Function,
    width: usize,
}

impl<'a> DocstringComposer<'a> {
    pub fn new(function: &'a Function, width: usize) -> Self {
        Self { function, width }
    }

    pub fn compose(&self) -> DslResult<ComposedDocstring> {
        let f = self.function;
        let mut warnings = Vec::new();

        if (f.kind.is_constructor() || f.kind.is_accessor()) && f.raw_docstring.is_empty() {
            return Ok(ComposedDocstring {
                text: String::new(),
                warnings,
            });
        }

        let mut lines: Vec<&str> = f.raw_docstring.split('\n').collect();
        let summary_len = lines.iter().take_while(|line| !line.is_empty()).count();
        if summary_len >= 2 && !f.permit_long_summary {
            return Err(DslError::docstring(format!(
                "Docstring for {:?} does not have a summary line!\n\
                 Every non-blank function docstring must start with a single line summary followed by an empty line.",
                f.full_name
            )));
        }
        self.check_line_lengths(&lines, summary_len, &mut warnings);

        if f.raw_docstring.matches("{parameters}").count() > 1 {
            return Err(DslError::docstring(
                "You may not specify {parameters} more than once in a docstring!",
            ));
        }

        let summary_end = summary_len.max(1);
        if lines.len() <= summary_end {
            lines.push("");
        }
        if !f.raw_docstring.contains("{parameters}") {
            lines.insert(summary_end + 1, "{parameters}");
        }
        lines.insert(0, "{signature}");

        let signature = self.signature_line();
        let parameters = self.parameters_section();
        let text = linear_format(
            &lines.join("\n"),
            &[("signature", &signature), ("parameters", &parameters)],
        )?;
        Ok(ComposedDocstring {
            text: text.trim_end().to_string(),
            warnings,
        })
    }

    fn check_line_lengths(&self, lines: &[&str], summary_len: usize, warnings: &mut Vec<String>) {
        let f = self.function;
        let too_long = |line: &&str| line.chars().count() > self.width;

        let summary = &lines[..summary_len.min(lines.len())];
        let long_summary = summary.iter().any(too_long);
        if long_summary && !f.permit_long_summary {
            warnings.push(format!(
                "Summary line for {:?} is longer than {} characters",
                f.full_name, self.width
            ));
        }
        if f.permit_long_summary && !long_summary && summary.len() <= 1 {
            warnings.push(format!(
                "@permit_long_summary is unnecessary for {:?}",
                f.full_name
            ));
        }

        let long_body = lines.iter().skip(summary_len).any(too_long);
        if long_body && !f.permit_long_docstring_body {
            warnings.push(format!(
                "Docstring body for {:?} has lines longer than {} characters",
                f.full_name, self.width
            ));
        }
        if f.permit_long_docstring_body && !long_body {
            warnings.push(format!(
                "@permit_long_docstring_body is unnecessary for {:?}",
                f.full_name
            ));
        }
    }

    fn shown(&self, p: &Parameter) -> bool {
        if p.converter.is_receiver() {
            self.function.kind.shows_receiver()
        } else {
            p.show_in_signature()
        }
    }

    /// The calling-convention line and end marker; empty for accessors
    pub fn signature_line(&self) -> String {
        let f = self.function;
        let mut writer = SignatureWriter::new(&f.display_name, self.width);

        if let Some(forced) = &f.forced_text_signature {
            writer.out.push_str(forced);
        } else if f.kind.is_accessor() {
            return String::new();
        } else {
            writer.open();
            let params: Vec<&Parameter> = f.parameters.values().collect();

            // Brackets only ever surround the leading positional-only run
            let mut positional_run = true;
            let bracket_depths: Vec<usize> = params
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    if i == 0 {
                        return 0;
                    }
                    if !p.is_positional_only() {
                        positional_run = false;
                    }
                    if positional_run {
                        p.group.depth
                    } else {
                        0
                    }
                })
                .collect();

            let need_trailing_slash = !f.docstring_only
                && params
                    .iter()
                    .rev()
                    .find(|p| self.shown(p))
                    .is_some_and(|p| p.is_positional_only());

            let mut need_slash = false;
            let mut added_slash = false;
            let mut added_star = false;
            let last = params.len().saturating_sub(1);

            for (i, p) in params.iter().enumerate() {
                if !self.shown(p) {
                    continue;
                }
                let is_receiver = p.converter.is_receiver();
                if is_receiver && f.docstring_only {
                    continue;
                }

                if p.is_positional_only() {
                    need_slash = !f.docstring_only;
                } else if need_slash && !added_slash {
                    added_slash = true;
                    writer.add("/,");
                }
                if p.is_keyword_only() && !added_star {
                    added_star = true;
                    writer.add("*,");
                }

                let mut text = writer.brackets_to(bracket_depths[i]);
                if is_receiver {
                    text.push('$');
                }
                if p.is_vararg() {
                    text.push('*');
                    added_star = true;
                }
                text.push_str(&p.name);
                if !p.is_vararg() && p.is_optional() {
                    text.push('=');
                    text.push_str(&p.signature_default().unwrap_or_default());
                }
                if i != last || need_trailing_slash {
                    text.push(',');
                }
                writer.add(&text);
            }

            let closing = writer.brackets_to(0);
            writer.out.push_str(&closing);
            if need_trailing_slash {
                writer.add("/");
            }
            writer.out.push(')');
        }

        if !f.docstring_only {
            writer.out.push('\n');
            writer.out.push_str(SIG_END_MARKER);
            writer.out.push('\n');
        }
        writer.out.replace(", ]", ",] ")
    }

    /// Per-parameter documentation in declaration order
    pub fn parameters_section(&self) -> String {
        let mut out = String::new();
        let mut spacer = false;
        for p in self.function.parameters.values() {
            let doc = p.docstring.trim();
            if doc.is_empty() {
                continue;
            }
            if spacer {
                out.push('\n');
            }
            spacer = true;
            out.push_str("  ");
            out.push_str(&p.name);
            out.push('\n');
            let body: Vec<String> = doc
                .split('\n')
                .map(str::trim_end)
                .map(|line| {
                    if line.is_empty() {
                        String::new()
                    } else {
                        format!("    {}", line)
                    }
                })
                .collect();
            out.push_str(&body.join("\n"));
        }
        if spacer {
            out.push('\n');
        }
        out
    }
}

/// Accumulates the calling-convention line with soft wrapping
struct SignatureWriter {
    out: String,
    line_length: usize,
    indent: String,
    first: bool,
    width: usize,
    bracket_level: usize,
}

impl SignatureWriter {
    fn new(name: &str, width: usize) -> Self {
        Self {
            out: name.to_string(),
            line_length: 0,
            indent: String::new(),
            first: true,
            width,
            bracket_level: 0,
        }
    }

    fn open(&mut self) {
        self.out.push('(');
        self.line_length = self.out.chars().count();
        self.indent = " ".repeat(self.line_length);
    }

    fn add(&mut self, text: &str) {
        let piece = if self.first {
            self.first = false;
            text.to_string()
        } else if self.line_length + 1 + text.chars().count() >= self.width {
            self.out.push('\n');
            self.out.push_str(&self.indent);
            self.line_length = self.indent.len();
            text.to_string()
        } else {
            format!(" {}", text)
        };
        self.line_length += piece.chars().count();
        self.out.push_str(&piece);
    }

    /// Brackets needed to move from the current nesting to `depth`
    fn brackets_to(&mut self, depth: usize) -> String {
        let mut s = String::new();
        while self.bracket_level < depth {
            s.push('[');
            self.bracket_level += 1;
        }
        while self.bracket_level > depth {
            s.push(']');
            self.bracket_level -= 1;
        }
        s
    }
}

/// Substitute `{name}` markers that stand alone on their line.
///
/// Empty values remove the marker line; other values are indented by the
/// marker's indentation. Unknown markers pass through untouched.
pub fn linear_format(text: &str, fields: &[(&str, &str)]) -> DslResult<String> {
    let mut out = String::with_capacity(text.len());
    for line in text.split('\n') {
        let Some((indent, rest)) = line.split_once('{') else {
            out.push_str(line);
            out.push('\n');
            continue;
        };
        let field = rest
            .split_once('}')
            .and_then(|(name, trailing)| {
                fields
                    .iter()
                    .find(|(field, _)| *field == name)
                    .map(|(_, value)| (name, trailing, *value))
            });
        let Some((name, trailing, value)) = field else {
            out.push_str(line);
            out.push('\n');
            continue;
        };

        if !trailing.is_empty() {
            return Err(DslError::docstring(format!(
                "Text found after '{{{}}}' block marker! It must be on a line by itself.",
                name
            )));
        }
        if !indent.trim().is_empty() {
            return Err(DslError::docstring(format!(
                "Non-whitespace characters found before '{{{}}}' block marker! It must be on a line by itself.",
                name
            )));
        }
        if value.is_empty() {
            continue;
        }
        let indented: Vec<String> = value
            .split('\n')
            .map(str::trim_end)
            .map(|l| {
                if l.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", indent, l)
                }
            })
            .collect();
        out.push_str(&indented.join("\n"));
        out.push('\n');
    }
    out.pop();
    Ok(out)
}
