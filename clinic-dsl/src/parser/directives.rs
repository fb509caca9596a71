//! Top-level directives and `@modifier` lines
//!
//! Directive lines are split shell-style; the first word selects an entry
//! in a fixed table that records the accepted argument count.

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;

use super::DslParser;
use crate::errors::{DslError, DslResult};
use crate::model::FunctionKind;
use crate::registry::Signature;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum DirectiveKind {
    Module,
    Class,
    Set,
    Destination,
    Output,
    Dump,
    Printout,
    Preserve,
    ClassMethod,
    StaticMethod,
    Getter,
    Setter,
    Coexist,
    TextSignature,
    CriticalSection,
    Disable,
    PermitLongSummary,
    PermitLongDocstringBody,
}

#[derive(Debug, Clone, Copy)]
pub(super) struct DirectiveSpec {
    kind: DirectiveKind,
    min_args: usize,
    /// `None` accepts any number of trailing words
    max_args: Option<usize>,
}

const fn exact(kind: DirectiveKind, n: usize) -> DirectiveSpec {
    DirectiveSpec {
        kind,
        min_args: n,
        max_args: Some(n),
    }
}

const fn at_least(kind: DirectiveKind, n: usize) -> DirectiveSpec {
    DirectiveSpec {
        kind,
        min_args: n,
        max_args: None,
    }
}

static DIRECTIVES: Lazy<HashMap<&'static str, DirectiveSpec>> = Lazy::new(|| {
    use DirectiveKind::*;
    HashMap::from([
        ("module", exact(Module, 1)),
        ("class", exact(Class, 3)),
        ("set", exact(Set, 2)),
        ("destination", at_least(Destination, 2)),
        (
            "output",
            DirectiveSpec {
                kind: Output,
                min_args: 1,
                max_args: Some(2),
            },
        ),
        ("dump", exact(Dump, 1)),
        ("printout", at_least(Printout, 0)),
        ("preserve", exact(Preserve, 0)),
        ("@classmethod", exact(ClassMethod, 0)),
        ("@staticmethod", exact(StaticMethod, 0)),
        ("@getter", exact(Getter, 0)),
        ("@setter", exact(Setter, 0)),
        ("@coexist", exact(Coexist, 0)),
        ("@text_signature", exact(TextSignature, 1)),
        ("@critical_section", at_least(CriticalSection, 0)),
        ("@disable", at_least(Disable, 0)),
        ("@permit_long_summary", exact(PermitLongSummary, 0)),
        ("@permit_long_docstring_body", exact(PermitLongDocstringBody, 0)),
    ])
});

pub(super) fn lookup(keyword: &str) -> Option<DirectiveSpec> {
    DIRECTIVES.get(keyword).copied()
}

/// Split a directive line into words, honouring quotes and backslashes
pub(super) fn shell_split(line: &str) -> DslResult<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => word.push(c),
                        None => return Err(DslError::directive("No closing quotation")),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c @ ('"' | '\\')) => word.push(c),
                            Some(c) => {
                                word.push('\\');
                                word.push(c);
                            }
                            None => return Err(DslError::directive("No closing quotation")),
                        },
                        Some(c) => word.push(c),
                        None => return Err(DslError::directive("No closing quotation")),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => word.push(c),
                    None => return Err(DslError::directive("No escaped character")),
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

impl DslParser<'_> {
    pub(super) fn run_directive(
        &mut self,
        directive: DirectiveSpec,
        keyword: &str,
        args: &[String],
    ) -> DslResult<()> {
        let arity_ok = args.len() >= directive.min_args
            && directive.max_args.map_or(true, |max| args.len() <= max);
        if !arity_ok {
            let expected = match directive.max_args {
                Some(max) if max == directive.min_args => format!("exactly {}", max),
                Some(max) => format!("{} to {}", directive.min_args, max),
                None => format!("at least {}", directive.min_args),
            };
            return Err(DslError::directive(format!(
                "Directive {:?} takes {} argument(s) ({} given)",
                keyword,
                expected,
                args.len()
            )));
        }
        debug!("directive {} {:?}", keyword, args);

        match directive.kind {
            DirectiveKind::Module => {
                let id = self.registry.declare_module(&args[0])?;
                self.signatures.push(Signature::Module(id));
            }
            DirectiveKind::Class => {
                let id = self.registry.declare_class(&args[0], &args[1], &args[2])?;
                self.signatures.push(Signature::Class(id));
            }
            DirectiveKind::Set => self.directive_set(&args[0], &args[1])?,
            DirectiveKind::Destination => self.directive_destination(&args[0], &args[1], &args[2..])?,
            DirectiveKind::Output => {
                let destination = args.get(1).map(String::as_str).unwrap_or("");
                self.directive_output(&args[0], destination)?;
            }
            DirectiveKind::Dump => {
                let text = self.registry.destination_mut(&args[0])?.dump();
                self.output.push_str(&text);
            }
            DirectiveKind::Printout => {
                self.output.push_str(&args.join(" "));
                self.output.push('\n');
            }
            DirectiveKind::Preserve => {
                if self.preserve_output {
                    return Err(DslError::directive("Can't have 'preserve' twice in one block!"));
                }
                self.preserve_output = true;
            }
            kind => self.apply_modifier(kind, args)?,
        }
        Ok(())
    }

    fn directive_set(&mut self, name: &str, value: &str) -> DslResult<()> {
        let value = value
            .replace("{block comment start}", "/*")
            .replace("{block comment end}", "*/");
        match name {
            "line_prefix" => self.registry.config.line_prefix = value,
            "line_suffix" => self.registry.config.line_suffix = value,
            _ => return Err(DslError::directive(format!("unknown variable {:?}", name))),
        }
        Ok(())
    }

    fn directive_destination(&mut self, name: &str, command: &str, args: &[String]) -> DslResult<()> {
        match command {
            "new" => {
                let Some((kind, rest)) = args.split_first() else {
                    return Err(DslError::directive(format!(
                        "Destination {:?}: 'new' requires a type",
                        name
                    )));
                };
                self.registry.add_destination(name, kind, rest)
            }
            "clear" => {
                if !args.is_empty() {
                    return Err(DslError::directive(format!(
                        "Destination {:?}: 'clear' takes no arguments",
                        name
                    )));
                }
                self.registry.destination_mut(name)?.clear()
            }
            _ => Err(DslError::directive(format!(
                "unknown destination command {:?}",
                command
            ))),
        }
    }

    fn directive_output(&mut self, command: &str, destination: &str) -> DslResult<()> {
        match command {
            "preset" => self.registry.apply_preset(destination),
            "push" => {
                self.registry.push_routing();
                Ok(())
            }
            "pop" => self.registry.pop_routing(),
            field => self.registry.route(field, destination),
        }
    }

    fn apply_modifier(&mut self, kind: DirectiveKind, args: &[String]) -> DslResult<()> {
        let m = &mut self.modifiers;
        match kind {
            DirectiveKind::ClassMethod | DirectiveKind::StaticMethod => {
                let (target, name) = match kind {
                    DirectiveKind::ClassMethod => (FunctionKind::ClassMethod, "classmethod"),
                    _ => (FunctionKind::StaticMethod, "staticmethod"),
                };
                if m.kind != FunctionKind::Callable {
                    return Err(DslError::directive(format!(
                        "Can't set @{}, function is not a normal callable",
                        name
                    )));
                }
                m.kind = target;
            }
            DirectiveKind::Getter | DirectiveKind::Setter => {
                let (target, name, other) = match kind {
                    DirectiveKind::Getter => (FunctionKind::Getter, "getter", FunctionKind::Setter),
                    _ => (FunctionKind::Setter, "setter", FunctionKind::Getter),
                };
                if m.kind == target {
                    return Err(DslError::directive(format!(
                        "Cannot apply @{} twice to the same function!",
                        name
                    )));
                }
                if m.kind == other {
                    return Err(DslError::directive(
                        "Cannot apply both @getter and @setter to the same function!",
                    ));
                }
                m.kind = target;
            }
            DirectiveKind::Coexist => {
                if m.coexist {
                    return Err(DslError::directive("Called @coexist twice!"));
                }
                m.coexist = true;
            }
            DirectiveKind::TextSignature => {
                if m.forced_text_signature.is_some() {
                    return Err(DslError::directive("Called @text_signature twice!"));
                }
                m.forced_text_signature = Some(args[0].clone());
            }
            DirectiveKind::CriticalSection => {
                if args.len() > 2 {
                    return Err(DslError::directive(
                        "Up to 2 critical section variables are supported",
                    ));
                }
                m.target_critical_section.extend(args.iter().cloned());
                m.critical_section = true;
            }
            DirectiveKind::Disable => {
                if args.is_empty() {
                    return Err(DslError::directive("@disable expects at least one argument"));
                }
                let unknown: Vec<&String> = args.iter().filter(|a| *a != "fastcall").collect();
                if !unknown.is_empty() {
                    return Err(DslError::directive(format!(
                        "invalid argument for @disable: {:?}",
                        unknown
                    )));
                }
                m.disable_fastcall = true;
            }
            DirectiveKind::PermitLongSummary => {
                if m.permit_long_summary {
                    return Err(DslError::directive("Called @permit_long_summary twice!"));
                }
                m.permit_long_summary = true;
            }
            DirectiveKind::PermitLongDocstringBody => {
                if m.permit_long_docstring_body {
                    return Err(DslError::directive("Called @permit_long_docstring_body twice!"));
                }
                m.permit_long_docstring_body = true;
            }
            other => {
                return Err(DslError::directive(format!(
                    "{:?} is not a function modifier",
                    other
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_split_quotes() {
        assert_eq!(
            shell_split(r#"printout "hello world" 'it''s' a\ b"#).unwrap(),
            vec!["printout", "hello world", "its", "a b"]
        );
        assert_eq!(shell_split("   ").unwrap(), Vec::<String>::new());
        assert_eq!(shell_split(r#"set x "say \"hi\"""#).unwrap()[2], "say \"hi\"");
    }

    #[test]
    fn test_shell_split_unterminated() {
        let err = shell_split("printout 'oops").unwrap_err();
        assert_eq!(err.message(), "No closing quotation");
    }

    #[test]
    fn test_directive_table() {
        let module = lookup("module").unwrap();
        assert_eq!(module.kind, DirectiveKind::Module);
        assert_eq!((module.min_args, module.max_args), (1, Some(1)));
        assert!(lookup("@permit_long_summary").is_some());
        assert!(lookup("zlib.compress").is_none());
    }
}
