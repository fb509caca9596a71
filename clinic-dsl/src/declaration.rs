//! Parameter-section line parsing
//!
//! Turns one dedented, continuation-spliced line of a parameter section
//! into either a marker (`*`, `/`, `[`, `]`) or a parameter declaration
//! with a resolved converter spec and a classified default value.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{DslError, DslResult};
use crate::expr::{Expr, ExprError, ExprParser, Lexer, RawDeclaration};
use crate::model::{ConverterArg, ConverterSpec, DefaultValue, Function};
use crate::version::Version;

static VERSION_GATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s+\[from\s+([^\]]*)\]$").unwrap());

static ALIAS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\*\s*)?\w+(\s+as\s+(\w+))").unwrap());

/// One line of a parameter section
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterLine<'a> {
    Star(Option<Version>),
    Slash(Option<Version>),
    OpenGroup,
    CloseGroup,
    Parameter(&'a str),
}

/// Strip a trailing `[from M.N]` gate
pub fn split_version_gate(line: &str) -> DslResult<(&str, Option<Version>)> {
    match VERSION_GATE.captures(line) {
        Some(caps) => {
            let (Some(body), Some(version)) = (caps.get(1), caps.get(2)) else {
                return Ok((line, None));
            };
            Ok((body.as_str(), Some(Version::parse(version.as_str())?)))
        }
        None => Ok((line, None)),
    }
}

/// Classify a stripped parameter-section line
pub fn classify_line(line: &str) -> DslResult<ParameterLine<'_>> {
    let (body, version) = split_version_gate(line)?;
    let marker = match body {
        "*" => return Ok(ParameterLine::Star(version)),
        "/" => return Ok(ParameterLine::Slash(version)),
        "[" => ParameterLine::OpenGroup,
        "]" => ParameterLine::CloseGroup,
        other => ParameterLine::Parameter(other),
    };
    if version.is_some() {
        let what = match marker {
            ParameterLine::OpenGroup => "'['",
            ParameterLine::CloseGroup => "']'",
            _ => "a parameter",
        };
        return Err(DslError::semantic(format!(
            "'[from ...]' is only allowed on '*' and '/', not on {}",
            what
        )));
    }
    Ok(marker)
}

/// A parsed parameter declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub alias: Option<String>,
    pub is_vararg: bool,
    pub converter: ConverterSpec,
    /// Whether the line spelled out `= value`
    pub has_default: bool,
    pub default: DefaultValue,
    pub py_default: Option<String>,
    pub c_default: Option<String>,
}

pub struct DeclarationParser<'a> {
    function: &'a str,
}

impl<'a> DeclarationParser<'a> {
    /// `function` is only used in diagnostics
    pub fn new(function: &'a str) -> Self {
        Self { function }
    }

    fn invalid(&self, line: &str, hint: &str) -> DslError {
        DslError::lexical(format!(
            "Function {:?} has an invalid parameter declaration{}: {:?}",
            self.function, hint, line
        ))
    }

    pub fn parse(&self, line: &str) -> DslResult<Declaration> {
        let (text, alias) = split_alias(line);

        let tokens = Lexer::new(&text)
            .tokenize()
            .map_err(|e| self.invalid(line, &format!(" ({})", e)))?;
        let raw = ExprParser::new(&text, tokens)
            .parse_declaration()
            .map_err(|e| match e {
                ExprError::Unsupported(what) if what == "**kwargs" => self.invalid(line, " (**kwargs?)"),
                ExprError::Unsupported(what) if what == "more than one parameter" => {
                    self.invalid(line, " (comma?)")
                }
                other => self.invalid(line, &format!(" ({})", other)),
            })?;

        let RawDeclaration {
            name,
            is_vararg,
            annotation,
            default,
        } = raw;

        let mut converter = match annotation {
            Some(expr) => classify_annotation(&expr)?,
            None => ConverterSpec::named("object"),
        };
        let c_default_kw = take_string_kwarg(&mut converter.kwargs, "c_default")?;
        let py_default_kw = take_string_kwarg(&mut converter.kwargs, "py_default")?;

        let Some((expr, source)) = default else {
            if py_default_kw.is_some() {
                return Err(DslError::semantic(
                    "You can't specify py_default without specifying a default value!",
                ));
            }
            let (default, c_default) = if is_vararg {
                (DefaultValue::Null, Some(c_default_kw.unwrap_or_else(|| "NULL".to_string())))
            } else {
                (DefaultValue::Unspecified, c_default_kw)
            };
            return Ok(Declaration {
                name,
                alias,
                is_vararg,
                converter,
                has_default: false,
                default,
                py_default: None,
                c_default,
            });
        };

        if is_vararg {
            return Err(DslError::semantic("Vararg can't take a default value!"));
        }
        let classified = classify_default(&expr, &source, c_default_kw.as_deref())?;
        Ok(Declaration {
            name,
            alias,
            is_vararg,
            converter,
            has_default: true,
            default: classified.value,
            py_default: py_default_kw.or(classified.py_default),
            c_default: c_default_kw.or(classified.c_default),
        })
    }
}

/// Remove an `as <alias>` right after the parameter name
fn split_alias(line: &str) -> (String, Option<String>) {
    match ALIAS.captures(line) {
        Some(caps) => match (caps.get(1), caps.get(2)) {
            (Some(clause), Some(alias)) => {
                let mut text = String::with_capacity(line.len());
                text.push_str(&line[..clause.start()]);
                text.push_str(&line[clause.end()..]);
                (text, Some(alias.as_str().to_string()))
            }
            _ => (line.to_string(), None),
        },
        None => (line.to_string(), None),
    }
}

fn take_string_kwarg(kwargs: &mut IndexMap<String, ConverterArg>, key: &str) -> DslResult<Option<String>> {
    match kwargs.shift_remove(key) {
        None => Ok(None),
        Some(ConverterArg::Str(text)) => Ok(Some(text)),
        Some(_) => Err(DslError::semantic(format!("{} must be a string", key))),
    }
}

/// Annotation forms: bare name, call with keyword arguments, or a quoted
/// legacy code
pub fn classify_annotation(expr: &Expr) -> DslResult<ConverterSpec> {
    let bad_form = || DslError::semantic("Annotations must be either a name, a function call, or a string.");
    match expr {
        Expr::Literal(crate::expr::Literal::Str(code)) => Ok(ConverterSpec::legacy(code.clone())),
        Expr::Name(name) => Ok(ConverterSpec::named(name.clone())),
        Expr::Call {
            func,
            args,
            keywords,
        } => {
            let Expr::Name(name) = func.as_ref() else {
                return Err(bad_form());
            };
            if !args.is_empty() {
                return Err(DslError::semantic(format!(
                    "Converter {:?} only accepts keyword arguments",
                    name
                )));
            }
            let mut spec = ConverterSpec::named(name.clone());
            for keyword in keywords {
                let key = keyword.name.clone().ok_or_else(bad_form)?;
                let value = converter_arg(&keyword.value).ok_or_else(|| {
                    DslError::semantic(format!(
                        "Unsupported value for converter argument {:?}",
                        key
                    ))
                })?;
                spec.kwargs.insert(key, value);
            }
            Ok(spec)
        }
        _ => Err(bad_form()),
    }
}

fn converter_arg(expr: &Expr) -> Option<ConverterArg> {
    use crate::expr::{DisplayKind, Literal};

    if let Some(lit) = expr.literal_value() {
        return match lit {
            Literal::Str(s) => Some(ConverterArg::Str(s)),
            Literal::Int(v) => Some(ConverterArg::Int(v)),
            Literal::Float(v) => Some(ConverterArg::Float(v)),
            Literal::Bool(v) => Some(ConverterArg::Bool(v)),
            Literal::None => Some(ConverterArg::None),
            _ => None,
        };
    }
    if let Some(name) = expr.dotted_name() {
        return Some(ConverterArg::Name(name));
    }
    match expr {
        Expr::Display(DisplayKind::Set | DisplayKind::List | DisplayKind::Tuple, items) => items
            .iter()
            .map(converter_arg)
            .collect::<Option<Vec<_>>>()
            .map(ConverterArg::Set),
        _ => None,
    }
}

/// Result of default-value classification
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedDefault {
    pub value: DefaultValue,
    pub py_default: Option<String>,
    pub c_default: Option<String>,
}

/// Classify a default expression. `c_default` is the explicit native
/// override, if the annotation supplied one.
pub fn classify_default(expr: &Expr, source: &str, c_default: Option<&str>) -> DslResult<ClassifiedDefault> {
    let has_override = c_default.is_some_and(|c| !c.is_empty());

    if c_default.is_none() {
        if let Some(shape) = expr.first_unrepresentable() {
            log::trace!("default {:?} rejected: contains {:?}", source, shape);
            return Err(DslError::semantic(format!(
                "Unsupported expression as default value: {:?}",
                source
            )));
        }
    }

    let needs_override = |message: String| -> DslResult<()> {
        if has_override {
            Ok(())
        } else {
            Err(DslError::semantic(message))
        }
    };

    match expr {
        Expr::Name(name) if name == "NULL" => Ok(ClassifiedDefault {
            value: DefaultValue::Null,
            py_default: Some("<unrepresentable>".to_string()),
            c_default: Some("NULL".to_string()),
        }),
        Expr::Binary { .. } | Expr::Unary { .. } if !expr.is_signed_number() => {
            needs_override(format!(
                "When you specify an expression ({:?}) as your default value, you MUST specify a valid c_default.",
                source
            ))?;
            Ok(ClassifiedDefault {
                value: DefaultValue::Expression(source.to_string()),
                py_default: Some(source.to_string()),
                c_default: None,
            })
        }
        Expr::Attribute { .. } => {
            let dotted = expr.dotted_name().ok_or_else(|| {
                DslError::semantic(format!(
                    "Unsupported default value {:?} (looked like a Python constant)",
                    source
                ))
            })?;
            needs_override(format!(
                "When you specify a named constant ({:?}) as your default value, you MUST specify a valid c_default.",
                dotted
            ))?;
            Ok(ClassifiedDefault {
                value: DefaultValue::Expression(dotted.clone()),
                py_default: Some(dotted),
                c_default: None,
            })
        }
        _ => match expr.literal_value() {
            Some(lit) => Ok(ClassifiedDefault {
                py_default: Some(lit.repr()),
                c_default: Some(lit.native()),
                value: DefaultValue::Literal(lit),
            }),
            None => {
                needs_override(format!(
                    "When you specify a named constant ({:?}) as your default value, you MUST specify a valid c_default.",
                    source
                ))?;
                Ok(ClassifiedDefault {
                    value: DefaultValue::Expression(source.to_string()),
                    py_default: Some(source.to_string()),
                    c_default: None,
                })
            }
        },
    }
}

/// Names are unique, except that the first parameter's name may be reused
/// under an alias
pub fn check_unique_name(function: &Function, name: &str, alias: Option<&str>) -> DslResult<()> {
    let mut names = function.parameters.values().map(|p| p.name.as_str());
    let first = names.next();
    if names.any(|n| n == name) {
        return Err(DslError::lexical(format!(
            "You can't have two parameters named {:?}!",
            name
        )));
    }
    if first == Some(name) && alias.is_none() {
        return Err(DslError::lexical(format!(
            "Parameter {:?} requires a custom C name",
            name
        )));
    }
    Ok(())
}
