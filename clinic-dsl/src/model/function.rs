use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use super::converter::Converter;
use super::parameter::Parameter;
use crate::registry::{ClassId, ModuleId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Callable,
    StaticMethod,
    ClassMethod,
    MethodNew,
    MethodInit,
    Getter,
    Setter,
}

impl FunctionKind {
    pub fn is_constructor(self) -> bool {
        matches!(self, FunctionKind::MethodNew | FunctionKind::MethodInit)
    }

    pub fn is_accessor(self) -> bool {
        matches!(self, FunctionKind::Getter | FunctionKind::Setter)
    }

    /// Name of the implicit receiver parameter
    pub fn receiver_name(self, has_class: bool) -> &'static str {
        match self {
            FunctionKind::StaticMethod => "null",
            FunctionKind::ClassMethod | FunctionKind::MethodNew => "type",
            _ if has_class => "self",
            _ => "module",
        }
    }

    /// Whether the receiver appears as `$name` in the calling-convention line
    pub fn shows_receiver(self) -> bool {
        !matches!(
            self,
            FunctionKind::StaticMethod | FunctionKind::MethodNew | FunctionKind::MethodInit
        )
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionKind::Callable => "callable",
            FunctionKind::StaticMethod => "staticmethod",
            FunctionKind::ClassMethod => "classmethod",
            FunctionKind::MethodNew => "__new__",
            FunctionKind::MethodInit => "__init__",
            FunctionKind::Getter => "getter",
            FunctionKind::Setter => "setter",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub full_name: String,
    pub c_basename: String,
    /// Name used in the calling-convention line (the class for constructors)
    pub display_name: String,
    pub module: ModuleId,
    pub class: Option<ClassId>,
    pub kind: FunctionKind,
    pub parameters: IndexMap<String, Parameter>,
    pub return_converter: Converter,
    /// Docstring as authored, dedented
    pub raw_docstring: String,
    /// Docstring with the calling-convention line and parameter docs
    pub docstring: String,
    pub coexist: bool,
    pub critical_section: bool,
    pub target_critical_section: Vec<String>,
    pub disable_fastcall: bool,
    pub forced_text_signature: Option<String>,
    pub permit_long_summary: bool,
    pub permit_long_docstring_body: bool,
    pub docstring_only: bool,
}

impl Function {
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.values().find(|p| p.name == name)
    }

    pub fn last_parameter(&self) -> Option<&Parameter> {
        self.parameters.values().next_back()
    }

    /// Parameters other than the implicit or explicit receiver
    pub fn declared_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values().filter(|p| !p.converter.is_receiver())
    }

    pub fn has_groups(&self) -> bool {
        self.parameters.values().any(|p| p.group.is_grouped())
    }
}
