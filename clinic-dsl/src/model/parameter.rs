use serde::Serialize;

use super::converter::Converter;
use crate::expr::Literal;
use crate::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    KeywordOnly,
    VarPositional,
}

/// Which side of the required run an optional group sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupSide {
    Before,
    After,
}

/// Bracket nesting of a parameter; depth 0 means not grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Group {
    pub depth: usize,
    pub side: GroupSide,
}

impl Group {
    pub const NONE: Group = Group {
        depth: 0,
        side: GroupSide::After,
    };

    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            side: GroupSide::After,
        }
    }

    pub fn is_grouped(&self) -> bool {
        self.depth > 0
    }

    /// Signed form: negative before the required run, positive after
    pub fn signed(&self) -> i64 {
        let depth = self.depth as i64;
        match self.side {
            GroupSide::Before => -depth,
            GroupSide::After => depth,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    Unspecified,
    /// Defers to a native NULL; not representable in the signature
    Null,
    Literal(Literal),
    /// Anything the parser could not evaluate; rendered from overrides
    Expression(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub alias: Option<String>,
    pub kind: ParameterKind,
    pub converter: Converter,
    pub default: DefaultValue,
    /// Text shown in the calling-convention line
    pub py_default: Option<String>,
    /// Native text used by generated code
    pub c_default: Option<String>,
    pub group: Group,
    pub deprecated_positional: Option<Version>,
    pub deprecated_keyword: Option<Version>,
    pub docstring: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind, converter: Converter) -> Self {
        Self {
            name: name.into(),
            alias: None,
            kind,
            converter,
            default: DefaultValue::Unspecified,
            py_default: None,
            c_default: None,
            group: Group::NONE,
            deprecated_positional: None,
            deprecated_keyword: None,
            docstring: String::new(),
        }
    }

    /// Key in the owning function's parameter map
    pub fn key(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{}_as_{}", self.name, alias),
            None => self.name.clone(),
        }
    }

    pub fn is_positional_only(&self) -> bool {
        self.kind == ParameterKind::PositionalOnly
    }

    pub fn is_keyword_only(&self) -> bool {
        self.kind == ParameterKind::KeywordOnly
    }

    pub fn is_vararg(&self) -> bool {
        self.kind == ParameterKind::VarPositional
    }

    pub fn is_optional(&self) -> bool {
        !matches!(self.default, DefaultValue::Unspecified)
    }

    /// Whether the calling-convention line lists this parameter
    pub fn show_in_signature(&self) -> bool {
        !self.converter.is_defining_class()
    }

    /// Default text for the calling-convention line
    pub fn signature_default(&self) -> Option<String> {
        if let Some(text) = &self.py_default {
            return Some(text.clone());
        }
        match &self.default {
            DefaultValue::Unspecified => None,
            DefaultValue::Null => Some("<unrepresentable>".to_string()),
            DefaultValue::Literal(lit) => Some(lit.repr()),
            DefaultValue::Expression(text) => Some(text.clone()),
        }
    }
}
