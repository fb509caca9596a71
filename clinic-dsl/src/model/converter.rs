//! Converter references and the catalog seam
//!
//! The parser never knows how a converter behaves; it only checks that a
//! name exists in a catalog and records the keyword arguments it was
//! given. Code generation looks the converter up again by name.

use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::Serialize;
use std::collections::HashSet;

use crate::errors::{DslError, DslResult};

/// A keyword argument value in a converter annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ConverterArg {
    Str(String),
    Int(#[serde(serialize_with = "crate::expr::literal::serialize_decimal")] BigInt),
    Float(f64),
    Bool(bool),
    None,
    /// A bare or dotted name, such as `str` or `NoneType`
    Name(String),
    /// A set, list or tuple of the above
    Set(Vec<ConverterArg>),
}

impl ConverterArg {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConverterArg::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// What a converter does to the parameter it is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConverterRole {
    Value,
    /// `self`: replaces the implicit receiver
    Receiver,
    /// `defining_class`: passes the defining class, never shown
    DefiningClass,
}

/// A converter as written in an annotation, before catalog lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterSpec {
    pub name: String,
    pub legacy: bool,
    pub kwargs: IndexMap<String, ConverterArg>,
}

impl ConverterSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            legacy: false,
            kwargs: IndexMap::new(),
        }
    }

    pub fn legacy(code: impl Into<String>) -> Self {
        Self {
            name: code.into(),
            legacy: true,
            kwargs: IndexMap::new(),
        }
    }

    /// Check the name against the catalog and produce a parameter converter
    pub fn resolve(self, catalog: &dyn ConverterCatalog) -> DslResult<Converter> {
        if self.legacy {
            if !catalog.has_legacy_converter(&self.name) {
                return Err(DslError::semantic(format!(
                    "{:?} is not a valid legacy converter",
                    self.name
                )));
            }
        } else if !catalog.has_converter(&self.name) {
            return Err(DslError::semantic(format!(
                "{:?} is not a valid converter",
                self.name
            )));
        }
        Ok(Converter::from_spec(self))
    }

    /// Check the name against the catalog's return converters
    pub fn resolve_return(self, catalog: &dyn ConverterCatalog) -> DslResult<Converter> {
        if self.legacy {
            return Err(DslError::semantic(format!(
                "Legacy converter {:?} not allowed as a return converter",
                self.name
            )));
        }
        if !catalog.has_return_converter(&self.name) {
            return Err(DslError::semantic(format!(
                "No available return converter called {:?}",
                self.name
            )));
        }
        Ok(Converter::from_spec(self))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Converter {
    pub name: String,
    pub legacy: bool,
    pub role: ConverterRole,
    pub kwargs: IndexMap<String, ConverterArg>,
}

impl Converter {
    fn from_spec(spec: ConverterSpec) -> Self {
        let role = match (spec.legacy, spec.name.as_str()) {
            (false, "self") => ConverterRole::Receiver,
            (false, "defining_class") => ConverterRole::DefiningClass,
            _ => ConverterRole::Value,
        };
        Self {
            name: spec.name,
            legacy: spec.legacy,
            role,
            kwargs: spec.kwargs,
        }
    }

    /// The converter for an implicit receiver parameter
    pub fn receiver() -> Self {
        Self::from_spec(ConverterSpec::named("self"))
    }

    /// Return converter used when none is declared
    pub fn default_return(int_result: bool) -> Self {
        Self::from_spec(ConverterSpec::named(if int_result { "int" } else { "object" }))
    }

    pub fn is_receiver(&self) -> bool {
        self.role == ConverterRole::Receiver
    }

    pub fn is_defining_class(&self) -> bool {
        self.role == ConverterRole::DefiningClass
    }
}

/// Name lookup for the externally provided converter implementations
pub trait ConverterCatalog {
    fn has_converter(&self, name: &str) -> bool;
    fn has_legacy_converter(&self, code: &str) -> bool;
    fn has_return_converter(&self, name: &str) -> bool;
}

const STANDARD_CONVERTERS: &[&str] = &[
    "bool", "char", "unsigned_char", "short", "unsigned_short", "int", "unsigned_int", "long",
    "unsigned_long", "long_long", "unsigned_long_long", "Py_ssize_t", "slice_index", "size_t",
    "fildes", "float", "double", "Py_complex", "object", "str", "PyBytesObject",
    "PyByteArrayObject", "unicode", "Py_buffer", "self", "defining_class",
];

const STANDARD_LEGACY_CONVERTERS: &[&str] = &[
    "b", "B", "h", "H", "i", "I", "l", "k", "L", "K", "n", "c", "C", "f", "d", "D", "O", "O!",
    "O&", "S", "Y", "U", "p", "s", "s*", "s#", "z", "z*", "z#", "y", "y*", "y#", "es", "et",
    "es#", "et#", "w*", "u", "Z",
];

const STANDARD_RETURN_CONVERTERS: &[&str] = &[
    "bool", "int", "unsigned_int", "long", "unsigned_long", "Py_ssize_t", "size_t", "float",
    "double", "object", "NoneType",
];

/// A catalog that knows converters by name only
#[derive(Debug, Clone, Default)]
pub struct NameCatalog {
    converters: HashSet<String>,
    legacy: HashSet<String>,
    returns: HashSet<String>,
}

impl NameCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The converter names shipped with the generator
    pub fn standard() -> Self {
        let to_set = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            converters: to_set(STANDARD_CONVERTERS),
            legacy: to_set(STANDARD_LEGACY_CONVERTERS),
            returns: to_set(STANDARD_RETURN_CONVERTERS),
        }
    }

    pub fn add_converter(&mut self, name: impl Into<String>) {
        self.converters.insert(name.into());
    }

    pub fn add_return_converter(&mut self, name: impl Into<String>) {
        self.returns.insert(name.into());
    }
}

impl ConverterCatalog for NameCatalog {
    fn has_converter(&self, name: &str) -> bool {
        self.converters.contains(name)
    }

    fn has_legacy_converter(&self, code: &str) -> bool {
        self.legacy.contains(code)
    }

    fn has_return_converter(&self, name: &str) -> bool {
        self.returns.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown() {
        let catalog = NameCatalog::standard();
        let converter = ConverterSpec::named("int").resolve(&catalog).unwrap();
        assert_eq!(converter.role, ConverterRole::Value);

        let err = ConverterSpec::named("widget").resolve(&catalog).unwrap_err();
        assert_eq!(err.message(), "\"widget\" is not a valid converter");

        let err = ConverterSpec::legacy("q").resolve(&catalog).unwrap_err();
        assert_eq!(err.message(), "\"q\" is not a valid legacy converter");
    }

    #[test]
    fn test_roles() {
        let catalog = NameCatalog::standard();
        assert!(ConverterSpec::named("self").resolve(&catalog).unwrap().is_receiver());
        assert!(ConverterSpec::named("defining_class")
            .resolve(&catalog)
            .unwrap()
            .is_defining_class());
    }

    #[test]
    fn test_return_converters() {
        let mut catalog = NameCatalog::standard();
        assert!(ConverterSpec::legacy("i").resolve_return(&catalog).is_err());
        assert!(ConverterSpec::named("Widget").resolve_return(&catalog).is_err());
        catalog.add_return_converter("Widget");
        assert!(ConverterSpec::named("Widget").resolve_return(&catalog).is_ok());
    }
}
