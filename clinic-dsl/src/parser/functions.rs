//! Declaration-name lines: `module.name [as c_name] [-> ret]` and clones

use indexmap::IndexMap;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{DslParser, Modifiers, State};
use crate::declaration::classify_annotation;
use crate::errors::{DslError, DslResult};
use crate::expr::parse_expression;
use crate::model::{Converter, ConverterArg, Function, FunctionKind, Parameter, ParameterKind};
use crate::registry::ClassId;

static C_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Special methods that have their own slot signatures
const UNSUPPORTED_SPECIAL_METHODS: &[&str] = &[
    "__abs__", "__add__", "__and__", "__call__", "__delitem__", "__divmod__", "__eq__",
    "__float__", "__floordiv__", "__ge__", "__getattr__", "__getattribute__", "__getitem__",
    "__gt__", "__hash__", "__iadd__", "__iand__", "__ifloordiv__", "__ilshift__", "__imatmul__",
    "__imod__", "__imul__", "__index__", "__int__", "__invert__", "__ior__", "__ipow__",
    "__irshift__", "__isub__", "__iter__", "__itruediv__", "__ixor__", "__le__", "__len__",
    "__lshift__", "__lt__", "__matmul__", "__mod__", "__mul__", "__ne__", "__neg__", "__next__",
    "__or__", "__pos__", "__pow__", "__radd__", "__rand__", "__rdivmod__", "__repr__",
    "__rfloordiv__", "__rlshift__", "__rmatmul__", "__rmod__", "__rmul__", "__ror__", "__rpow__",
    "__rrshift__", "__rshift__", "__rsub__", "__rtruediv__", "__rxor__", "__setattr__",
    "__setitem__", "__str__", "__sub__", "__truediv__", "__xor__",
];

pub(super) fn is_legal_c_identifier(text: &str) -> bool {
    C_IDENTIFIER.is_match(text)
}

/// Dotted identifiers such as `module.Class.method`
pub(super) fn is_legal_py_identifier(text: &str) -> bool {
    text.split('.').all(is_legal_c_identifier)
}

/// Split `full.name [as c_basename]`
pub(super) fn parse_function_names(line: &str) -> DslResult<(String, String)> {
    let (left, c_basename) = match line.split_once(" as ") {
        Some((left, right)) => {
            let right = right.trim();
            if right.is_empty() {
                return Err(DslError::semantic("No C basename provided after 'as' keyword"));
            }
            (left, right.to_string())
        }
        None => (line, String::new()),
    };
    let full_name = left.trim().to_string();
    let c_basename = if c_basename.is_empty() {
        let mut fields: Vec<&str> = full_name.split('.').collect();
        if fields.last() == Some(&"__new__") {
            fields.pop();
        }
        fields.join("_")
    } else {
        c_basename
    };

    if !is_legal_py_identifier(&full_name) {
        return Err(DslError::semantic(format!(
            "Illegal function name: {:?}",
            full_name
        )));
    }
    if !is_legal_c_identifier(&c_basename) {
        return Err(DslError::semantic(format!(
            "Illegal C basename: {:?}",
            c_basename
        )));
    }
    Ok((full_name, c_basename))
}

/// Resolve the final kind from the requested modifier and the method name
pub(super) fn normalize_function_kind(
    name: &str,
    requested: FunctionKind,
    class: Option<ClassId>,
) -> DslResult<FunctionKind> {
    if UNSUPPORTED_SPECIAL_METHODS.contains(&name) {
        return Err(DslError::semantic(format!(
            "{:?} is a special method and cannot be converted to Argument Clinic!",
            name
        )));
    }
    let constructor = match name {
        "__new__" => FunctionKind::MethodNew,
        "__init__" => FunctionKind::MethodInit,
        _ => return Ok(requested),
    };
    if class.is_none() {
        return Err(DslError::semantic(format!(
            "'{}' must be a method of a class!",
            name
        )));
    }
    match (constructor, requested) {
        (FunctionKind::MethodNew, FunctionKind::ClassMethod) => Ok(FunctionKind::MethodNew),
        (FunctionKind::MethodNew, _) => Err(DslError::semantic("'__new__' must be a class method!")),
        (_, FunctionKind::Callable) => Ok(FunctionKind::MethodInit),
        (_, kind) => Err(DslError::semantic(format!(
            "'__init__' must be a normal method; got '{}'!",
            kind
        ))),
    }
}

impl DslParser<'_> {
    pub(super) fn state_modulename_name(&mut self, line: &str) -> DslResult<()> {
        if !Self::valid_line(line) {
            return Ok(());
        }
        self.indent.infer(line)?;

        if let Some((before, existing)) = line.rsplit_once('=') {
            let existing = existing.trim();
            if is_legal_py_identifier(existing) {
                return self.parse_cloned_function(before, existing);
            }
        }

        let (names, returns) = match line.split_once("->") {
            Some((names, returns)) => (names, returns.trim()),
            None => (line, ""),
        };
        let (full_name, c_basename) = parse_function_names(names)?;
        let fields: Vec<&str> = full_name.split('.').collect();
        let Some((name, parents)) = fields.split_last() else {
            return Err(DslError::semantic(format!("Illegal function name: {:?}", full_name)));
        };
        let (module, class) = self.registry.module_and_class(parents)?;
        let kind = normalize_function_kind(name, self.modifiers.kind, class)?;
        let return_converter = self.resolve_return_converter(&full_name, kind, returns)?;

        let modifiers = std::mem::take(&mut self.modifiers);
        let mut function = Function {
            name: name.to_string(),
            display_name: self.display_name(name, kind, class),
            full_name: full_name.clone(),
            c_basename,
            module,
            class,
            kind,
            parameters: IndexMap::new(),
            return_converter,
            raw_docstring: String::new(),
            docstring: String::new(),
            coexist: modifiers.coexist,
            critical_section: modifiers.critical_section,
            target_critical_section: modifiers.target_critical_section,
            disable_fastcall: modifiers.disable_fastcall,
            forced_text_signature: modifiers.forced_text_signature,
            permit_long_summary: modifiers.permit_long_summary,
            permit_long_docstring_body: modifiers.permit_long_docstring_body,
            docstring_only: false,
        };
        self.add_receiver(&mut function);
        debug!("declaring {} {:?}", function.kind, full_name);

        self.function = Some(function);
        self.next(State::ParametersStart, None)
    }

    /// Name shown in the calling-convention line
    fn display_name(&self, name: &str, kind: FunctionKind, class: Option<ClassId>) -> String {
        match class {
            Some(cls) if kind.is_constructor() => self.registry.class(cls).name.clone(),
            _ => name.to_string(),
        }
    }

    fn resolve_return_converter(
        &self,
        full_name: &str,
        kind: FunctionKind,
        returns: &str,
    ) -> DslResult<Converter> {
        if returns.is_empty() {
            let int_result = matches!(kind, FunctionKind::MethodInit | FunctionKind::Setter);
            return Ok(Converter::default_return(int_result));
        }
        if kind.is_accessor() {
            return Err(DslError::semantic(format!(
                "@{} method cannot define a return type",
                kind
            )));
        }
        if kind == FunctionKind::MethodInit {
            return Err(DslError::semantic("__init__ methods cannot define a return type"));
        }
        let badly_formed = || {
            DslError::semantic(format!(
                "Badly formed annotation for {:?}: {:?}",
                full_name, returns
            ))
        };
        let expr = parse_expression(returns).map_err(|_| badly_formed())?;
        let spec = classify_annotation(&expr).map_err(|_| badly_formed())?;
        spec.resolve_return(self.catalog)
    }

    /// Insert the implicit receiver as the first parameter
    fn add_receiver(&self, function: &mut Function) {
        let name = function.kind.receiver_name(function.class.is_some());
        let mut converter = Converter::receiver();
        if let Some(cls) = function.class {
            let typed = matches!(
                function.kind,
                FunctionKind::Callable
                    | FunctionKind::MethodInit
                    | FunctionKind::Getter
                    | FunctionKind::Setter
            );
            if typed {
                let typedef = self.registry.class(cls).typedef.clone();
                converter
                    .kwargs
                    .insert("type".to_string(), ConverterArg::Str(typedef));
            }
        }
        let receiver = Parameter::new(name, ParameterKind::PositionalOnly, converter);
        function.parameters.insert(receiver.key(), receiver);
    }

    /// `new.name [as c_name] = existing.name`
    fn parse_cloned_function(&mut self, names: &str, existing: &str) -> DslResult<()> {
        let (full_name, c_basename) = parse_function_names(names)?;
        let fields: Vec<&str> = full_name.split('.').collect();
        let Some((name, parents)) = fields.split_last() else {
            return Err(DslError::semantic(format!("Illegal function name: {:?}", full_name)));
        };
        let (module, class) = self.registry.module_and_class(parents)?;
        let kind = normalize_function_kind(name, self.modifiers.kind, class)?;

        if self.modifiers.forced_text_signature.is_some() {
            return Err(DslError::semantic(
                "Cannot use @text_signature when cloning a function",
            ));
        }
        let source = self.registry.find_function(existing)?.clone();
        let compatible = source.kind == kind || (source.kind.is_constructor() && kind.is_constructor());
        if !compatible {
            return Err(DslError::semantic(
                "'kind' of function and cloned function don't match! (@classmethod/@staticmethod/@coexist)",
            ));
        }

        let modifiers: Modifiers = std::mem::take(&mut self.modifiers);
        let mut function = source;
        function.name = name.to_string();
        function.display_name = self.display_name(name, kind, class);
        function.full_name = full_name.clone();
        function.c_basename = c_basename;
        function.module = module;
        function.class = class;
        function.kind = kind;
        function.raw_docstring.clear();
        function.docstring.clear();
        function.permit_long_summary = modifiers.permit_long_summary;
        function.permit_long_docstring_body = modifiers.permit_long_docstring_body;
        debug!("cloning {:?} as {:?}", existing, full_name);

        self.function = Some(function);
        self.next(State::FunctionDocstring, None)
    }
}
