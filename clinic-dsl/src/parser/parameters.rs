//! Parameter-section handlers: markers, declarations and continuations

use super::{DslParser, State};
use crate::declaration::{check_unique_name, classify_line, DeclarationParser, ParameterLine};
use crate::errors::{DslError, DslResult};
use crate::groups::GroupState;
use crate::model::{Function, Group, GroupSide, Parameter, ParameterKind};
use crate::version::Version;

/// Grouped functions are positional-only throughout
pub(super) fn apply_group_kinds(function: &mut Function) -> DslResult<()> {
    if !function.has_groups() {
        return Ok(());
    }
    if function
        .parameters
        .values()
        .any(|p| p.is_keyword_only() || p.is_vararg())
    {
        return Err(DslError::semantic(format!(
            "Function {:?} cannot mix optional groups with keyword-only parameters or *args.",
            function.name
        )));
    }
    for parameter in function.parameters.values_mut() {
        parameter.kind = ParameterKind::PositionalOnly;
    }
    Ok(())
}

impl DslParser<'_> {
    pub(super) fn state_parameters_start(&mut self, line: &str) -> DslResult<()> {
        if !Self::valid_line(line) {
            return Ok(());
        }
        match self.indent.infer(line)? {
            0 => self.next(State::FunctionDocstring, Some(line)),
            n if n < 0 => self.next(State::Finished, Some(line)),
            _ => {
                let kind = self.current_function()?.kind;
                if kind.is_accessor() {
                    return Err(DslError::semantic(format!(
                        "@{} methods cannot define parameters",
                        kind
                    )));
                }
                self.next(State::Parameter, Some(line))
            }
        }
    }

    pub(super) fn state_parameter(&mut self, line: &str) -> DslResult<()> {
        if !Self::valid_line(line) {
            return Ok(());
        }
        let line = match self.parameter_continuation.take() {
            Some(head) => format!("{} {}", head, line.trim_start()),
            None => line.to_string(),
        };

        match self.indent.infer(&line)? {
            0 => {}
            n if n < 0 => return self.next(State::FunctionDocstring, Some(&line)),
            _ => return self.next(State::ParameterDocstringStart, Some(&line)),
        }

        let stripped = line.trim_end();
        if let Some(head) = stripped.strip_suffix('\\') {
            self.parameter_continuation = Some(head.to_string());
            return Ok(());
        }
        match classify_line(stripped.trim_start())? {
            ParameterLine::Star(version) => self.parse_star(version),
            ParameterLine::Slash(version) => self.parse_slash(version),
            ParameterLine::OpenGroup => self.parse_open_group(),
            ParameterLine::CloseGroup => self.parse_close_group(),
            ParameterLine::Parameter(text) => self.parse_parameter(text),
        }
    }

    fn function_name(&mut self) -> DslResult<String> {
        Ok(self.current_function()?.name.clone())
    }

    fn parse_star(&mut self, version: Option<Version>) -> DslResult<()> {
        let name = self.function_name()?;
        let Some(version) = version else {
            if self.keyword_only {
                return Err(DslError::semantic(format!(
                    "Function {:?} uses '*' more than once.",
                    name
                )));
            }
            self.check_current_star()?;
            self.keyword_only = true;
            return Ok(());
        };

        if self.keyword_only {
            return Err(DslError::semantic(format!(
                "Function {:?}: '* [from ...]' must precede '*'",
                name
            )));
        }
        if let Some(previous) = self.deprecated_positional {
            if previous == version {
                return Err(DslError::semantic(format!(
                    "Function {:?} uses '* [from {}]' more than once.",
                    name, version
                )));
            }
            if previous < version {
                return Err(DslError::semantic(format!(
                    "Function {:?}: '* [from {}]' must precede '* [from {}]'",
                    name, version, previous
                )));
            }
            self.check_current_star()?;
        }
        self.deprecated_positional = Some(version);
        Ok(())
    }

    fn parse_slash(&mut self, version: Option<Version>) -> DslResult<()> {
        let name = self.function_name()?;
        let fail = |message: String| -> DslResult<()> { Err(DslError::semantic(message)) };

        match version {
            None => {
                if let Some(keyword) = self.deprecated_keyword {
                    return fail(format!("Function {:?}: '/' must precede '/ [from {}]'", name, keyword));
                }
                if let Some(positional) = self.deprecated_positional {
                    return fail(format!("Function {:?}: '/' must precede '* [from {}]'", name, positional));
                }
                if self.keyword_only {
                    return fail(format!(
                        "Function {:?} mixes keyword-only and positional-only parameters, which is unsupported.",
                        name
                    ));
                }
                if self.positional_only {
                    return fail(format!("Function {:?} uses '/' more than once.", name));
                }
            }
            Some(version) => {
                if let Some(previous) = self.deprecated_keyword {
                    if version == previous {
                        return fail(format!(
                            "Function {:?} uses '/ [from {}]' more than once.",
                            name, version
                        ));
                    }
                    if version < previous {
                        return fail(format!(
                            "Function {:?}: '/ [from {}]' must precede '/ [from {}]'",
                            name, version, previous
                        ));
                    }
                }
                if let Some(positional) = self.deprecated_positional {
                    return fail(format!(
                        "Function {:?}: '/ [from {}]' must precede '* [from {}]'",
                        name, version, positional
                    ));
                }
                if self.keyword_only {
                    return fail(format!("Function {:?}: '/ [from {}]' must precede '*'", name, version));
                }
            }
        }

        self.positional_only = true;
        self.deprecated_keyword = version;
        if version.is_some() {
            let preceded = self
                .current_function()?
                .last_parameter()
                .is_some_and(|p| p.kind == ParameterKind::PositionalOrKeyword);
            if !preceded {
                return fail(format!(
                    "Function {:?} specifies '/ [from ...]' without preceding parameters.",
                    name
                ));
            }
        }
        self.groups.check_slash(&name)?;

        let function = self.current_function()?;
        for p in function.parameters.values_mut() {
            if p.kind != ParameterKind::PositionalOrKeyword {
                continue;
            }
            match version {
                None => p.kind = ParameterKind::PositionalOnly,
                Some(version) => {
                    if p.deprecated_keyword.is_none() {
                        p.deprecated_keyword = Some(version);
                    }
                }
            }
        }
        Ok(())
    }

    fn parse_open_group(&mut self) -> DslResult<()> {
        let name = self.function_name()?;
        self.groups.open_group(&name)?;
        self.current_function()?.docstring_only = true;
        Ok(())
    }

    fn parse_close_group(&mut self) -> DslResult<()> {
        let name = self.function_name()?;
        let depth = self.groups.depth();
        let members = self
            .current_function()?
            .parameters
            .values()
            .filter(|p| p.group.depth == depth && p.group.side == GroupSide::After)
            .count();
        self.groups.close_group(&name, members)
    }

    fn parse_parameter(&mut self, text: &str) -> DslResult<()> {
        let name = self.function_name()?;
        let declaration = DeclarationParser::new(&name).parse(text)?;

        if declaration.is_vararg {
            if self.keyword_only {
                return Err(DslError::semantic(format!(
                    "Function {:?} uses '*' more than once.",
                    name
                )));
            }
            self.check_current_star()?;
        }

        let needs_default_check = !self.keyword_only && !declaration.is_vararg;
        let admission = self.groups.admit_parameter(
            &name,
            &declaration.name,
            declaration.has_default,
            needs_default_check,
        )?;
        if admission.entered_required {
            for p in self.current_function()?.parameters.values_mut() {
                if p.group.is_grouped() {
                    p.group.side = GroupSide::Before;
                }
            }
        }

        let converter = declaration.converter.resolve(self.catalog)?;
        let mut kind = if declaration.is_vararg {
            ParameterKind::VarPositional
        } else if self.keyword_only {
            ParameterKind::KeywordOnly
        } else {
            ParameterKind::PositionalOrKeyword
        };

        let required = self.groups.state() == GroupState::Required;
        let depth = self.groups.depth();
        let function = self
            .function
            .as_mut()
            .ok_or_else(|| DslError::internal("No function is being declared"))?;

        if converter.is_receiver() || converter.is_defining_class() {
            let what = if converter.is_receiver() { "self" } else { "defining_class" };
            if function.parameters.len() != 1 {
                return Err(DslError::semantic(if converter.is_receiver() {
                    "A 'self' parameter, if specified, must be the very first thing in the parameter block.".to_string()
                } else {
                    "A 'defining_class' parameter, if specified, must either be the first thing in the parameter block, or come just after 'self'.".to_string()
                }));
            }
            if !required {
                return Err(DslError::semantic(format!(
                    "A '{}' parameter cannot be marked optional.",
                    what
                )));
            }
            if declaration.has_default {
                return Err(DslError::semantic(format!(
                    "A '{}' parameter cannot have a default value.",
                    what
                )));
            }
            if depth > 0 {
                return Err(DslError::semantic(format!(
                    "A '{}' parameter cannot be in an optional group.",
                    what
                )));
            }
            if converter.is_defining_class() && function.class.is_none() {
                return Err(DslError::semantic(
                    "A 'defining_class' parameter cannot be defined at module level.",
                ));
            }
            kind = ParameterKind::PositionalOnly;
            if converter.is_receiver() {
                function.parameters.clear();
                self.groups.restart();
            }
        }

        check_unique_name(function, &declaration.name, declaration.alias.as_deref())?;

        let mut parameter = Parameter::new(declaration.name, kind, converter);
        parameter.alias = declaration.alias;
        parameter.default = declaration.default;
        parameter.py_default = declaration.py_default;
        parameter.c_default = declaration.c_default;
        parameter.group = if depth > 0 { Group::new(depth) } else { Group::NONE };
        if kind == ParameterKind::PositionalOrKeyword {
            parameter.deprecated_positional = self.deprecated_positional;
        }
        function.parameters.insert(parameter.key(), parameter);

        if declaration.is_vararg {
            self.keyword_only = true;
        }
        Ok(())
    }

    fn check_current_star(&self) -> DslResult<()> {
        match self.function.as_ref() {
            Some(function) => self.check_remaining_star(function),
            None => Ok(()),
        }
    }

    /// A pending `*` or `* [from ...]` must be followed by a parameter
    pub(super) fn check_remaining_star(&self, function: &Function) -> DslResult<()> {
        let symbol = if self.keyword_only {
            "*"
        } else if self.deprecated_positional.is_some() {
            "* [from ...]"
        } else {
            return Ok(());
        };
        let satisfied = function.last_parameter().is_some_and(|p| {
            if self.keyword_only {
                p.is_keyword_only() || p.is_vararg()
            } else {
                p.deprecated_positional == self.deprecated_positional
            }
        });
        if satisfied {
            return Ok(());
        }
        Err(DslError::semantic(format!(
            "Function {:?} specifies '{}' without following parameters.",
            function.name, symbol
        )))
    }
}
