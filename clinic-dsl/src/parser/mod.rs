//! Line-oriented state machine for declaration blocks
//!
//! Each line of a block is routed to the handler for the current state.
//! A handler either consumes the line or switches state and hands the
//! same line to the next handler:
//!
//! ```text
//! DslStart -> ModuleNameName -> ParametersStart -> Parameter <-> ParameterDocstring
//!                   |                  |              |               |
//!                   +------------------+--------------+---------------+--> FunctionDocstring -> Finished
//! ```
//!
//! The function under construction is only committed to the registry
//! once the whole block parsed; any error restores the registry to its
//! state before the block.

mod directives;
mod functions;
mod parameters;

use clinic_common::{ClinicError, ErrorReporter, SourceLocation};
use log::{debug, trace, warn};

use crate::block::{Block, ParseOptions};
use crate::docstring::DocstringComposer;
use crate::errors::{DslError, DslResult};
use crate::groups::ParameterGroupState;
use crate::indent::IndentTracker;
use crate::model::{ConverterCatalog, Function, FunctionKind};
use crate::registry::{Registry, Signature};
use crate::version::Version;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    DslStart,
    ModuleNameName,
    ParametersStart,
    Parameter,
    ParameterDocstringStart,
    ParameterDocstring,
    FunctionDocstring,
    Finished,
}

/// Per-function modifiers collected from `@name` lines
#[derive(Debug, Clone)]
struct Modifiers {
    kind: FunctionKind,
    coexist: bool,
    critical_section: bool,
    target_critical_section: Vec<String>,
    disable_fastcall: bool,
    forced_text_signature: Option<String>,
    permit_long_summary: bool,
    permit_long_docstring_body: bool,
}

impl Default for Modifiers {
    fn default() -> Self {
        Self {
            kind: FunctionKind::Callable,
            coexist: false,
            critical_section: false,
            target_critical_section: Vec::new(),
            disable_fastcall: false,
            forced_text_signature: None,
            permit_long_summary: false,
            permit_long_docstring_body: false,
        }
    }
}

pub struct DslParser<'a> {
    registry: &'a mut Registry,
    catalog: &'a dyn ConverterCatalog,
    reporter: ErrorReporter,

    state: State,
    indent: IndentTracker,
    function: Option<Function>,
    groups: ParameterGroupState,
    keyword_only: bool,
    positional_only: bool,
    deprecated_positional: Option<Version>,
    deprecated_keyword: Option<Version>,
    parameter_continuation: Option<String>,
    parameter_docstring_indent: usize,
    modifiers: Modifiers,
    preserve_output: bool,
    output: String,
    signatures: Vec<Signature>,
    location: SourceLocation,
}

impl<'a> DslParser<'a> {
    pub fn new(registry: &'a mut Registry, catalog: &'a dyn ConverterCatalog) -> Self {
        Self {
            registry,
            catalog,
            reporter: ErrorReporter::new(),
            state: State::DslStart,
            indent: IndentTracker::new(),
            function: None,
            groups: ParameterGroupState::new(),
            keyword_only: false,
            positional_only: false,
            deprecated_positional: None,
            deprecated_keyword: None,
            parameter_continuation: None,
            parameter_docstring_indent: 0,
            modifiers: Modifiers::default(),
            preserve_output: false,
            output: String::new(),
            signatures: Vec::new(),
            location: SourceLocation::dummy(),
        }
    }

    /// Warnings and failures recorded so far
    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    fn reset(&mut self) {
        self.state = State::DslStart;
        self.indent = IndentTracker::new();
        self.function = None;
        self.groups = ParameterGroupState::new();
        self.keyword_only = false;
        self.positional_only = false;
        self.deprecated_positional = None;
        self.deprecated_keyword = None;
        self.parameter_continuation = None;
        self.parameter_docstring_indent = 0;
        self.modifiers = Modifiers::default();
        self.preserve_output = false;
        self.output.clear();
        self.signatures.clear();
    }

    /// Parse one block. On failure the registry and `block.output` are
    /// left exactly as they were.
    pub fn parse(&mut self, block: &mut Block, options: &ParseOptions) -> Result<(), ClinicError> {
        self.reset();
        let checkpoint = self.registry.checkpoint();

        match self.parse_lines(&block.input, options) {
            Ok(()) => {
                if !self.preserve_output {
                    block.output = std::mem::take(&mut self.output);
                }
                block.signatures = std::mem::take(&mut self.signatures);
                Ok(())
            }
            Err(err) => {
                self.registry.rollback(checkpoint);
                self.function = None;
                debug!("block at {} rejected: {}", self.location, err.message());
                self.reporter.report(&err);
                Err(err)
            }
        }
    }

    fn parse_lines(&mut self, input: &str, options: &ParseOptions) -> Result<(), ClinicError> {
        self.location = SourceLocation::new(&options.filename, options.first_line);
        for (offset, line) in input.split('\n').enumerate() {
            let line_number = options.first_line.saturating_add(offset as u32);
            self.location = self.location.with_line(line_number);
            self.handle_line(line)
                .map_err(|e| e.at(self.location.clone()))?;
        }
        self.finish_block().map_err(|e| e.at(self.location.clone()))
    }

    fn handle_line(&mut self, line: &str) -> DslResult<()> {
        if line.contains('\t') {
            return Err(DslError::lexical(
                "Tab characters are illegal in the Argument Clinic DSL.",
            ));
        }
        match self.state {
            State::DslStart => self.state_dsl_start(line),
            State::ModuleNameName => self.state_modulename_name(line),
            State::ParametersStart => self.state_parameters_start(line),
            State::Parameter => self.state_parameter(line),
            State::ParameterDocstringStart => self.state_parameter_docstring_start(line),
            State::ParameterDocstring => self.state_parameter_docstring(line),
            State::FunctionDocstring => self.state_function_docstring(line),
            State::Finished => self.state_finished(line),
        }
    }

    /// Switch state, optionally re-dispatching the current line
    fn next(&mut self, state: State, line: Option<&str>) -> DslResult<()> {
        trace!("{:?} -> {:?} at {}", self.state, state, self.location);
        self.state = state;
        match line {
            Some(line) => self.handle_line(line),
            None => Ok(()),
        }
    }

    /// Blank and comment lines carry nothing outside docstrings
    fn valid_line(line: &str) -> bool {
        let stripped = line.trim();
        !stripped.is_empty() && !stripped.starts_with('#')
    }

    fn current_function(&mut self) -> DslResult<&mut Function> {
        self.function
            .as_mut()
            .ok_or_else(|| DslError::internal("No function is being declared"))
    }

    fn warn(&mut self, message: String) {
        warn!("{}: {}", self.location, message);
        self.reporter.warning(message, self.location.clone());
    }

    fn state_dsl_start(&mut self, line: &str) -> DslResult<()> {
        if !Self::valid_line(line) {
            return Ok(());
        }
        let keyword = line.split_whitespace().next().unwrap_or_default();
        match directives::lookup(keyword) {
            Some(directive) => {
                let fields = directives::shell_split(line)?;
                let args = fields.get(1..).unwrap_or_default();
                self.run_directive(directive, keyword, args)
            }
            None if keyword.starts_with('@') => Err(DslError::directive(format!(
                "Unknown directive {:?}",
                keyword
            ))),
            None => self.next(State::ModuleNameName, Some(line)),
        }
    }

    fn state_parameter_docstring_start(&mut self, line: &str) -> DslResult<()> {
        self.parameter_docstring_indent = self.indent.margin();
        self.next(State::ParameterDocstring, Some(line))
    }

    fn state_parameter_docstring(&mut self, line: &str) -> DslResult<()> {
        if line.trim_start().starts_with('#') {
            return Ok(());
        }
        let indent = self.indent.measure(line)?;
        if indent < self.parameter_docstring_indent {
            self.indent.infer(line)?;
            let state = if self.indent.depth() == 2 {
                State::Parameter
            } else {
                State::FunctionDocstring
            };
            return self.next(state, Some(line));
        }

        let text = self.docstring_line(line)?;
        let function = self.current_function()?;
        let parameter = function
            .parameters
            .values_mut()
            .next_back()
            .ok_or_else(|| DslError::internal("Parameter docstring without a parameter"))?;
        append_docstring(&mut parameter.docstring, text);
        Ok(())
    }

    fn state_function_docstring(&mut self, line: &str) -> DslResult<()> {
        if line.trim_start().starts_with('#') {
            return Ok(());
        }
        if !line.trim().is_empty() && self.indent.measure(line)? < self.indent.margin() {
            let name = self.current_function()?.name.clone();
            debug!("function {:?} ends at {}", name, self.location);
            return self.next(State::Finished, Some(line));
        }

        let text = self.docstring_line(line)?;
        let function = self.current_function()?;
        append_docstring(&mut function.raw_docstring, text);
        Ok(())
    }

    fn state_finished(&mut self, line: &str) -> DslResult<()> {
        if !Self::valid_line(line) {
            return Ok(());
        }
        let name = self
            .function
            .as_ref()
            .map(|f| f.full_name.clone())
            .unwrap_or_default();
        Err(DslError::lexical(format!(
            "Unexpected text after the end of function {:?}",
            name
        )))
    }

    /// Dedent a docstring line; `None` for blank lines
    fn docstring_line(&mut self, line: &str) -> DslResult<Option<String>> {
        let non_ascii: Vec<String> = line
            .chars()
            .filter(|c| !c.is_ascii())
            .map(|c| format!("{:?}", c))
            .collect();
        if !non_ascii.is_empty() {
            self.warn(format!(
                "Non-ascii characters are not allowed in docstrings: {}",
                non_ascii.join(", ")
            ));
        }
        let stripped = line.trim_end();
        if stripped.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.indent.dedent(stripped)?.to_string()))
    }

    fn finish_block(&mut self) -> DslResult<()> {
        if let Some(function) = self.function.take() {
            if self.parameter_continuation.is_some() {
                return Err(DslError::lexical(format!(
                    "Function {:?} ends with a line continuation",
                    function.name
                )));
            }
            let function = self.seal_function(function)?;
            debug!(
                "committing {:?} ({} parameters)",
                function.full_name,
                function.parameters.len()
            );
            let id = self.registry.commit_function(function);
            self.signatures.push(Signature::Function(id));
        }

        if self.preserve_output && !self.output.is_empty() {
            return Err(DslError::directive(
                "'preserve' only works for blocks that don't produce any output!",
            ));
        }
        Ok(())
    }

    /// Final checks and docstring composition
    fn seal_function(&mut self, mut function: Function) -> DslResult<Function> {
        self.groups.finish(&function.name)?;
        self.check_remaining_star(&function)?;
        parameters::apply_group_kinds(&mut function)?;

        for parameter in function.parameters.values_mut() {
            let trimmed = parameter.docstring.trim_end().len();
            parameter.docstring.truncate(trimmed);
        }
        let trimmed = function.raw_docstring.trim_end().len();
        function.raw_docstring.truncate(trimmed);

        let width = self.registry.config.docstring_width;
        let composed = DocstringComposer::new(&function, width).compose()?;
        for warning in composed.warnings {
            self.warn(warning);
        }
        function.docstring = composed.text;
        Ok(function)
    }
}

fn append_docstring(docstring: &mut String, line: Option<String>) {
    if !docstring.is_empty() {
        docstring.push('\n');
    }
    if let Some(line) = line {
        docstring.push_str(&line);
    }
}

/// Parse one block against a registry with default options
pub fn parse_block(
    registry: &mut Registry,
    catalog: &dyn ConverterCatalog,
    input: &str,
) -> Result<Block, ClinicError> {
    let mut block = Block::new(input);
    DslParser::new(registry, catalog).parse(&mut block, &ParseOptions::default())?;
    Ok(block)
}
