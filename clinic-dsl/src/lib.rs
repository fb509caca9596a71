//! Argument Clinic DSL - Declaration Parser
//!
//! This crate turns one pre-extracted declaration block at a time into a
//! structured signature model:
//! - Parser: the line-oriented state machine driving everything else
//! - Declaration: parameter lines, converters and default values
//! - Groups: optional-group bookkeeping
//! - Docstring: calling-convention line and parameter documentation
//! - Registry: modules, classes and committed functions across blocks

pub mod block;
pub mod declaration;
pub mod destination;
pub mod docstring;
pub mod errors;
pub mod expr;
pub mod groups;
pub mod indent;
pub mod model;
pub mod parser;
pub mod registry;
pub mod version;

#[cfg(test)]
mod tests;

pub use block::{Block, ParseOptions};
pub use docstring::{ComposedDocstring, DocstringComposer};
pub use errors::{DslError, DslResult};
pub use groups::{GroupState, ParameterGroupState};
pub use indent::IndentTracker;
pub use model::{
    Converter, ConverterArg, ConverterCatalog, ConverterSpec, DefaultValue, Function, FunctionKind,
    Group, GroupSide, NameCatalog, Parameter, ParameterKind,
};
pub use parser::{parse_block, DslParser};
pub use registry::{ClassId, ClinicConfig, FunctionId, ModuleId, Registry, Signature};
pub use version::Version;
