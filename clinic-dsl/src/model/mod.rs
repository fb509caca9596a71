//! Signature model: functions, parameters and converters

pub mod converter;
pub mod function;
pub mod parameter;

pub use converter::{Converter, ConverterArg, ConverterCatalog, ConverterRole, ConverterSpec, NameCatalog};
pub use function::{Function, FunctionKind};
pub use parameter::{DefaultValue, Group, GroupSide, Parameter, ParameterKind};
