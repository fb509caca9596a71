//! Named output buffers and the routing of generated sections to them

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::errors::{DslError, DslResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DestinationKind {
    Buffer,
    File,
    Suppress,
    TwoPass,
}

impl DestinationKind {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "buffer" => Some(DestinationKind::Buffer),
            "file" => Some(DestinationKind::File),
            "suppress" => Some(DestinationKind::Suppress),
            "two-pass" => Some(DestinationKind::TwoPass),
            _ => None,
        }
    }
}

impl fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DestinationKind::Buffer => "buffer",
            DestinationKind::File => "file",
            DestinationKind::Suppress => "suppress",
            DestinationKind::TwoPass => "two-pass",
        })
    }
}

const BUFFERS_PER_DESTINATION: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Destination {
    pub name: String,
    pub kind: DestinationKind,
    /// Filename template for `file` destinations
    pub template: Option<String>,
    buffers: Vec<String>,
}

impl Destination {
    /// Create a destination from the arguments of `destination NAME new TYPE [FILENAME]`
    pub fn new(name: &str, kind: &str, args: &[String]) -> DslResult<Self> {
        let parsed = DestinationKind::parse(kind).ok_or_else(|| {
            DslError::directive(format!(
                "Invalid destination type {:?} for {}, must be buffer, file, suppress, two-pass",
                kind, name
            ))
        })?;
        let expected = usize::from(parsed == DestinationKind::File);
        if args.len() < expected {
            return Err(DslError::directive(format!(
                "Not enough arguments for destination {:?} new {:?}",
                name, kind
            )));
        }
        if args.len() > expected {
            return Err(DslError::directive(format!(
                "Too many arguments for destination {:?} new {:?}",
                name, kind
            )));
        }
        Ok(Self {
            name: name.to_string(),
            kind: parsed,
            template: args.first().cloned(),
            buffers: vec![String::new(); BUFFERS_PER_DESTINATION],
        })
    }

    pub fn clear(&mut self) -> DslResult<()> {
        if self.kind != DestinationKind::Buffer {
            return Err(DslError::directive(format!(
                "Can't clear destination {:?}: it's not of type 'buffer'",
                self.name
            )));
        }
        self.buffers.iter_mut().for_each(String::clear);
        Ok(())
    }

    /// Take the accumulated text of every buffer, leaving them empty
    pub fn dump(&mut self) -> String {
        self.buffers.iter_mut().map(std::mem::take).collect()
    }
}

/// A slot a generated section can be routed to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferRef {
    pub destination: String,
    pub index: usize,
}

impl BufferRef {
    fn new(destination: &str, index: usize) -> Self {
        Self {
            destination: destination.to_string(),
            index,
        }
    }
}

pub const OUTPUT_FIELDS: &[&str] = &[
    "cpp_if",
    "docstring_prototype",
    "docstring_definition",
    "methoddef_define",
    "impl_prototype",
    "parser_prototype",
    "parser_definition",
    "cpp_endif",
    "methoddef_ifndef",
    "impl_definition",
];

pub type Routing = IndexMap<String, BufferRef>;

/// Routing before any `output` directive
pub fn default_routing() -> Routing {
    [
        ("cpp_if", "file", 0),
        ("docstring_prototype", "suppress", 0),
        ("docstring_definition", "file", 0),
        ("methoddef_define", "file", 0),
        ("impl_prototype", "file", 0),
        ("parser_prototype", "suppress", 0),
        ("parser_definition", "file", 0),
        ("cpp_endif", "file", 0),
        ("methoddef_ifndef", "file", 1),
        ("impl_definition", "block", 0),
    ]
    .into_iter()
    .map(|(field, dest, index)| (field.to_string(), BufferRef::new(dest, index)))
    .collect()
}

// Each preset starts from `everything <first>` and then overrides fields
const PRESETS: &[(&str, &str, &[(&str, &str, usize)])] = &[
    (
        "block",
        "block",
        &[
            ("methoddef_ifndef", "buffer", 1),
            ("docstring_prototype", "suppress", 0),
            ("parser_prototype", "suppress", 0),
            ("cpp_if", "suppress", 0),
            ("cpp_endif", "suppress", 0),
        ],
    ),
    (
        "original",
        "block",
        &[
            ("methoddef_ifndef", "buffer", 1),
            ("docstring_prototype", "suppress", 0),
            ("parser_prototype", "suppress", 0),
            ("cpp_if", "suppress", 0),
            ("cpp_endif", "suppress", 0),
        ],
    ),
    (
        "file",
        "file",
        &[
            ("methoddef_ifndef", "file", 1),
            ("docstring_prototype", "suppress", 0),
            ("parser_prototype", "suppress", 0),
            ("impl_definition", "block", 0),
        ],
    ),
    (
        "buffer",
        "buffer",
        &[
            ("methoddef_ifndef", "buffer", 1),
            ("impl_definition", "block", 0),
            ("docstring_prototype", "suppress", 0),
            ("impl_prototype", "suppress", 0),
            ("parser_prototype", "suppress", 0),
        ],
    ),
    (
        "partial-buffer",
        "buffer",
        &[
            ("methoddef_ifndef", "buffer", 1),
            ("docstring_prototype", "block", 0),
            ("impl_prototype", "suppress", 0),
            ("methoddef_define", "block", 0),
            ("parser_prototype", "block", 0),
            ("impl_definition", "block", 0),
        ],
    ),
];

/// Routing table for a named preset
pub fn preset(name: &str) -> Option<Routing> {
    let (_, everything, overrides) = PRESETS.iter().find(|(preset, _, _)| *preset == name)?;
    let mut routing: Routing = OUTPUT_FIELDS
        .iter()
        .map(|field| (field.to_string(), BufferRef::new(everything, 0)))
        .collect();
    for (field, dest, index) in overrides.iter() {
        routing.insert(field.to_string(), BufferRef::new(dest, *index));
    }
    Some(routing)
}

/// The destinations every registry starts with
pub fn default_destinations() -> IndexMap<String, Destination> {
    let make = |name: &str, kind: DestinationKind, template: Option<&str>| Destination {
        name: name.to_string(),
        kind,
        template: template.map(str::to_string),
        buffers: vec![String::new(); BUFFERS_PER_DESTINATION],
    };
    [
        make("block", DestinationKind::Buffer, None),
        make("suppress", DestinationKind::Suppress, None),
        make("buffer", DestinationKind::Buffer, None),
        make("file", DestinationKind::File, Some("{dirname}/clinic/{basename}.h")),
    ]
    .into_iter()
    .map(|d| (d.name.clone(), d))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_destination_arity() {
        assert!(Destination::new("out", "buffer", &[]).is_ok());
        assert!(Destination::new("out", "file", &[]).is_err());
        assert!(Destination::new("out", "buffer", &["x".to_string()]).is_err());
        let err = Destination::new("out", "pipe", &[]).unwrap_err();
        assert!(err.message().starts_with("Invalid destination type \"pipe\""));
    }

    #[test]
    fn test_dump_and_clear() {
        let mut dest = Destination::new("b", "buffer", &[]).unwrap();
        dest.buffers[0].push_str("one ");
        dest.buffers[1].push_str("two");
        assert_eq!(dest.dump(), "one two");
        assert_eq!(dest.dump(), "");

        dest.buffers[1].push_str("stale");
        dest.clear().unwrap();
        assert_eq!(dest.dump(), "");

        let mut file = Destination::new("f", "file", &["{dirname}/clinic/{basename}.h".to_string()]).unwrap();
        assert_eq!(file.template.as_deref(), Some("{dirname}/clinic/{basename}.h"));
        assert!(file.clear().is_err());
        assert!(Destination::new("s", "suppress", &[]).unwrap().clear().is_err());
    }

    #[test]
    fn test_presets() {
        let routing = preset("partial-buffer").unwrap();
        assert_eq!(routing.len(), OUTPUT_FIELDS.len());
        assert_eq!(routing["parser_definition"], BufferRef::new("buffer", 0));
        assert_eq!(routing["methoddef_define"], BufferRef::new("block", 0));
        assert!(preset("nonsense").is_none());
        assert_eq!(default_routing()["methoddef_ifndef"], BufferRef::new("file", 1));
    }
}
