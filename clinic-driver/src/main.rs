//! Argument Clinic DSL Driver
//!
//! Parses one pre-extracted declaration block per input file, in order,
//! into a single registry, then prints the composed docstrings or the
//! parsed model as JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use clinic_common::Diagnostic;
use clinic_dsl::{Block, DslParser, Function, NameCatalog, ParseOptions, Registry, Signature};
use log::{debug, info};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[clap(name = "clinic", version, about = "Argument Clinic DSL declaration parser")]
struct Args {
    /// Files holding one declaration block each
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Output format
    #[clap(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Prefix added to filenames in diagnostics
    #[clap(long, value_name = "PREFIX")]
    filename_prefix: Option<String>,

    /// Accept an extra parameter converter name
    #[clap(long = "converter", value_name = "NAME")]
    converters: Vec<String>,

    /// Accept an extra return converter name
    #[clap(long = "return-converter", value_name = "NAME")]
    return_converters: Vec<String>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Serialize)]
struct BlockReport<'a> {
    file: String,
    output: &'a str,
    functions: Vec<&'a Function>,
}

#[derive(Serialize)]
struct Report<'a> {
    blocks: Vec<BlockReport<'a>>,
    diagnostics: &'a [Diagnostic],
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        env_logger::init();
    }

    let mut catalog = NameCatalog::standard();
    for name in &args.converters {
        catalog.add_converter(name.as_str());
    }
    for name in &args.return_converters {
        catalog.add_return_converter(name.as_str());
    }

    let mut registry = Registry::new();
    let mut parser = DslParser::new(&mut registry, &catalog);
    let mut parsed = Vec::new();
    for path in &args.inputs {
        let mut block =
            Block::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let filename = match &args.filename_prefix {
            Some(prefix) => format!("{}{}", prefix, path.display()),
            None => path.display().to_string(),
        };
        match parser.parse(&mut block, &ParseOptions::new(filename.clone(), 1)) {
            Ok(()) => {
                debug!("{}: {} signatures", filename, block.signatures.len());
                parsed.push((filename, block));
            }
            Err(err) => info!("{}", err),
        }
    }
    let reporter = parser.reporter().clone();
    drop(parser);

    match args.format {
        Format::Text => {
            for (_, block) in &parsed {
                print!("{}", block.output);
                for function in functions_of(&registry, block) {
                    println!(
                        "{} ({} parameters)",
                        function.full_name,
                        function.declared_parameters().count()
                    );
                    if !function.docstring.is_empty() {
                        println!("{}", function.docstring);
                    }
                    println!();
                }
            }
            reporter.print_diagnostics();
        }
        Format::Json => {
            let report = Report {
                blocks: parsed
                    .iter()
                    .map(|(file, block)| BlockReport {
                        file: file.clone(),
                        output: &block.output,
                        functions: functions_of(&registry, block),
                    })
                    .collect(),
                diagnostics: reporter.diagnostics(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if reporter.has_errors() {
        bail!("{}", reporter.summary());
    }
    Ok(())
}

fn functions_of<'a>(registry: &'a Registry, block: &Block) -> Vec<&'a Function> {
    block
        .signatures
        .iter()
        .filter_map(|signature| match signature {
            Signature::Function(id) => Some(registry.function(*id)),
            _ => None,
        })
        .collect()
}
