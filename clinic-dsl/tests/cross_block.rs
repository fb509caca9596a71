//! Behaviour that spans several blocks parsed into one registry

use clinic_dsl::{parse_block, Block, DslParser, NameCatalog, ParseOptions, Registry, Signature};
use indoc::indoc;
use pretty_assertions::assert_eq;

#[test]
fn test_clone_copies_parameters() {
    let mut registry = Registry::new();
    let catalog = NameCatalog::standard();
    parse_block(
        &mut registry,
        &catalog,
        indoc! {"
            module m
            m.original
                a: int
                    The a.
                /
                b: object = None

            Do the original thing.
        "},
    )
    .unwrap();

    let block = parse_block(
        &mut registry,
        &catalog,
        indoc! {"
            m.copy as m_copy_impl = m.original

            Do it again.
        "},
    )
    .unwrap();

    let copy = registry.find_function("m.copy").unwrap();
    let original = registry.find_function("m.original").unwrap();
    assert_eq!(copy.c_basename, "m_copy_impl");
    assert_eq!(copy.parameters, original.parameters);
    assert_eq!(
        copy.docstring,
        "copy($module, a, /, b=None)\n--\n\nDo it again.\n\n  a\n    The a."
    );
    assert_eq!(block.signatures.len(), 1);
}

#[test]
fn test_clone_kind_mismatch() {
    let mut registry = Registry::new();
    let catalog = NameCatalog::standard();
    parse_block(
        &mut registry,
        &catalog,
        indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            m.C.meth
                x: int

            Summary.
        "#},
    )
    .unwrap();

    let err = parse_block(&mut registry, &catalog, "@classmethod\nm.C.other = m.C.meth\n").unwrap_err();
    assert_eq!(
        err.message(),
        "'kind' of function and cloned function don't match! (@classmethod/@staticmethod/@coexist)"
    );
    let err = parse_block(&mut registry, &catalog, "m.C.other = m.C.missing\n").unwrap_err();
    assert_eq!(err.message(), "Couldn't find existing function \"m.C.missing\"!");
}

#[test]
fn test_failed_block_leaves_registry_untouched() {
    let mut registry = Registry::new();
    let catalog = NameCatalog::standard();
    parse_block(&mut registry, &catalog, "module m\n").unwrap();

    let err = parse_block(
        &mut registry,
        &catalog,
        indoc! {"
            module n
            m.f
                a: bogus
        "},
    )
    .unwrap_err();
    assert_eq!(err.line(), Some(3));

    // `n` was rolled back, so declaring it again works
    parse_block(&mut registry, &catalog, "module n\n").unwrap();
    assert_eq!(registry.functions().count(), 0);
    assert!(registry.find_function("m.f").is_err());
}

#[test]
fn test_redefinition_across_blocks() {
    let mut registry = Registry::new();
    let catalog = NameCatalog::standard();
    parse_block(&mut registry, &catalog, "module m\n").unwrap();
    let err = parse_block(&mut registry, &catalog, "module m\n").unwrap_err();
    assert_eq!(err.message(), "Already defined module \"m\"!");

    let err = parse_block(&mut registry, &catalog, "x.f\n").unwrap_err();
    assert_eq!(err.message(), "Parent class or module \"x\" does not exist.");
}

#[test]
fn test_parser_reuse_resets_state() {
    let mut registry = Registry::new();
    let catalog = NameCatalog::standard();
    let mut parser = DslParser::new(&mut registry, &catalog);

    let mut first = Block::new("module m\nm.f\n    a: int\n    *\n");
    assert!(parser.parse(&mut first, &ParseOptions::new("a.c", 10)).is_err());
    assert_eq!(parser.reporter().diagnostics()[0].location.line, 14);

    let mut second = Block::new("module m\nm.f\n    a: int\n\nSummary.\n");
    parser.parse(&mut second, &ParseOptions::new("a.c", 40)).unwrap();
    assert!(matches!(second.signatures[..], [Signature::Module(_), Signature::Function(_)]));
    assert_eq!(parser.registry().functions().count(), 1);
    assert_eq!(parser.reporter().error_count(), 1);
}

#[test]
fn test_custom_catalog() {
    let mut registry = Registry::new();
    let mut catalog = NameCatalog::standard();
    let input = "module m\nm.f\n    path: path_t\n\nSummary.\n";
    assert!(parse_block(&mut registry, &catalog, input).is_err());

    catalog.add_converter("path_t");
    let block = parse_block(&mut registry, &catalog, input).unwrap();
    assert_eq!(block.signatures.len(), 2);
}
