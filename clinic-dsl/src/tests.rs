#[cfg(test)]
mod tests {
    use super::super::*;
    use clinic_common::ClinicError;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn parse(registry: &mut Registry, input: &str) -> Result<Block, ClinicError> {
        parse_block(registry, &NameCatalog::standard(), input)
    }

    /// Parse one block into a fresh registry and return the single function
    fn function(input: &str) -> Function {
        let mut registry = Registry::new();
        let block = parse(&mut registry, input).unwrap();
        let id = block
            .signatures
            .iter()
            .find_map(|s| match s {
                Signature::Function(id) => Some(*id),
                _ => None,
            })
            .unwrap();
        registry.function(id).clone()
    }

    fn error(input: &str) -> ClinicError {
        let mut registry = Registry::new();
        parse(&mut registry, input).unwrap_err()
    }

    fn signature_of(f: &Function) -> &str {
        f.docstring.lines().next().unwrap()
    }

    #[test]
    fn test_module_level_parameters() {
        let f = function(indoc! {"
            module m
            m.f
                p1: int
                p2: object

            Summary.
        "});
        assert_eq!(f.docstring, "f($module, /, p1, p2)\n--\n\nSummary.");
        assert_eq!(f.c_basename, "m_f");
        assert_eq!(f.parameters.len(), 3);
        assert!(f.parameters["module"].converter.is_receiver());
    }

    #[test]
    fn test_slash_makes_preceding_positional_only() {
        let f = function(indoc! {"
            module m
            m.f
                a: int
                /
                b: int

            Summary.
        "});
        assert_eq!(signature_of(&f), "f($module, a, /, b)");
        assert_eq!(f.parameters["a"].kind, ParameterKind::PositionalOnly);
        assert_eq!(f.parameters["b"].kind, ParameterKind::PositionalOrKeyword);
    }

    #[test]
    fn test_star_makes_following_keyword_only() {
        let f = function(indoc! {"
            module m
            m.f
                a: int
                *
                b: int = 1

            Summary.
        "});
        assert_eq!(signature_of(&f), "f($module, /, a, *, b=1)");
        assert_eq!(f.parameters["b"].kind, ParameterKind::KeywordOnly);
        assert_eq!(f.parameters["b"].c_default.as_deref(), Some("1"));
    }

    #[test]
    fn test_group_before_required() {
        let f = function(indoc! {"
            module m
            m.f
                [
                a: int
                ]
                b: int

            Summary.
        "});
        assert_eq!(f.docstring, "f([a,] b)\nSummary.");
        assert!(f.docstring_only);
        assert_eq!(f.parameters["a"].group.signed(), -1);
        assert_eq!(f.parameters["b"].group, Group::NONE);
        assert!(f.parameters.values().all(|p| p.is_positional_only()));
    }

    #[test]
    fn test_groups_on_both_sides() {
        let f = function(indoc! {"
            module m
            m.f
                [
                a: int
                ]
                b: int
                [
                c: int
                [
                d: int
                ]
                ]

            Summary.
        "});
        assert_eq!(signature_of(&f), "f([a,] b, [c, [d]])");
        assert_eq!(f.parameters["a"].group.signed(), -1);
        assert_eq!(f.parameters["c"].group.signed(), 1);
        assert_eq!(f.parameters["d"].group.signed(), 2);
    }

    #[test]
    fn test_groups_cannot_mix_with_keyword_only() {
        let err = error(indoc! {"
            module m
            m.f
                a: int
                [
                b: int
                ]
                *
                c: int
        "});
        assert!(err.message().contains("unsupported group configuration"), "{}", err);
    }

    #[test]
    fn test_one_line_docstring_gains_blank_line() {
        let f = function("module m\nm.f\n\nDo the thing.\n");
        assert_eq!(f.docstring, "f($module, /)\n--\n\nDo the thing.");
    }

    #[test]
    fn test_two_line_summary_rejected() {
        let err = error(indoc! {"
            module m
            m.f

            First line.
            Second line.
        "});
        assert!(matches!(err, ClinicError::Docstring { .. }));
        assert_eq!(
            err.message(),
            "Docstring for \"m.f\" does not have a summary line!\n\
             Every non-blank function docstring must start with a single line summary followed by an empty line."
        );
    }

    #[test]
    fn test_permit_long_summary() {
        let f = function(indoc! {"
            module m
            @permit_long_summary
            m.f

            First line.
            Second line.
        "});
        assert!(f.permit_long_summary);
        assert!(f.docstring.ends_with("First line.\nSecond line."));
    }

    #[test]
    fn test_parameter_docstrings() {
        let f = function(indoc! {r#"
            module m
            m.f
                a: int
                    The a.
                b: str = "x"
                    The b,
                    over two lines.

            Summary.
        "#});
        assert_eq!(
            f.docstring,
            indoc! {"
                f($module, /, a, b='x')
                --

                Summary.

                  a
                    The a.
                  b
                    The b,
                    over two lines."}
        );
        assert_eq!(f.parameters["b"].docstring, "The b,\nover two lines.");
    }

    #[test]
    fn test_explicit_parameters_marker() {
        let f = function(indoc! {"
            module m
            m.f
                a: int
                    The a.

            Summary.

            {parameters}
            Trailing notes.
        "});
        assert_eq!(
            f.docstring,
            "f($module, /, a)\n--\n\nSummary.\n\n  a\n    The a.\n\nTrailing notes."
        );
    }

    #[test]
    fn test_parameters_marker_twice() {
        let err = error(indoc! {"
            module m
            m.f

            Summary.

            {parameters}
            {parameters}
        "});
        assert_eq!(
            err.message(),
            "You may not specify {parameters} more than once in a docstring!"
        );
    }

    #[test]
    fn test_long_summary_is_a_warning() {
        let mut registry = Registry::new();
        let catalog = NameCatalog::standard();
        let summary = "x".repeat(80);
        let mut block = Block::new(format!("module m\nm.f\n\n{}\n", summary));
        let mut parser = DslParser::new(&mut registry, &catalog);
        parser.parse(&mut block, &ParseOptions::default()).unwrap();
        let warnings: Vec<_> = parser.reporter().warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.starts_with("Summary line for \"m.f\" is longer than 72"));
    }

    #[test]
    fn test_non_ascii_docstring_warns() {
        let mut registry = Registry::new();
        let catalog = NameCatalog::standard();
        let mut block = Block::new("module m\nm.f\n\nCaf\u{e9} au lait.\n");
        let mut parser = DslParser::new(&mut registry, &catalog);
        parser.parse(&mut block, &ParseOptions::new("m.c", 20)).unwrap();

        let warnings: Vec<_> = parser.reporter().warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].message,
            "Non-ascii characters are not allowed in docstrings: '\u{e9}'"
        );
        assert_eq!(warnings[0].location.line, 23);
        assert_eq!(warnings[0].category, clinic_common::Category::Style);
        assert!(!parser.reporter().has_errors());
    }

    #[test]
    fn test_defaults() {
        let f = function(indoc! {"
            module m
            m.f
                a: object = None
                b: object = NULL
                c: int = -1
                d: Py_ssize_t(c_default='PY_SSIZE_T_MAX') = sys.maxsize

            Summary.
        "});
        assert_eq!(
            signature_of(&f),
            "f($module, /, a=None, b=<unrepresentable>, c=-1, d=sys.maxsize)"
        );
        assert_eq!(f.parameters["a"].c_default.as_deref(), Some("Py_None"));
        assert_eq!(f.parameters["b"].default, DefaultValue::Null);
        assert_eq!(f.parameters["d"].c_default.as_deref(), Some("PY_SSIZE_T_MAX"));
    }

    #[test]
    fn test_named_constant_needs_c_default() {
        let err = error("module m\nm.f\n    a: int = sys.maxsize\n");
        assert_eq!(
            err.message(),
            "When you specify a named constant (\"sys.maxsize\") as your default value, you MUST specify a valid c_default."
        );
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_default_ordering() {
        let err = error("module m\nm.f\n    a: int = 1\n    b: int\n");
        assert_eq!(
            err.message(),
            "Can't have a parameter without a default (\"b\") after a parameter with a default!"
        );
        // keyword-only parameters are exempt
        let f = function("module m\nm.f\n    a: int = 1\n    *\n    b: int\n\nSummary.\n");
        assert_eq!(signature_of(&f), "f($module, /, a=1, *, b)");
    }

    #[test]
    fn test_varargs() {
        let f = function(indoc! {"
            module m
            m.f
                a: object
                *args: object
                key: object = None

            Summary.
        "});
        assert_eq!(signature_of(&f), "f($module, /, a, *args, key=None)");
        assert_eq!(f.parameters["args"].kind, ParameterKind::VarPositional);
        assert_eq!(f.parameters["args"].c_default.as_deref(), Some("NULL"));
        assert_eq!(f.parameters["key"].kind, ParameterKind::KeywordOnly);
    }

    #[test]
    fn test_vararg_after_star() {
        let err = error("module m\nm.f\n    *\n    a: int\n    *args: object\n");
        assert_eq!(err.message(), "Function \"f\" uses '*' more than once.");
    }

    #[test]
    fn test_line_continuation() {
        let f = function(indoc! {r#"
            module m
            m.f
                a: int(c_default="0") \
                    = 5

            Summary.
        "#});
        assert_eq!(f.parameters["a"].py_default.as_deref(), Some("5"));
        assert_eq!(f.parameters["a"].c_default.as_deref(), Some("0"));
    }

    #[test]
    fn test_trailing_continuation() {
        let err = error("module m\nm.f\n    a: int \\\n");
        assert!(err.message().ends_with("ends with a line continuation"));
    }

    #[test]
    fn test_class_methods_and_receivers() {
        let mut registry = Registry::new();
        let block = parse(
            &mut registry,
            indoc! {r#"
                module m
                class m.C "CObject *" "CType"
                m.C.meth
                    x: int

                Summary.
            "#},
        )
        .unwrap();
        assert_eq!(block.signatures.len(), 3);
        let f = registry.find_function("m.C.meth").unwrap();
        assert_eq!(signature_of(f), "meth($self, /, x)");
        assert_eq!(
            f.parameters["self"].converter.kwargs["type"],
            ConverterArg::Str("CObject *".to_string())
        );

        let f = function(indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            @classmethod
            m.C.__new__
                x: int

            Create a C.
        "#});
        assert_eq!(f.kind, FunctionKind::MethodNew);
        assert_eq!(f.c_basename, "m_C");
        assert_eq!(f.docstring, "C(x)\n--\n\nCreate a C.");
    }

    #[test]
    fn test_static_method_receiver() {
        let f = function(indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            @staticmethod
            m.C.make
                x: int

            Make one.
        "#});
        assert_eq!(f.kind, FunctionKind::StaticMethod);
        assert!(f.parameters.contains_key("null"));
        assert_eq!(signature_of(&f), "make(x)");
    }

    #[test]
    fn test_explicit_receiver_and_defining_class() {
        let f = function(indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            m.C.meth
                me: self
                cls: defining_class
                x: int

            Summary.
        "#});
        assert_eq!(signature_of(&f), "meth($me, /, x)");
        assert_eq!(
            f.parameters.keys().collect::<Vec<_>>(),
            vec!["me", "cls", "x"]
        );

        let err = error("module m\nm.f\n    cls: defining_class\n");
        assert_eq!(
            err.message(),
            "A 'defining_class' parameter cannot be defined at module level."
        );
        let err = error("module m\nm.f\n    a: int\n    me: self\n");
        assert_eq!(
            err.message(),
            "A 'self' parameter, if specified, must be the very first thing in the parameter block."
        );
    }

    #[test]
    fn test_constructor_rules() {
        let err = error(indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            m.C.__new__
        "#});
        assert_eq!(err.message(), "'__new__' must be a class method!");
        let err = error(indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            m.C.__init__ -> int
        "#});
        assert_eq!(err.message(), "__init__ methods cannot define a return type");
        let err = error("module m\nm.__len__\n");
        assert!(err.message().contains("is a special method"));
    }

    #[test]
    fn test_getters() {
        let f = function(indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            @getter
            m.C.size
        "#});
        assert_eq!(f.kind, FunctionKind::Getter);
        assert_eq!(f.docstring, "");

        let err = error(indoc! {r#"
            module m
            class m.C "CObject *" "CType"
            @setter
            m.C.size
                value: int
        "#});
        assert_eq!(err.message(), "@setter methods cannot define parameters");
    }

    #[test]
    fn test_return_converters() {
        let f = function("module m\nm.f -> Py_ssize_t\n\nSummary.\n");
        assert_eq!(f.return_converter.name, "Py_ssize_t");
        let err = error("module m\nm.f -> 'i'\n");
        assert_eq!(err.message(), "Legacy converter \"i\" not allowed as a return converter");
        let err = error("module m\nm.f -> nope\n");
        assert_eq!(err.message(), "No available return converter called \"nope\"");
    }

    #[test]
    fn test_deprecation_markers() {
        let f = function(indoc! {"
            module m
            m.f
                a: int
                / [from 3.14]
                b: int
                * [from 3.15]
                c: int
                *
                d: int

            Summary.
        "});
        assert_eq!(f.parameters["a"].deprecated_keyword, Some(Version::new(3, 14)));
        assert_eq!(f.parameters["a"].kind, ParameterKind::PositionalOrKeyword);
        assert_eq!(f.parameters["b"].deprecated_keyword, None);
        assert_eq!(f.parameters["c"].deprecated_positional, Some(Version::new(3, 15)));
        assert_eq!(f.parameters["d"].kind, ParameterKind::KeywordOnly);
    }

    #[test]
    fn test_marker_errors() {
        let cases = [
            ("    a: int\n    /\n    /\n", "Function \"f\" uses '/' more than once."),
            ("    a: int\n    *\n    *\n", "Function \"f\" uses '*' more than once."),
            (
                "    a: int\n    *\n    * [from 3.14]\n",
                "Function \"f\": '* [from ...]' must precede '*'",
            ),
            (
                "    a: int\n    * [from 3.12]\n    b: int\n    * [from 3.14]\n",
                "Function \"f\": '* [from 3.14]' must precede '* [from 3.12]'",
            ),
            (
                "    a: int\n    / [from 3.14]\n    / [from 3.12]\n",
                "Function \"f\": '/ [from 3.12]' must precede '/ [from 3.14]'",
            ),
            (
                "    a: int\n    *\n    b: int\n    /\n",
                "Function \"f\" mixes keyword-only and positional-only parameters, which is unsupported.",
            ),
            ("    a: int\n    *\n", "Function \"f\" specifies '*' without following parameters."),
            (
                "    a: int\n    * [from 3.14]\n",
                "Function \"f\" specifies '* [from ...]' without following parameters.",
            ),
            ("    [ [from 3.14]\n", "'[from ...]' is only allowed on '*' and '/', not on '['"),
            ("    ]\n", "Function \"f\" has a ']' without a matching '['."),
            ("    [\n    a: int\n", "Function \"f\" has a '[' without a matching ']'."),
            (
                "    [\n    ]\n",
                "Function \"f\" has an empty group. All groups must contain at least one parameter.",
            ),
        ];
        for (params, expected) in cases {
            let err = error(&format!("module m\nm.f\n{}", params));
            assert_eq!(err.message(), expected, "for {:?}", params);
        }
    }

    #[test]
    fn test_parameter_names() {
        let err = error("module m\nm.f\n    a: int\n    a: int\n");
        assert_eq!(err.message(), "You can't have two parameters named \"a\"!");
        let err = error("module m\nm.f\n    module: int\n");
        assert_eq!(err.message(), "Parameter \"module\" requires a custom C name");
        let f = function("module m\nm.f\n    module as mod: int\n\nSummary.\n");
        assert!(f.parameters.contains_key("module_as_mod"));
    }

    #[test]
    fn test_invalid_declarations() {
        let err = error("module m\nm.f\n    a: int, b: int\n");
        assert!(err.message().contains("invalid parameter declaration (comma?)"));
        let err = error("module m\nm.f\n    **kwargs: object\n");
        assert!(err.message().contains("invalid parameter declaration (**kwargs?)"));
        let err = error("module m\nm.f\n    a: bogus\n");
        assert_eq!(err.message(), "\"bogus\" is not a valid converter");
    }

    #[test]
    fn test_lexical_errors_carry_lines() {
        let err = error("module m\nm.f\n\ta: int\n");
        assert!(matches!(err, ClinicError::Lexical { .. }));
        assert_eq!(err.line(), Some(3));

        let err = error("module m\nm.f\n    a: int\n  b: int\n");
        assert_eq!(err.message(), "Illegal outdent.");
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_text_after_function_end() {
        let err = error(indoc! {"
            module m
                m.f
                Summary.
            stray
        "});
        assert_eq!(err.message(), "Unexpected text after the end of function \"m.f\"");
        assert_eq!(err.line(), Some(4));
    }

    #[test]
    fn test_comments_are_skipped() {
        let f = function(indoc! {"
            module m
            # a comment
            m.f
                # between parameters
                a: int

            Summary.
            # not part of the docstring
        "});
        assert_eq!(f.docstring, "f($module, /, a)\n--\n\nSummary.");
    }

    #[test]
    fn test_text_signature() {
        let f = function(indoc! {"
            module m
            @text_signature \"($module, /, *args)\"
            m.f

            Summary.
        "});
        assert_eq!(f.docstring, "f($module, /, *args)\n--\n\nSummary.");
    }

    #[test]
    fn test_modifiers() {
        let f = function(indoc! {"
            module m
            @coexist
            @critical_section a b
            @disable fastcall
            m.f

            Summary.
        "});
        assert!(f.coexist);
        assert!(f.critical_section);
        assert_eq!(f.target_critical_section, vec!["a", "b"]);
        assert!(f.disable_fastcall);

        let cases = [
            ("@staticmethod\n@classmethod\n", "Can't set @classmethod, function is not a normal callable"),
            ("@getter\n@setter\n", "Cannot apply both @getter and @setter to the same function!"),
            ("@coexist\n@coexist\n", "Called @coexist twice!"),
            ("@critical_section a b c\n", "Up to 2 critical section variables are supported"),
            ("@disable\n", "@disable expects at least one argument"),
            ("@bogus\n", "Unknown directive \"@bogus\""),
        ];
        for (lines, expected) in cases {
            let err = error(&format!("module m\n{}m.f\n", lines));
            assert!(matches!(err, ClinicError::Directive { .. }));
            assert_eq!(err.message(), expected);
        }
    }

    #[test]
    fn test_directives() {
        let mut registry = Registry::new();
        let block = parse(
            &mut registry,
            indoc! {r#"
                module m
                set line_prefix "{block comment start} "
                destination scratch new buffer
                output everything scratch
                output push
                output preset block
                output pop
                dump scratch
                printout hello   "big world"
            "#},
        )
        .unwrap();
        assert_eq!(block.output, "hello big world\n");
        assert_eq!(registry.config.line_prefix, "/* ");
        assert_eq!(registry.routing()["impl_definition"].destination, "scratch");
        assert_eq!(block.signatures, vec![Signature::Module(registry.module_and_class(&["m"]).unwrap().0)]);

        let err = error("module\n");
        assert_eq!(err.message(), "Directive \"module\" takes exactly 1 argument(s) (0 given)");
        let err = error("output pop\n");
        assert_eq!(err.message(), "Can't 'output pop', stack is empty!");
        let err = error("set width 10\n");
        assert_eq!(err.message(), "unknown variable \"width\"");
        let err = error("destination x frob\n");
        assert_eq!(err.message(), "unknown destination command \"frob\"");
    }

    #[test]
    fn test_preserve() {
        let mut registry = Registry::new();
        let mut block = Block::new("preserve\n");
        block.output = "existing output".to_string();
        let catalog = NameCatalog::standard();
        DslParser::new(&mut registry, &catalog)
            .parse(&mut block, &ParseOptions::default())
            .unwrap();
        assert_eq!(block.output, "existing output");

        let err = error("preserve\nprintout x\n");
        assert_eq!(
            err.message(),
            "'preserve' only works for blocks that don't produce any output!"
        );
        let err = error("preserve\npreserve\n");
        assert_eq!(err.message(), "Can't have 'preserve' twice in one block!");
    }

    #[test]
    fn test_same_input_same_model() {
        let input = indoc! {"
            module m
            m.f
                a: int
                /
                b: str = 'x'
                    The b.

            Summary.
        "};
        assert_eq!(function(input), function(input));
    }

    #[test]
    fn test_signature_wrapping() {
        let f = function(indoc! {"
            module m
            m.function_with_a_long_name
                first_parameter: object
                second_parameter: object
                third_parameter: object = None

            Summary.
        "});
        let signature: Vec<&str> = f.docstring.split("\n--\n").next().unwrap().lines().collect();
        assert_eq!(signature.len(), 2);
        assert!(signature.iter().all(|line| line.len() < 72));
        assert!(signature[1].starts_with(&" ".repeat("function_with_a_long_name(".len())));
    }

    #[test]
    fn test_integer_defaults_keep_full_precision() {
        let big = "99999999999999999999999999999999999999999";
        let f = function(&format!(
            "module m\nm.f\n    x: object = {big}\n    y: object = -0x{hex}\n\nSummary.\n",
            hex = "f".repeat(40)
        ));
        assert_eq!(f.parameters["x"].py_default.as_deref(), Some(big));
        assert_eq!(f.parameters["x"].c_default.as_deref(), Some(big));

        // 16**40 - 1
        let expected = "-1461501637330902918203684832716283019655932542975";
        assert_eq!(f.parameters["y"].py_default.as_deref(), Some(expected));
        assert_eq!(f.parameters["y"].c_default.as_deref(), Some(expected));
        assert!(signature_of(&f).contains(&format!("x={big}")));
    }

    #[test]
    fn test_deeply_nested_default_is_rejected() {
        let nested = format!("{}1{}", "(".repeat(50_000), ")".repeat(50_000));
        let err = error(&format!("module m\nm.f\n    x: object = {nested}\n"));
        assert_eq!(err.line(), Some(3));
        assert!(err.message().contains("(unsupported syntax: expression nested too deeply)"));

        let f = function("module m\nm.f\n    x: object = ((((1))))\n\nSummary.\n");
        assert_eq!(f.parameters["x"].py_default.as_deref(), Some("1"));
    }

    #[test]
    fn test_composing_twice_gives_the_stored_docstring() {
        let mut registry = Registry::new();
        parse(
            &mut registry,
            indoc! {"
                module m
                m.f
                    [
                    a: int
                        The a.
                    ]
                    b: int
                        The b,
                        over two lines.
                    [
                    c: object
                        The c.
                    ]

                Summary.

                {parameters}
                Trailing notes.
            "},
        )
        .unwrap();
        let f = registry.find_function("m.f").unwrap();
        assert!(f.docstring.contains("  b\n    The b,\n    over two lines."));

        let first = DocstringComposer::new(f, 72).compose().unwrap();
        let second = DocstringComposer::new(f, 72).compose().unwrap();
        assert_eq!(first.text, f.docstring);
        assert_eq!(second.text, f.docstring);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rejected_block_leaves_registry_untouched() {
        let mut registry = Registry::new();
        parse(&mut registry, "module m\nm.kept\n\nSummary.\n").unwrap();
        let before = registry.clone();

        let err = parse(
            &mut registry,
            indoc! {r#"
                module m.sub
                class m.C "CObject *" "&C_Type"
                destination scratch new buffer
                set line_prefix "// "
                output push
                output everything scratch
                m.C.g
                    a: int
                    a: int
            "#},
        )
        .unwrap_err();
        assert_eq!(err.message(), "You can't have two parameters named \"a\"!");
        assert_eq!(registry, before);

        parse(&mut registry, "module m.sub\nclass m.C \"CObject *\" \"&C_Type\"\n").unwrap();
        assert!(registry.find_function("m.kept").is_ok());
    }
}
