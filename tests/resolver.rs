#[cfg(test)]
mod resolver_tests {
    use pretty_assertions::assert_eq;

    use walkjs as js;

    use js::interpreter::Interpreter;
    use js::parser::Parser;
    use js::resolver::Resolver;
    use js::scanner::scan_all;

    fn resolve_errors(source: &str) -> Vec<String> {
        let (tokens, _) = scan_all(source);
        let statements = Parser::new(&tokens)
            .parse()
            .unwrap_or_else(|errors| panic!("parse errors: {:?}", errors));

        let mut interpreter = Interpreter::new();
        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_resolver_01_clean_program() {
        let source = "
            var a = 1;
            function f(x) { var y = x + a; return y; }
            class C { constructor(v) { this.v = v; return; } get() { return this.v; } }
            { var b = f(2); print b; }
        ";

        assert!(resolve_errors(source).is_empty());
    }

    #[test]
    fn test_resolver_02_own_initializer() {
        assert_eq!(
            resolve_errors("{ var a = 1; { var a = a; } }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_resolver_03_global_self_reference_is_not_static() {
        assert!(resolve_errors("var a = a;").is_empty());
    }

    #[test]
    fn test_resolver_04_redeclaration_in_local_scope() {
        assert_eq!(
            resolve_errors("{ var a; var a; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            resolve_errors("function f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );

        // globals may be redeclared
        assert!(resolve_errors("var a; var a;").is_empty());
    }

    #[test]
    fn test_resolver_05_return_rules() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        assert_eq!(
            resolve_errors("class A {\n constructor() {\n return 1;\n }\n}"),
            vec!["[line 3] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_resolver_06_this_outside_class() {
        assert_eq!(
            resolve_errors("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve_errors("function f() { return this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_resolver_07_collects_every_error() {
        let errors = resolve_errors("return;\n{ var x; var x; }\nprint this;");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at 'return': Can't return from top-level code.",
                "[line 2] Error at 'x': Already a variable with this name in this scope.",
                "[line 3] Error at 'this': Can't use 'this' outside of a class.",
            ]
        );
    }

    #[test]
    fn test_resolver_08_array_and_index_operands_are_checked() {
        assert_eq!(
            resolve_errors("{ var a = [a]; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
        assert_eq!(
            resolve_errors("{ var i = xs[i]; }"),
            vec!["[line 1] Error at 'i': Can't read local variable in its own initializer."]
        );
    }
}
