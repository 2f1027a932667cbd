mod common;

#[cfg(test)]
mod interpreter_tests {
    use std::thread;

    use pretty_assertions::assert_eq;

    use walkjs::session::STACK_SIZE;

    use super::common::{output_of, run, session};

    fn lines(expected: &[&str]) -> Vec<String> {
        expected.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_interpreter_01_block_shadowing() {
        let source = "
            var a = 1;
            {
                var a = 2;
                print a;
            }
            print a;
        ";

        assert_eq!(output_of(source), lines(&["2", "1"]));
    }

    #[test]
    fn test_interpreter_02_print_formats() {
        let source = r#"
            print 3;
            print 2.5;
            print 1 / 4;
            print "hi";
            print true;
            print null;
            print [1, "a", [null, false]];
            function f() {}
            print f;
            print clock;
            class Point {}
            print Point;
            print Point();
        "#;

        assert_eq!(
            output_of(source),
            lines(&[
                "3",
                "2.5",
                "0.25",
                "hi",
                "true",
                "null",
                "[1, a, [null, false]]",
                "<fn f>",
                "<native fn>",
                "Point",
                "Point instance",
            ])
        );
    }

    #[test]
    fn test_interpreter_03_arithmetic_and_concatenation() {
        let source = r#"
            print 1 + 2;
            print "a" + 1;
            print 1 + "a";
            print "x" + null;
            print 7 % 3;
            print -(2 * 3);
            print 10 - 4 / 2;
        "#;

        assert_eq!(
            output_of(source),
            lines(&["3", "a1", "1a", "xnull", "1", "-6", "8"])
        );
    }

    #[test]
    fn test_interpreter_04_division_by_zero_is_an_error() {
        let outcome = run("print 1;\nprint 1 / 0;\nprint 2;");

        assert_eq!(outcome.output, lines(&["1"]));
        assert_eq!(outcome.runtime_errors, lines(&["Division by zero.\n[line 2]"]));
        assert!(outcome.status.had_runtime_error);
        assert_eq!(outcome.status.exit_code(), 70);

        let outcome = run("print 5 % 0;");
        assert_eq!(outcome.runtime_errors, lines(&["Modulo by zero.\n[line 1]"]));
    }

    #[test]
    fn test_interpreter_05_type_errors() {
        let outcome = run("print 2 < \"x\";");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Operands of '<' must be numbers, got number and string.\n[line 1]"])
        );

        let outcome = run("print true + 1;");
        assert_eq!(
            outcome.runtime_errors,
            lines(&[
                "Operands of '+' must be two numbers or include a string, got boolean and number.\n[line 1]"
            ])
        );

        let outcome = run("print -\"x\";");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Operand must be a number.\n[line 1]"])
        );
    }

    #[test]
    fn test_interpreter_06_truthiness_and_equality() {
        let source = r#"
            if (0) print "zero is truthy";
            if ("") print "empty is truthy";
            if (null) print "null is truthy";
            if (false) print "unreachable"; else print "false is falsy";
            print !null;
            print null == null;
            print null == false;
            print 1 == "1";
            print [1, [2]] == [1, [2]];
            class A {}
            var a = A();
            print a == a;
            print a == A();
        "#;

        assert_eq!(
            output_of(source),
            lines(&[
                "zero is truthy",
                "empty is truthy",
                "null is truthy",
                "false is falsy",
                "false",
                "true",
                "false",
                "false",
                "true",
                "true",
                "false",
            ])
        );
    }

    #[test]
    fn test_interpreter_07_logical_operators_evaluate_both_sides() {
        let source = "
            var calls = 0;
            function touch(v) { calls += 1; return v; }
            print touch(false) && touch(true);
            print touch(true) || touch(false);
            print calls;
            print true & false | true;
        ";

        assert_eq!(output_of(source), lines(&["false", "true", "4", "true"]));
    }

    #[test]
    fn test_interpreter_08_logical_operands_must_be_booleans() {
        let outcome = run("print 1 && true;");

        assert_eq!(
            outcome.runtime_errors,
            lines(&["Operands of '&&' must be booleans.\n[line 1]"])
        );
    }

    #[test]
    fn test_interpreter_09_ternary() {
        let source = r#"
            print true ? "yes" : "no";
            print false ? 1 : null ? 2 : 3;
            var x = 5;
            print x > 3 ? x * 2 : x;
        "#;

        assert_eq!(output_of(source), lines(&["yes", "2", "10"]));
    }

    #[test]
    fn test_interpreter_10_compound_assignment() {
        let source = r#"
            var i = 1;
            i++;
            print i;
            i--;
            i--;
            print i;
            var s = "a";
            s += "b";
            print s;
            var n = 10;
            n -= 4;
            n *= 3;
            n /= 2;
            print n;
            n %= 4;
            print n;
            print n += 1;
            print n;
        "#;

        assert_eq!(
            output_of(source),
            lines(&["2", "0", "ab", "9", "1", "null", "2"])
        );
    }

    #[test]
    fn test_interpreter_11_compound_division_by_zero() {
        let outcome = run("var n = 1;\nn /= 0;");

        assert_eq!(outcome.runtime_errors, lines(&["Division by zero.\n[line 2]"]));
    }

    #[test]
    fn test_interpreter_12_undefined_variables() {
        let outcome = run("print missing;");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Undefined variable 'missing'.\n[line 1]"])
        );

        let outcome = run("missing = 1;");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Undefined variable 'missing'.\n[line 1]"])
        );

        let outcome = run("var a = a;");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Undefined variable 'a'.\n[line 1]"])
        );
    }

    #[test]
    fn test_interpreter_13_loops() {
        let source = "
            var total = 0;
            for (var i = 0; i < 5; i++) total += i;
            print total;
            var n = 3;
            while (n > 0) { print n; n--; }
        ";

        assert_eq!(output_of(source), lines(&["10", "3", "2", "1"]));
    }

    #[test]
    fn test_interpreter_14_functions_and_recursion() {
        let source = "
            function fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            print fib(10);

            function nothing() {}
            print nothing();

            function early() {
                while (true) { return \"out\"; }
            }
            print early();
        ";

        assert_eq!(output_of(source), lines(&["55", "null", "out"]));
    }

    #[test]
    fn test_interpreter_15_closures_capture_and_mutate() {
        let source = "
            function makeCounter() {
                var count = 0;
                function inc() {
                    count++;
                    return count;
                }
                return inc;
            }
            var a = makeCounter();
            var b = makeCounter();
            print a();
            print a();
            print b();
        ";

        assert_eq!(output_of(source), lines(&["1", "2", "1"]));
    }

    #[test]
    fn test_interpreter_16_static_scoping() {
        let source = r#"
            var a = "global";
            {
                function show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(output_of(source), lines(&["global", "global"]));
    }

    #[test]
    fn test_interpreter_17_call_errors() {
        let outcome = run("function f(a, b) {}\nf(1);");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Expected 2 arguments but got 1.\n[line 2]"])
        );

        let outcome = run("\"text\"();");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Can only call functions and classes.\n[line 1]"])
        );

        let outcome = run("class A {}\nA(1);");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Expected 0 arguments but got 1.\n[line 2]"])
        );
    }

    #[test]
    fn test_interpreter_18_arrays() {
        let source = "
            var xs = [10, 20, 30];
            print xs[0];
            print xs[1 + 1];
            var ys = xs;
            print ys == xs;
            var grid = [[1, 2], [3, 4]];
            print grid[1][0];
            print [];
        ";

        assert_eq!(output_of(source), lines(&["10", "30", "true", "3", "[]"]));
    }

    #[test]
    fn test_interpreter_32_index_is_evaluated_before_target() {
        let source = r#"
            function target() { print "target"; return [1, 2]; }
            function index() { print "index"; return 0; }
            print target()[index()];
        "#;

        assert_eq!(output_of(source), lines(&["index", "target", "1"]));
    }

    #[test]
    fn test_interpreter_19_array_index_errors() {
        let cases = [
            ("print [1, 2][2];", "Array index 2 out of range for length 2."),
            ("print [1, 2][-1];", "Array index -1 out of range for length 2."),
            ("print [1, 2][0.5];", "Array index must be an integer, got 0.5."),
            ("print [1, 2][\"0\"];", "Array index must be a number."),
            ("print \"ab\"[0];", "Only arrays can be indexed, got string."),
        ];

        for (source, message) in cases {
            let outcome = run(source);
            assert_eq!(
                outcome.runtime_errors,
                vec![format!("{}\n[line 1]", message)],
                "for {}",
                source
            );
        }
    }

    #[test]
    fn test_interpreter_20_classes() {
        let source = r#"
            class Counter {
                constructor(start) {
                    this.count = start;
                }
                bump() {
                    this.count = this.count + 1;
                    return this;
                }
            }
            var c = Counter(5);
            print c.bump().bump().count;

            var bump = c.bump;
            bump();
            print c.count;

            c.extra = "field";
            print c.extra;
        "#;

        assert_eq!(output_of(source), lines(&["7", "8", "field"]));
    }

    #[test]
    fn test_interpreter_21_fields_shadow_methods() {
        let source = r#"
            class A {
                name() { return "method"; }
            }
            var a = A();
            print a.name();
            a.name = "field";
            print a.name;
        "#;

        assert_eq!(output_of(source), lines(&["method", "field"]));
    }

    #[test]
    fn test_interpreter_22_constructor_returns_instance() {
        let source = "
            class A {
                constructor() {
                    this.x = 1;
                    return;
                }
            }
            var a = A();
            print a.x;
            print a.constructor();
        ";

        assert_eq!(output_of(source), lines(&["1", "A instance"]));
    }

    #[test]
    fn test_interpreter_23_class_refers_to_itself() {
        let source = "
            class Node {
                make() { return Node(); }
            }
            print Node().make();
        ";

        assert_eq!(output_of(source), lines(&["Node instance"]));
    }

    #[test]
    fn test_interpreter_24_property_errors() {
        let outcome = run("class A {}\nprint A().missing;");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Undefined property 'missing'.\n[line 2]"])
        );

        let outcome = run("var n = 1;\nprint n.x;");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Only instances have properties.\n[line 2]"])
        );

        let outcome = run("var n = 1;\nn.x = 2;");
        assert_eq!(
            outcome.runtime_errors,
            lines(&["Only instances have fields.\n[line 2]"])
        );
    }

    #[test]
    fn test_interpreter_25_clock_is_a_number() {
        let source = "
            var t = clock();
            print t > 0;
            print clock() >= t;
        ";

        assert_eq!(output_of(source), lines(&["true", "true"]));
    }

    #[test]
    fn test_interpreter_26_static_errors_prevent_execution() {
        let outcome = run("print 1;\nprint 2");

        assert!(outcome.output.is_empty());
        assert_eq!(
            outcome.errors,
            lines(&["[line 2] Error at end: Expect ';' after value."])
        );
        assert!(outcome.status.had_static_error);
        assert_eq!(outcome.status.exit_code(), 65);

        let outcome = run("print 1;\n@");
        assert!(outcome.output.is_empty());
        assert_eq!(
            outcome.errors,
            lines(&["[line 2] Error: Unexpected character: @"])
        );

        let outcome = run("print 1;\nreturn 2;");
        assert!(outcome.output.is_empty());
        assert_eq!(outcome.status.exit_code(), 65);
    }

    #[test]
    fn test_interpreter_27_session_keeps_globals_between_runs() {
        let (mut session, buffer) = session();

        assert_eq!(session.run("var a = 1;").exit_code(), 0);
        assert_eq!(session.run("function inc() { a++; }").exit_code(), 0);
        assert_eq!(session.run("inc(); print a;").exit_code(), 0);

        // one failed line does not poison the next
        assert!(session.run("print nope;").had_runtime_error);
        assert!(session.run("print (;").had_static_error);
        assert_eq!(session.run("{ var b = 2; print a + b; }").exit_code(), 0);

        assert_eq!(buffer.lines(), lines(&["2", "4"]));
        assert_eq!(session.reporter().runtime_errors.len(), 1);
        assert_eq!(session.reporter().errors.len(), 1);
    }

    #[test]
    fn test_interpreter_28_runtime_error_inside_call_restores_scope() {
        let (mut session, buffer) = session();

        session.run("var x = \"global\";\nfunction bad() { var x = \"local\"; return 1 / 0; }");
        assert!(session.run("bad();").had_runtime_error);
        session.run("print x;");

        assert_eq!(buffer.lines(), lines(&["global"]));
    }

    #[test]
    fn test_interpreter_29_runs_are_deterministic() {
        let source = "
            var xs = [];
            class P { constructor(v) { this.v = v; } }
            for (var i = 0; i < 3; i++) print P(i * i).v;
        ";

        assert_eq!(output_of(source), output_of(source));
        assert_eq!(output_of(source), lines(&["0", "1", "4"]));
    }

    #[test]
    fn test_interpreter_30_overflow_prints_infinity() {
        let source = "
            var big = 1;
            var small = -1;
            for (var i = 0; i < 40; i++) {
                big *= 10000000000;
                small *= 10000000000;
            }
            print big;
            print small;
        ";

        assert_eq!(output_of(source), lines(&["Infinity", "-Infinity"]));
    }

    #[test]
    fn test_interpreter_31_deep_recursion_is_not_fatal() {
        let source = "
            function depth(n) {
                if (n == 0) return 0;
                return 1 + depth(n - 1);
            }
            print depth(1000);
        ";

        let output = thread::Builder::new()
            .stack_size(STACK_SIZE)
            .spawn(move || output_of(source))
            .unwrap()
            .join()
            .unwrap();

        assert_eq!(output, lines(&["1000"]));
    }
}
