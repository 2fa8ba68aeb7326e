#[cfg(test)]
mod interpreter_tests {
    use lox_interpreter as lox;

    use lox::runner::Lox;
    use pretty_assertions::assert_eq;

    struct Outcome {
        output: String,
        errors: Vec<String>,
        exit_code: i32,
    }

    fn run(source: &str) -> Outcome {
        let mut session = Lox::with_output(Vec::new());
        session.run(source);

        let errors = session.errors().iter().map(|e| e.to_string()).collect();
        let exit_code = session.exit_code();
        let output = String::from_utf8(session.into_output()).expect("utf-8 output");

        Outcome {
            output,
            errors,
            exit_code,
        }
    }

    fn output_of(source: &str) -> String {
        let outcome = run(source);

        assert!(outcome.errors.is_empty(), "errors: {:?}", outcome.errors);

        outcome.output
    }

    fn runtime_error_of(source: &str) -> String {
        let outcome = run(source);

        assert_eq!(outcome.exit_code, 70, "errors: {:?}", outcome.errors);

        outcome.errors.join("\n")
    }

    #[test]
    fn test_arithmetic_and_number_display() {
        assert_eq!(output_of("print 1 + 2 * 3; print 7 / 2; print -0.5;"), "7\n3.5\n-0.5\n");
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!(output_of("print 1 / 0; print -1 / 0;"), "inf\n-inf\n");
    }

    #[test]
    fn test_string_concatenation_and_coercion() {
        assert_eq!(
            output_of("print \"foo\" + \"bar\"; print \"n=\" + 3; print 1.5 + \"x\"; print \"b:\" + true;"),
            "foobar\nn=3\n1.5x\nb:true\n"
        );
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            output_of("print !nil; print !false; print !0; print !\"\";"),
            "true\ntrue\nfalse\nfalse\n"
        );
    }

    #[test]
    fn test_equality_across_types() {
        assert_eq!(
            output_of("print 1 == 1; print \"1\" == 1; print nil == false; print nil == nil; print \"a\" != \"a\";"),
            "true\nfalse\nfalse\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_logical_operators_return_operands() {
        assert_eq!(
            output_of("print nil or \"yes\"; print 0 and \"second\"; print false and boom;"),
            "yes\nsecond\nfalse\n"
        );
    }

    #[test]
    fn test_shadowing() {
        assert_eq!(
            output_of("var a = \"global\"; { var a = \"local\"; print a; } print a;"),
            "local\nglobal\n"
        );
    }

    #[test]
    fn test_closure_binds_to_declaration_scope() {
        let source = r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(output_of(source), "global\nglobal\n");
    }

    #[test]
    fn test_counter_closure() {
        let source = r#"
            fun makeCounter() {
                var i = 0;
                fun count() { i = i + 1; return i; }
                return count;
            }
            var c = makeCounter();
            print c(); print c(); print c();
        "#;

        assert_eq!(output_of(source), "1\n2\n3\n");
    }

    #[test]
    fn test_recursion() {
        let source = r#"
            fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }
            print fib(15);
        "#;

        assert_eq!(output_of(source), "610\n");
    }

    #[test]
    fn test_while_for_and_break() {
        let source = r#"
            for (var i = 0; i < 10; i = i + 1) {
                if (i == 3) break;
                print i;
            }
            var n = 0;
            while (true) { n = n + 1; if (n > 4) break; }
            print n;
        "#;

        assert_eq!(output_of(source), "0\n1\n2\n5\n");
    }

    #[test]
    fn test_return_unwinds_out_of_loops() {
        let source = r#"
            fun find() {
                for (var i = 0; ; i = i + 1) {
                    while (true) { if (i == 2) return i; break; }
                }
            }
            print find();
        "#;

        assert_eq!(output_of(source), "2\n");
    }

    #[test]
    fn test_function_without_return_yields_nil() {
        assert_eq!(output_of("fun f() {} print f();"), "nil\n");
    }

    #[test]
    fn test_display_forms() {
        let source = r#"
            fun named() {}
            class Point {}
            print named;
            print fun () {};
            print clock;
            print Point;
            print Point();
        "#;

        assert_eq!(
            output_of(source),
            "<fn named>\n<fn>\n<native fn>\nPoint\nPoint instance\n"
        );
    }

    #[test]
    fn test_clock_returns_a_number() {
        assert_eq!(output_of("print clock() > 0;"), "true\n");
    }

    #[test]
    fn test_lambdas_capture_environment() {
        let source = r#"
            fun adder(n) { return fun (x) { return x + n; }; }
            var add2 = adder(2);
            print add2(40);
        "#;

        assert_eq!(output_of(source), "42\n");
    }

    #[test]
    fn test_classes_fields_and_methods() {
        let source = r#"
            class Counter {
                init(start) { this.count = start; }
                bump() { this.count = this.count + 1; return this; }
            }
            var c = Counter(10);
            c.bump().bump();
            print c.count;
            c.extra = "field";
            print c.extra;
        "#;

        assert_eq!(output_of(source), "12\nfield\n");
    }

    #[test]
    fn test_initializer_returns_this() {
        let source = r#"
            class A { init() { this.v = 1; return; } }
            var a = A();
            print a.init() == a;
            print a.v;
        "#;

        assert_eq!(output_of(source), "true\n1\n");
    }

    #[test]
    fn test_inheritance_and_super() {
        let source = r#"
            class Animal {
                init(name) { this.name = name; }
                speak() { return this.name + " makes a sound"; }
            }
            class Dog < Animal {
                speak() { return super.speak() + ", woof"; }
            }
            print Dog("Rex").speak();
        "#;

        assert_eq!(output_of(source), "Rex makes a sound, woof\n");
    }

    #[test]
    fn test_fields_shadow_methods() {
        let source = r#"
            class A { m() { return "method"; } }
            var a = A();
            a.m = fun () { return "field"; };
            print a.m();
        "#;

        assert_eq!(output_of(source), "field\n");
    }

    #[test]
    fn test_identity_equality() {
        let source = r#"
            class A { m() {} }
            var a = A();
            var b = A();
            print a == a;
            print a == b;
            print A == A;
            print a.m == a.m;
        "#;

        assert_eq!(output_of(source), "true\nfalse\ntrue\nfalse\n");
    }

    #[test]
    fn test_globals_persist_across_runs() {
        let mut session = Lox::with_output(Vec::new());

        session.run("var greeting = \"hi\"; fun greet() { print greeting; }");
        session.run("greeting = \"hello\"; greet();");

        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "hello\n");
    }

    #[test]
    fn test_closures_survive_across_runs() {
        let mut session = Lox::with_output(Vec::new());

        session.run("fun make() { var x = 7; fun get() { return x; } return get; }");
        session.run("var g = make();");
        session.run("print g();");

        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "7\n");
    }

    #[test]
    fn test_runtime_error_messages() {
        assert_eq!(runtime_error_of("print -\"a\";"), "Operand must be a number.\n[line 1]");
        assert_eq!(runtime_error_of("print 1 < \"a\";"), "Operands must be numbers.\n[line 1]");
        assert_eq!(
            runtime_error_of("print nil + 1;"),
            "Operands must be two numbers or two strings.\n[line 1]"
        );
        assert_eq!(
            runtime_error_of("\"x\"();"),
            "Can only call functions and classes.\n[line 1]"
        );
        assert_eq!(
            runtime_error_of("fun f(a) {} f(1, 2);"),
            "Expected 1 arguments but got 2.\n[line 1]"
        );
        assert_eq!(
            runtime_error_of("print 3.x;"),
            "Only instances have properties.\n[line 1]"
        );
        assert_eq!(
            runtime_error_of("var s = \"str\"; s.x = 1;"),
            "Only instances have fields.\n[line 1]"
        );
        assert_eq!(
            runtime_error_of("print missing;"),
            "Undefined variable 'missing'.\n[line 1]"
        );
        assert_eq!(
            runtime_error_of("class A {} A().nope;"),
            "Undefined property 'nope'.\n[line 1]"
        );
        assert_eq!(
            runtime_error_of("var NotClass = 1; class B < NotClass {}"),
            "Superclass must be a class.\n[line 1]"
        );
    }

    #[test]
    fn test_declared_without_initializer_reads_nil() {
        assert_eq!(
            output_of("var x; print x; { var y; print y; y = 1; print y; }"),
            "nil\nnil\n1\n"
        );
    }

    #[test]
    fn test_runaway_recursion_is_a_runtime_error() {
        // Roomy stack so the depth limit, not the host stack, is what stops it.
        let outcome = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| run("fun f(n) { return f(n + 1); } f(0);"))
            .expect("spawn interpreter thread")
            .join()
            .expect("interpreter thread finished");

        assert_eq!(outcome.exit_code, 70);
        assert_eq!(outcome.errors, vec!["Stack overflow.\n[line 1]"]);
    }

    #[test]
    fn test_call_depth_recovers_after_overflow() {
        let output = std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(|| {
                let mut session = Lox::with_output(Vec::new());
                session.run("fun down(n) { return down(n + 1); }");
                session.run("down(0);");
                session.run("fun count(n) { if (n == 0) return 0; return 1 + count(n - 1); }");
                session.run("print count(150);");
                String::from_utf8(session.into_output()).unwrap()
            })
            .expect("spawn interpreter thread")
            .join()
            .expect("interpreter thread finished");

        assert_eq!(output, "150\n");
    }

    struct ClosedPipe;

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_print_is_a_runtime_error() {
        let mut session = Lox::with_output(ClosedPipe);
        session.run("print 1;");

        assert!(!session.had_error());
        assert!(session.had_runtime_error());
        assert_eq!(session.exit_code(), 70);
        assert_eq!(session.errors()[0].to_string(), "closed");
    }

    #[test]
    fn test_runtime_error_aborts_remaining_statements() {
        let outcome = run("print 1;\nprint nope;\nprint 2;");

        assert_eq!(outcome.output, "1\n");
        assert_eq!(outcome.errors, vec!["Undefined variable 'nope'.\n[line 2]"]);
        assert_eq!(outcome.exit_code, 70);
    }

    #[test]
    fn test_environment_restored_after_error_in_block() {
        let mut session = Lox::with_output(Vec::new());

        session.run("var a = \"outer\"; { var a = \"inner\"; print undefined; }");
        session.run("print a;");

        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "outer\n");
    }

    #[test]
    fn test_compile_errors_prevent_execution() {
        let outcome = run("print 1; print ;");

        assert_eq!(outcome.output, "");
        assert_eq!(outcome.exit_code, 65);

        let outcome = run("print 1; return 2;");

        assert_eq!(outcome.output, "");
        assert_eq!(outcome.exit_code, 65);
    }

    #[test]
    fn test_reset_error_allows_next_line() {
        let mut session = Lox::with_output(Vec::new());

        session.run("print ;");
        assert!(session.had_error());

        session.reset_error();
        session.run("print 1;");

        assert!(!session.had_error());
        assert_eq!(String::from_utf8(session.into_output()).unwrap(), "1\n");
    }
}
