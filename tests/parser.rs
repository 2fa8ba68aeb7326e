#[cfg(test)]
mod parser_tests {
    use lox_interpreter as lox;

    use lox::ast::{Expr, Stmt};
    use lox::ast_printer::{AstPrinter, RpnPrinter};
    use lox::error::ErrorReporter;
    use lox::parser::Parser;
    use lox::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Vec<Stmt>, ErrorReporter) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let statements = Parser::new(tokens, &mut reporter).parse();

        (statements, reporter)
    }

    fn printed(source: &str) -> Vec<String> {
        let (statements, reporter) = parse(source);

        assert!(
            !reporter.had_error(),
            "unexpected errors: {:?}",
            reporter.errors()
        );

        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn error_messages(source: &str) -> Vec<String> {
        let (_, reporter) = parse(source);

        reporter.errors().iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_precedence_and_grouping() {
        assert_eq!(
            printed("1 + 2 * (3 - -4);"),
            vec!["(; (+ 1.0 (* 2.0 (group (- 3.0 (- 4.0))))))"]
        );
    }

    #[test]
    fn test_comparison_equality_and_logic() {
        assert_eq!(
            printed("a < b == !c or d and e;"),
            vec!["(; (or (== (< a b) (! c)) (and d e)))"]
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_eq!(printed("a = b = 3;"), vec!["(; (= a (= b 3.0)))"]);
    }

    #[test]
    fn test_property_access_and_calls() {
        assert_eq!(
            printed("obj.field = f(1, \"two\")(x).y;"),
            vec!["(; (= (. obj field) (. (call (call f 1.0 two) x) y)))"]
        );
    }

    #[test]
    fn test_var_declarations() {
        assert_eq!(printed("var a = 1; var b;"), vec!["(var a 1.0)", "(var b)"]);
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        assert_eq!(
            printed("for (var i = 0; i < 3; i = i + 1) print i;"),
            vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"]
        );
    }

    #[test]
    fn test_empty_for_clauses_loop_forever() {
        assert_eq!(
            printed("for (;;) break;"),
            vec!["(block (while true (break)))"]
        );
    }

    #[test]
    fn test_if_else_and_blocks() {
        assert_eq!(
            printed("if (x) { print 1; } else print 2;"),
            vec!["(if-else x (block (print 1.0)) (print 2.0))"]
        );
    }

    #[test]
    fn test_function_and_lambda() {
        assert_eq!(
            printed("fun add(a, b) { return a + b; } var id = fun (x) { return x; };"),
            vec![
                "(fun add (a b) (return (+ a b)))",
                "(var id (fun (x) (return x)))",
            ]
        );
    }

    #[test]
    fn test_class_with_superclass_and_super_call() {
        assert_eq!(
            printed("class B < A { init(x) { this.x = x; } go() { return super.go(); } }"),
            vec![
                "(class B < A (fun init (x) (; (= (. this x) x))) (fun go () (return (call (super go)))))"
            ]
        );
    }

    #[test]
    fn test_superclass_is_a_variable_expression() {
        let (statements, _) = parse("class B < A {}");

        match &statements[0] {
            Stmt::Class {
                superclass: Some(Expr::Variable { name, .. }),
                ..
            } => assert_eq!(name.lexeme, "A"),
            other => panic!("expected class with superclass, got {:?}", other),
        }
    }

    #[test]
    fn test_rpn_printer() {
        let (statements, _) = parse("(1 + 2) * (4 - 3);");

        let Stmt::Expression(expr) = &statements[0] else {
            panic!("expected expression statement");
        };

        assert_eq!(RpnPrinter::print(expr), "1.0 2.0 + 4.0 3.0 - *");
    }

    #[test]
    fn test_missing_semicolon_at_end() {
        assert_eq!(
            error_messages("print 1"),
            vec!["[line 1] Error at end: Expected ';' after value"]
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            error_messages("1 = 2;"),
            vec!["[line 1] Error at '=': Invalid assignment target"]
        );
    }

    #[test]
    fn test_recovers_at_statement_boundary() {
        let (statements, reporter) = parse("var = 1;\nprint 2;\nprint (;\nprint 3;");

        assert_eq!(reporter.errors().len(), 2);
        assert_eq!(
            statements.iter().map(AstPrinter::print_stmt).collect::<Vec<_>>(),
            vec!["(print 2.0)", "(print 3.0)"]
        );
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            error_messages("break;"),
            vec!["[line 1] Error at 'break': Cannot use 'break' outside of a loop"]
        );
    }

    #[test]
    fn test_break_cannot_cross_function_boundary() {
        let errors = error_messages("while (true) { fun f() { break; } }");

        assert_eq!(
            errors,
            vec!["[line 1] Error at 'break': Cannot use 'break' outside of a loop"]
        );
    }

    #[test]
    fn test_break_inside_nested_loop_body_is_fine() {
        assert_eq!(
            printed("while (a) { if (b) break; }"),
            vec!["(while a (block (if b (break))))"]
        );
    }

    #[test]
    fn test_too_many_parameters_is_reported_but_parsed() {
        let (statements, reporter) = parse("fun f(a, b, c, d, e, f, g, h, i) {}");

        assert_eq!(statements.len(), 1);
        assert_eq!(
            reporter.errors()[0].to_string(),
            "[line 1] Error at 'i': Cannot have more than 8 parameters"
        );
    }

    #[test]
    fn test_too_many_arguments_is_reported() {
        let errors = error_messages("f(1, 2, 3, 4, 5, 6, 7, 8, 9);");

        assert_eq!(
            errors,
            vec!["[line 1] Error at '9': Cannot have more than 8 arguments"]
        );
    }

    #[test]
    fn test_expected_expression() {
        assert_eq!(
            error_messages("print ;"),
            vec!["[line 1] Error at ';': Expected expression"]
        );
    }
}
