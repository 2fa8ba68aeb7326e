#[cfg(test)]
mod resolver_tests {
    use lox_interpreter as lox;

    use lox::ast::{Expr, Stmt};
    use lox::error::ErrorReporter;
    use lox::interpreter::Locals;
    use lox::parser::Parser;
    use lox::resolver::Resolver;
    use lox::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn resolve(source: &str) -> (Vec<Stmt>, Locals, Vec<String>) {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let statements = Parser::new(tokens, &mut reporter).parse();

        assert!(!reporter.had_error(), "syntax errors: {:?}", reporter.errors());

        let locals = Resolver::new(&mut reporter).resolve(&statements);
        let errors = reporter.errors().iter().map(|e| e.to_string()).collect();

        (statements, locals, errors)
    }

    fn errors(source: &str) -> Vec<String> {
        resolve(source).2
    }

    #[test]
    fn test_globals_get_no_entry() {
        let (_, locals, errors) = resolve("var a = 1; print a; a = 2;");

        assert!(errors.is_empty());
        assert!(locals.is_empty());
    }

    #[test]
    fn test_local_distances() {
        let (statements, locals, _) = resolve("{ var a = 1; { print a; } }");

        // { var a; { print a; } }
        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block");
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected inner block");
        };
        let Stmt::Print(Expr::Variable { id, .. }) = &inner[0] else {
            panic!("expected print of variable");
        };

        assert_eq!(locals.get(id), Some(&1));
    }

    #[test]
    fn test_closure_parameter_distance() {
        let (statements, locals, _) = resolve("fun f(x) { return fun () { return x; }; }");

        let Stmt::Function(outer) = &statements[0] else {
            panic!("expected function");
        };
        let Stmt::Return {
            value: Some(Expr::Lambda(inner)),
            ..
        } = &outer.body[0]
        else {
            panic!("expected returned lambda");
        };
        let Stmt::Return {
            value: Some(Expr::Variable { id, .. }),
            ..
        } = &inner.body[0]
        else {
            panic!("expected returned variable");
        };

        assert_eq!(locals.get(id), Some(&1));
    }

    #[test]
    fn test_duplicate_local_declaration() {
        assert_eq!(
            errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Variable with this name already declared in this scope."]
        );
    }

    #[test]
    fn test_duplicate_global_is_allowed() {
        assert!(errors("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            errors("var a = 1; { var a = a; }"),
            vec!["[line 1] Error at 'a': Cannot read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_return_at_top_level() {
        assert_eq!(
            errors("return 1;"),
            vec!["[line 1] Error at 'return': Cannot return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            errors("class A { init() { return 1; } }"),
            vec!["[line 1] Error at 'return': Cannot return a value from an initializer."]
        );
        assert!(errors("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            errors("print this;"),
            vec!["[line 1] Error at 'this': Cannot use 'this' outside of a class."]
        );
        assert!(errors("fun f() { return this; }").len() == 1);
    }

    #[test]
    fn test_super_placement() {
        assert_eq!(
            errors("super.go();"),
            vec!["[line 1] Error at 'super': Cannot use 'super' outside of a class."]
        );
        assert_eq!(
            errors("class A { go() { super.go(); } }"),
            vec!["[line 1] Error at 'super': Cannot use 'super' in a class with no superclass."]
        );
        assert!(errors("class A {} class B < A { go() { super.go(); } }").is_empty());
    }

    #[test]
    fn test_class_inheriting_from_itself() {
        assert_eq!(
            errors("class A < A {}"),
            vec!["[line 1] Error at 'A': A class cannot inherit from itself."]
        );
    }

    #[test]
    fn test_keeps_going_after_errors() {
        let found = errors("return 1;\n{ var a = 1; var a = 2; }\nprint this;");

        assert_eq!(found.len(), 3);
    }
}
