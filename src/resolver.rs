//! Static resolver pass.
//!
//! One walk over the tree that:
//! 1. Builds lexical scopes (a stack of `name -> ready` maps).
//! 2. Reports static errors (redeclaration, reading a local in its own
//!    initializer, misplaced `return`/`this`/`super`).
//! 3. Records, for every local reference, how many scopes separate it from
//!    its declaration.  References found in no scope are globals and get no
//!    entry.
//!
//! Errors go to the [`ErrorReporter`]; resolution keeps going afterwards.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{Expr, ExprId, Function, Stmt};
use crate::error::{ErrorReporter, LoxError};
use crate::interpreter::Locals;
use crate::token::Token;

/// What kind of function body we are in.  Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

/// What kind of class body we are in.  Validates `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'r> {
    reporter: &'r mut ErrorReporter,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    locals: Locals,
}

impl<'r> Resolver<'r> {
    pub fn new(reporter: &'r mut ErrorReporter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            locals: HashMap::new(),
        }
    }

    /// Walks all top-level statements and returns the distance table.
    pub fn resolve(mut self, statements: &[Stmt]) -> Locals {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        self.resolve_stmts(statements);

        info!("Resolved {} local reference(s)", self.locals.len());

        self.locals
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                // ① Push a new anonymous scope for `{ … }`
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // ② declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(declaration) => {
                // ③ name is visible inside its own body
                self.declare(&declaration.name);
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            // Placement was already checked by the parser.
            Stmt::Break(_) => {}

            Stmt::Return { keyword, value } => {
                // ④ return only allowed inside a function
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Cannot return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Cannot return a value from an initializer.");
                    }
                    self.resolve_expr(expr);
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<Function>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable {
                name: super_name, ..
            } = superclass
            {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class cannot inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            // ⑤ methods close over a scope binding `super`
            self.begin_scope();
            self.define_name("super");
        }

        // ⑥ and one binding `this`
        self.begin_scope();
        self.define_name("this");

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                let in_own_initializer: bool = self
                    .scopes
                    .last()
                    .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));

                if in_own_initializer {
                    self.error(name, "Cannot read local variable in its own initializer.");
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // RHS first, then bind the target
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Cannot use 'this' outside of a class.");
                    return;
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Cannot use 'super' outside of a class.")
                    }
                    ClassType::Class => {
                        self.error(keyword, "Cannot use 'super' in a class with no superclass.")
                    }
                    ClassType::Subclass => {}
                }
                self.resolve_local(*id, keyword);
            }

            Expr::Lambda(declaration) => {
                self.resolve_function(declaration, FunctionType::Function);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters + body.
    fn resolve_function(&mut self, function: &Function, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&function.body);
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Variable with this name already declared in this scope.");
            return;
        }

        scope.insert(name.lexeme.clone(), false);
    }

    fn define(&mut self, name: &Token) {
        self.define_name(&name.lexeme);
    }

    fn define_name(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), true);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Records the reference as a local at depth `d`, or leaves it global
    /// when no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.locals.insert(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error(&mut self, token: &Token, message: &str) {
        self.reporter.report(LoxError::resolve(token, message));
    }
}
