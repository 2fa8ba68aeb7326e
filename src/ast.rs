//! Abstract syntax tree shared by the resolver, the interpreter and the debug
//! printers.
//!
//! Nodes that the resolver annotates (`Variable`, `Assign`, `This`, `Super`)
//! carry an [`ExprId`].  The interpreter keys its scope-distance table on that
//! id rather than on node addresses, so clones of a tree resolve identically
//! and ids stay valid after the tree moves into a closure.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};


use crate::token::Token;

/// Stable identity of a resolvable expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

impl ExprId {
    /// A fresh id, unique for the lifetime of the process.  Uniqueness across
    /// parser instances keeps REPL lines from clobbering each other's
    /// resolution entries.
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    /// The boolean constant `true`.
    True,

    /// The boolean constant `false`.
    False,

    /// The `nil` literal.
    Nil,
}

/// **Abstract‑Syntax‑Tree node** representing every kind of *expression*.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `nil`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression: `!isReady`, `-42`.
    Unary { operator: Token, right: Box<Expr> },

    /// Infix arithmetic, comparison or equality: `a + b`, `x <= y`.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting logical operators `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// Assignment expression: `identifier "=" expression`.
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Function‑ or method‑call expression.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token ‑ retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// `object.name`
    Get { object: Box<Expr>, name: Token },

    /// `object.name = value`
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// The `this` keyword inside a method.
    This { id: ExprId, keyword: Token },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },

    /// Anonymous function expression: `fun (a, b) { … }`.
    Lambda(Rc<Function>),
}

/// A function body shared between its declaration and every closure created
/// from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// Declared name, or the `fun` keyword for anonymous functions.
    pub name: Token,

    /// Parameter name tokens (at most 8).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

impl Function {
    pub fn is_anonymous(&self) -> bool {
        self.name.token_type == crate::token::TokenType::FUN
    }
}

/// **Abstract‑Syntax‑Tree node** for *statements*.  A program is a sequence
/// of these nodes returned by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `break;` inside a loop.
    Break(Token),

    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(Rc<Function>),

    /// `if` / `else` conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `print` statement used for output.
    Print(Expr),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// `while` loop.  `for` loops are desugared into this.
    While { condition: Expr, body: Box<Stmt> },

    /// `class Name < Superclass { methods }`
    Class {
        name: Token,
        /// Always an [`Expr::Variable`] when present.
        superclass: Option<Expr>,
        methods: Vec<Rc<Function>>,
    },
}
