/*!
Recursive‑descent parser producing the statement list of a Lox program.

Time & Space
------------
* **n** = number of tokens (including the sole EOF).

| Phase / function              | Cost | Rationale                                              |
|-------------------------------|-----:|--------------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is consumed once via `advance()`.           |
| Error recovery `synchronize()`| O(k) | Discards tokens ≤ next statement boundary (`k ≤ n`).   |

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, recovery      | `debug`| Descent into grammar branches, resyncs.   |

Error handling
--------------
A failed rule returns `Err(LoxError::Parse)`.  [`Parser::declaration`] is the
single catch point: it reports the error, synchronizes to the next statement
boundary and yields `None` for that slot, so one pass can surface several
independent syntax errors.  Some problems (too many arguments) are reported
without unwinding at all.

Grammar
-------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → forStmt | ifStmt | printStmt | returnStmt | whileStmt
               | breakStmt | block | exprStmt ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
ifStmt         → "if" "(" expression ")" statement ( "else" statement )? ;
printStmt      → "print" expression ";" ;
returnStmt     → "return" expression? ";" ;
whileStmt      → "while" "(" expression ")" statement ;
breakStmt      → "break" ";" ;
block          → "{" declaration* "}" ;
exprStmt       → expression ";" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" | "super" "." IDENT
               | "fun" "(" parameters? ")" block ;
```

`for` has no node of its own: it is desugared into a `while` inside a block.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, Function, LiteralValue, Stmt};
use crate::error::{ErrorReporter, LoxError, Result};
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Parameter and argument lists are capped at this many entries.
pub const MAX_ARITY: usize = 8;

/// Top‑level parser over a scanned token stream.
pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    loop_depth: usize,
    reporter: &'r mut ErrorReporter,
}

impl<'r> Parser<'r> {
    /// Construct a new parser.  `tokens` must end with `EOF`, as produced by
    /// [`Scanner::scan_tokens`](crate::scanner::Scanner::scan_tokens).
    pub fn new(mut tokens: Vec<Token>, reporter: &'r mut ErrorReporter) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if !matches!(tokens.last(), Some(t) if t.token_type == TokenType::EOF) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", line));
        }

        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            reporter,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Declarations that failed to parse are
    /// reported and skipped; the rest are returned.
    pub fn parse(&mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!("Parsed {} statements", statements.len());

        statements
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.check(TokenType::FUN) && self.check_next(TokenType::IDENTIFIER) {
            self.advance();
            self.function("function").map(Stmt::Function)
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                self.reporter.report(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected class name")?;

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let super_name = self.consume(TokenType::IDENTIFIER, "Expected superclass name")?;

            Some(Expr::Variable {
                id: ExprId::fresh(),
                name: super_name,
            })
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body")?;

        let mut methods: Vec<Rc<Function>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `IDENT "(" parameters? ")" block` – shared by functions and methods.
    fn function(&mut self, kind: &str) -> Result<Rc<Function>> {
        let name: Token =
            self.consume(TokenType::IDENTIFIER, &format!("Expected {} name", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after {} name", kind),
        )?;

        self.function_rest(name, kind)
    }

    /// Parameters and body, after the opening `(`.
    fn function_rest(&mut self, name: Token, kind: &str) -> Result<Rc<Function>> {
        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    let err = LoxError::parse(
                        self.peek(),
                        format!("Cannot have more than {} parameters", MAX_ARITY),
                    );
                    self.reporter.report(err);
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expected parameter name")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters")?;
        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expected '{{' before {} body", kind),
        )?;

        // `break` never crosses a function boundary.
        let enclosing_loops = std::mem::replace(&mut self.loop_depth, 0);
        let body = self.block();
        self.loop_depth = enclosing_loops;

        Ok(Rc::new(Function {
            name,
            params,
            body: body?,
        }))
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expected variable name")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::BREAK) {
            self.break_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// `for (init; cond; incr) body` becomes
    /// `{ init; while (cond) { body; incr; } }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses")?;

        let body: Stmt = self.loop_body()?;

        debug!("Desugaring for loop at line {}", keyword.line);

        let body: Stmt = match increment {
            Some(increment) => Stmt::Block(vec![body, Stmt::Expression(increment)]),
            None => body,
        };

        let condition: Expr = condition.unwrap_or(Expr::Literal(LiteralValue::True));

        let mut desugared: Vec<Stmt> = Vec::with_capacity(2);
        if let Some(initializer) = initializer {
            desugared.push(initializer);
        }
        desugared.push(Stmt::While {
            condition,
            body: Box::new(body),
        });

        Ok(Stmt::Block(desugared))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'if'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after if condition")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'while'")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition")?;
        let body: Box<Stmt> = Box::new(self.loop_body()?);

        Ok(Stmt::While { condition, body })
    }

    fn break_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            return Err(LoxError::parse(
                &keyword,
                "Cannot use 'break' outside of a loop",
            ));
        }

        self.consume(TokenType::SEMICOLON, "Expected ';' after 'break'")?;

        Ok(Stmt::Break(keyword))
    }

    /// Parse a loop body with the loop depth bumped for `break` checks.
    fn loop_body(&mut self) -> Result<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;

        body
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after expression")?;

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                _ => Err(LoxError::parse(&equals, "Invalid assignment target")),
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Left-associative binary level: `operand ( op operand )*`.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = operand(self)?;

        while operators.iter().any(|op| self.check(op.clone())) {
            let operator: Token = self.advance().clone();
            let right: Expr = operand(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expected property name after '.'")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let err = LoxError::parse(
                        self.peek(),
                        format!("Cannot have more than {} arguments", MAX_ARITY),
                    );
                    self.reporter.report(err);
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches(TokenType::NUMBER(0.0)) || self.matches(TokenType::STRING(String::new()))
        {
            if let Some(literal) = self.previous().literal() {
                return Ok(Expr::Literal(literal));
            }
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: ExprId::fresh(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::SUPER) {
            let keyword: Token = self.previous().clone();
            self.consume(TokenType::DOT, "Expected '.' after 'super'")?;
            let method: Token =
                self.consume(TokenType::IDENTIFIER, "Expected superclass method name")?;

            return Ok(Expr::Super {
                id: ExprId::fresh(),
                keyword,
                method,
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: ExprId::fresh(),
                name: self.previous().clone(),
            });
        }

        if self.matches(TokenType::FUN) {
            let keyword: Token = self.previous().clone();
            self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'fun'")?;

            return Ok(Expr::Lambda(self.function_rest(keyword, "function")?));
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(LoxError::parse(self.peek(), "Expected expression"))
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        Err(LoxError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    /// Looks one token past [`peek`] without consuming anything.
    #[inline(always)]
    fn check_next(&self, ttype: TokenType) -> bool {
        self.tokens
            .get(self.current + 1)
            .is_some_and(|t| t.token_type == ttype)
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        debug!("Synchronizing after parse error at line {}", self.peek().line);

        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN
                | TokenType::BREAK => return,
                _ => {}
            }

            self.advance();
        }
    }
}
