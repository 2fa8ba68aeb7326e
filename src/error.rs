//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Every phase (scanner, parser, resolver, runtime) converts its failure modes
//! into one of the [`LoxError`] variants defined here.  Compile-time phases do
//! not abort on the first error: they hand each diagnostic to an
//! [`ErrorReporter`] and keep going, so a single pass can surface several
//! independent problems.
//!
//! The module **does not** decide exit codes itself; it only records the
//! sticky flags the driver consults.

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis failure (scope rules, misplaced `return`/`this`/`super`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error`.  Enables `?` on I/O ops.
    #[error("{0}")]
    Io(String),
}

impl From<io::Error> for LoxError {
    fn from(err: io::Error) -> Self {
        LoxError::Io(err.to_string())
    }
}

/// ` at end` for the EOF token, ` at 'lexeme'` for anything else.
fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: location(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// Is this a runtime error (as opposed to a compile-time one)?
    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime { .. } | LoxError::Io(_))
    }

    /// The bare message without the line decoration.
    pub fn message(&self) -> &str {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. }
            | LoxError::Runtime { message, .. }
            | LoxError::Io(message) => message,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Collects diagnostics from every phase and tracks the sticky flags the
/// driver uses to pick an exit status.
#[derive(Debug, Default)]
pub struct ErrorReporter {
    errors: Vec<LoxError>,
    had_error: bool,
    had_runtime_error: bool,
    echo: bool,
}

impl ErrorReporter {
    /// A reporter that only records diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that also writes every diagnostic to stderr as it arrives.
    pub fn stderr() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    pub fn report(&mut self, error: LoxError) {
        debug!("Reporting error: {:?}", error);

        if error.is_runtime() {
            self.had_runtime_error = true;
        } else {
            self.had_error = true;
        }

        if self.echo {
            eprintln!("{}", error);
        }

        self.errors.push(error);
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears the compile-error flag so one bad REPL line doesn't block the
    /// rest of the session.
    pub fn reset(&mut self) {
        self.had_error = false;
    }

    /// Every diagnostic reported so far, oldest first.
    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }
}
