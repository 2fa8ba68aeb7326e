//! Session driver: one interpreter plus one error reporter, fed whole
//! programs (a script) or one line at a time (the REPL).

use std::io::{self, Write};

use log::{debug, info};

use crate::error::{ErrorReporter, LoxError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit status after a compile-time (scan, parse or resolve) error.
pub const EXIT_COMPILE_ERROR: i32 = 65;

/// Exit status after a runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

pub struct Lox<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
    reporter: ErrorReporter,
}

impl Lox<io::Stdout> {
    /// Prints to stdout and echoes diagnostics to stderr.
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(),
            reporter: ErrorReporter::stderr(),
        }
    }
}

impl Default for Lox<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Lox<W> {
    /// Prints to `output` and records diagnostics without echoing them.
    pub fn with_output(output: W) -> Self {
        Lox {
            interpreter: Interpreter::with_output(output),
            reporter: ErrorReporter::new(),
        }
    }

    /// Runs one chunk of source.  Each phase only starts when the previous
    /// ones reported nothing; global state persists between calls.
    pub fn run(&mut self, source: &str) {
        info!("Running {} bytes of source", source.len());

        let tokens = Scanner::new(source).scan_tokens(&mut self.reporter);
        let statements = Parser::new(tokens, &mut self.reporter).parse();

        if self.reporter.had_error() {
            debug!("Stopping after syntax errors");
            return;
        }

        let locals = Resolver::new(&mut self.reporter).resolve(&statements);

        if self.reporter.had_error() {
            debug!("Stopping after resolution errors");
            return;
        }

        self.interpreter.resolve(locals);

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.reporter.report(e);
        }
    }

    pub fn had_error(&self) -> bool {
        self.reporter.had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.reporter.had_runtime_error()
    }

    /// Forgets compile-time errors from the previous REPL line.
    pub fn reset_error(&mut self) {
        self.reporter.reset();
    }

    /// The process exit status a script run should end with.
    pub fn exit_code(&self) -> i32 {
        if self.had_error() {
            EXIT_COMPILE_ERROR
        } else if self.had_runtime_error() {
            EXIT_RUNTIME_ERROR
        } else {
            0
        }
    }

    pub fn errors(&self) -> &[LoxError] {
        self.reporter.errors()
    }

    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }
}
