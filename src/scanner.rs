//! Streaming lexer.
//!
//! [`Scanner`] is an iterator of `Result<Token>`: a lexical error is yielded in
//! place of the token it spoiled and the next call resumes right after the bad
//! input, so one pass reports every problem.  The stream always ends with a
//! single `EOF` token.
//!
//! ```rust
//! use lox_interpreter::scanner::Scanner;
//!
//! let scanner = Scanner::new("print 123; // example");
//! for result in scanner {
//!     match result {
//!         Ok(token) => println!("{}", token),
//!         Err(err) => eprintln!("{}", err),
//!     }
//! }
//! ```

use crate::error::{ErrorReporter, LoxError, Result};
use crate::token::{Token, TokenType};
use log::{debug, info};
use memchr::memchr;
use phf::phf_map;
use std::iter::FusedIterator;

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and"    => TokenType::AND,
    b"break"  => TokenType::BREAK,
    b"class"  => TokenType::CLASS,
    b"else"   => TokenType::ELSE,
    b"false"  => TokenType::FALSE,
    b"fun"    => TokenType::FUN,
    b"for"    => TokenType::FOR,
    b"if"     => TokenType::IF,
    b"nil"    => TokenType::NIL,
    b"or"     => TokenType::OR,
    b"print"  => TokenType::PRINT,
    b"return" => TokenType::RETURN,
    b"super"  => TokenType::SUPER,
    b"this"   => TokenType::THIS,
    b"true"   => TokenType::TRUE,
    b"var"    => TokenType::VAR,
    b"while"  => TokenType::WHILE,
};

pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    /// First byte of the lexeme being scanned.
    start: usize,
    /// Next unread byte.
    current: usize,
    line: usize,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Scanner {
            source,
            bytes: source.as_bytes(),
            start: 0,
            current: 0,
            line: 1,
            finished: false,
        }
    }

    /// Scan the whole input, reporting lexical errors as they are found.
    /// The returned stream always ends with an `EOF` token.
    pub fn scan_tokens(self, reporter: &mut ErrorReporter) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),
                Err(e) => reporter.report(e),
            }
        }

        info!("Scanned {} tokens", tokens.len());

        tokens
    }

    #[inline]
    fn at_end(&self) -> bool {
        self.current >= self.bytes.len()
    }

    /// The byte `offset` positions ahead, or `0` past the end.
    #[inline]
    fn look(&self, offset: usize) -> u8 {
        self.bytes.get(self.current + offset).copied().unwrap_or(0)
    }

    #[inline]
    fn bump(&mut self) -> u8 {
        let b = self.look(0);
        self.current += 1;
        if b == b'\n' {
            self.line += 1;
        }
        b
    }

    /// `matched` if the next byte is `=`, consuming it; `single` otherwise.
    fn with_equals(&mut self, matched: TokenType, single: TokenType) -> TokenType {
        if self.look(0) == b'=' {
            self.current += 1;
            matched
        } else {
            single
        }
    }

    /// Skips whitespace and both comment forms.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.look(0), self.look(1)) {
                (b' ' | b'\r' | b'\t' | b'\n', _) => {
                    self.bump();
                }

                (b'/', b'/') => {
                    // The newline stays unread so `bump` counts it.
                    self.current = match memchr(b'\n', &self.bytes[self.current..]) {
                        Some(offset) => self.current + offset,
                        None => self.bytes.len(),
                    };
                }

                (b'/', b'*') => {
                    let opened_on: usize = self.line;
                    self.current += 2;

                    while !(self.look(0) == b'*' && self.look(1) == b'/') {
                        if self.at_end() {
                            debug!("Block comment opened on line {} never closed", opened_on);
                            return Err(LoxError::lex(self.line, "Unterminated block comment."));
                        }
                        self.bump();
                    }

                    self.current += 2;
                }

                _ => return Ok(()),
            }
        }
    }

    /// Scans one lexeme starting at `self.start`.
    fn scan_token(&mut self) -> Result<TokenType> {
        let kind: TokenType = match self.bump() {
            b'(' => TokenType::LEFT_PAREN,
            b')' => TokenType::RIGHT_PAREN,
            b'{' => TokenType::LEFT_BRACE,
            b'}' => TokenType::RIGHT_BRACE,
            b',' => TokenType::COMMA,
            b'.' => TokenType::DOT,
            b'-' => TokenType::MINUS,
            b'+' => TokenType::PLUS,
            b';' => TokenType::SEMICOLON,
            b'*' => TokenType::STAR,
            b'/' => TokenType::SLASH,

            b'!' => self.with_equals(TokenType::BANG_EQUAL, TokenType::BANG),
            b'=' => self.with_equals(TokenType::EQUAL_EQUAL, TokenType::EQUAL),
            b'<' => self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS),
            b'>' => self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER),

            b'"' => self.string()?,
            b'0'..=b'9' => self.number(),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.identifier(),

            _ => {
                // Report a multi-byte character once, as a whole.
                while (self.look(0) & 0xC0) == 0x80 {
                    self.current += 1;
                }

                return Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: {}", &self.source[self.start..self.current]),
                ));
            }
        };

        Ok(kind)
    }

    /// Body of a `"…"` literal; no escapes, may span lines.
    fn string(&mut self) -> Result<TokenType> {
        while !self.at_end() && self.look(0) != b'"' {
            self.bump();
        }

        if self.at_end() {
            return Err(LoxError::lex(self.line, "Unterminated string."));
        }

        self.current += 1;

        let contents: &str = &self.source[self.start + 1..self.current - 1];

        Ok(TokenType::STRING(contents.to_owned()))
    }

    /// `123` or `3.14`.  A `.` not followed by a digit is left alone.
    fn number(&mut self) -> TokenType {
        while self.look(0).is_ascii_digit() {
            self.current += 1;
        }

        if self.look(0) == b'.' && self.look(1).is_ascii_digit() {
            self.current += 1;

            while self.look(0).is_ascii_digit() {
                self.current += 1;
            }
        }

        // Only ASCII digits and one dot were consumed.
        let value: f64 = self.source[self.start..self.current]
            .parse()
            .unwrap_or_default();

        TokenType::NUMBER(value)
    }

    fn identifier(&mut self) -> TokenType {
        while self.look(0).is_ascii_alphanumeric() || self.look(0) == b'_' {
            self.current += 1;
        }

        KEYWORDS
            .get(&self.bytes[self.start..self.current])
            .cloned()
            .unwrap_or(TokenType::IDENTIFIER)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        if let Err(e) = self.skip_trivia() {
            return Some(Err(e));
        }

        if self.at_end() {
            self.finished = true;
            return Some(Ok(Token::new(TokenType::EOF, "", self.line)));
        }

        self.start = self.current;

        Some(self.scan_token().map(|kind| {
            let lexeme: &str = &self.source[self.start..self.current];
            debug!("Scanned {:?} '{}' on line {}", kind, lexeme, self.line);

            Token::new(kind, lexeme, self.line)
        }))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
