//! The `autores` cell: a bracketed list of string literals.
//!
//! Accepted grammar (whitespace allowed between any two tokens):
//!
//! ```text
//! list    := '[' ( string ( ',' string )* ','? )? ']'
//! string  := literal ( literal )*          adjacent literals concatenate
//! literal := prefix? ( '"' chars '"' | '\'' chars '\'' )
//! prefix  := 'u' | 'U' | 'r' | 'R'
//! ```
//!
//! Escapes follow the usual literal rules: `\\ \' \" \n \r \t \a \b \f \v`,
//! octal `\ooo`, `\xHH`, `\uXXXX`, `\UXXXXXXXX`, and backslash-newline as a
//! line continuation. An unrecognised escape keeps its backslash. A raw
//! (`r`) literal keeps every backslash; a backslash still stops the next
//! quote from closing it. Nothing else is evaluated: byte strings, numbers,
//! nested lists, names and trailing input are errors.

use std::fmt::Write as _;

use thiserror::Error;

/// Why an `autores` cell was rejected, and the byte offset where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {offset}")]
pub struct AuthorsParseError {
    pub offset: usize,
    pub kind: AuthorsErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorsErrorKind {
    #[error("expected `[`")]
    ExpectedOpenBracket,
    #[error("expected a quoted string")]
    ExpectedString,
    #[error("expected `,` or `]`")]
    ExpectedCommaOrClose,
    #[error("list is not closed")]
    UnclosedList,
    #[error("string is not terminated")]
    UnterminatedString,
    #[error("invalid escape sequence")]
    InvalidEscape,
    #[error("unexpected input after `]`")]
    TrailingInput,
}

/// Parse an `autores` cell such as `["Ana", 'Bruno']`.
pub fn parse_authors(input: &str) -> Result<Vec<String>, AuthorsParseError> {
    Parser { src: input, pos: 0 }.list()
}

/// Render authors in the form [`parse_authors`] reads back exactly.
pub fn render_authors(authors: &[String]) -> String {
    let mut out = String::from("[");
    for (i, author) in authors.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('"');
        for c in author.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '"' => out.push_str("\\\""),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(out, "\\u{:04x}", c as u32);
                }
                c => out.push(c),
            }
        }
        out.push('"');
    }
    out.push(']');
    out
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: AuthorsErrorKind) -> AuthorsParseError {
        AuthorsParseError {
            offset: self.pos,
            kind,
        }
    }

    /// Whether a string literal, with or without prefix, starts here.
    fn at_literal(&self) -> bool {
        let mut chars = self.src[self.pos..].chars();
        match chars.next() {
            Some('"' | '\'') => true,
            Some('u' | 'U' | 'r' | 'R') => matches!(chars.next(), Some('"' | '\'')),
            _ => false,
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(' ' | '\t' | '\n' | '\r' | '\x0c')) {
            self.bump();
        }
    }

    fn list(mut self) -> Result<Vec<String>, AuthorsParseError> {
        self.skip_whitespace();
        if self.peek() != Some('[') {
            return Err(self.error(AuthorsErrorKind::ExpectedOpenBracket));
        }
        self.bump();

        let mut authors = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(_) if self.at_literal() => authors.push(self.string()?),
                Some(_) => return Err(self.error(AuthorsErrorKind::ExpectedString)),
                None => return Err(self.error(AuthorsErrorKind::UnclosedList)),
            }

            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(_) => return Err(self.error(AuthorsErrorKind::ExpectedCommaOrClose)),
                None => return Err(self.error(AuthorsErrorKind::UnclosedList)),
            }
        }

        self.skip_whitespace();
        if self.pos != self.src.len() {
            return Err(self.error(AuthorsErrorKind::TrailingInput));
        }
        Ok(authors)
    }

    /// One or more adjacent literals, concatenated.
    fn string(&mut self) -> Result<String, AuthorsParseError> {
        let mut value = String::new();
        self.literal(&mut value)?;
        loop {
            let checkpoint = self.pos;
            self.skip_whitespace();
            if self.at_literal() {
                self.literal(&mut value)?;
            } else {
                self.pos = checkpoint;
                return Ok(value);
            }
        }
    }

    fn literal(&mut self, out: &mut String) -> Result<(), AuthorsParseError> {
        let start = self.pos;
        let unterminated = AuthorsParseError {
            offset: start,
            kind: AuthorsErrorKind::UnterminatedString,
        };
        let raw = match self.peek() {
            Some('r' | 'R') => {
                self.bump();
                true
            }
            Some('u' | 'U') => {
                self.bump();
                false
            }
            _ => false,
        };
        let Some(quote) = self.bump() else {
            return Err(self.error(AuthorsErrorKind::ExpectedString));
        };

        loop {
            match self.bump() {
                None | Some('\n') => return Err(unterminated),
                Some(c) if c == quote => return Ok(()),
                Some('\\') if raw => {
                    out.push('\\');
                    match self.bump() {
                        None => return Err(unterminated),
                        Some(c) => out.push(c),
                    }
                }
                Some('\\') => self.escape(out)?,
                Some(c) => out.push(c),
            }
        }
    }

    fn escape(&mut self, out: &mut String) -> Result<(), AuthorsParseError> {
        let escape_start = self.pos - 1;
        let Some(c) = self.bump() else {
            return Err(AuthorsParseError {
                offset: escape_start,
                kind: AuthorsErrorKind::UnterminatedString,
            });
        };
        match c {
            '\n' => {}
            '\\' | '\'' | '"' => out.push(c),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = c.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            self.bump();
                        }
                        None => break,
                    }
                }
                out.push(self.code_point(code, escape_start)?);
            }
            'x' => {
                let code = self.hex_digits(2, escape_start)?;
                out.push(self.code_point(code, escape_start)?);
            }
            'u' => {
                let code = self.hex_digits(4, escape_start)?;
                out.push(self.code_point(code, escape_start)?);
            }
            'U' => {
                let code = self.hex_digits(8, escape_start)?;
                out.push(self.code_point(code, escape_start)?);
            }
            'N' => {
                return Err(AuthorsParseError {
                    offset: escape_start,
                    kind: AuthorsErrorKind::InvalidEscape,
                });
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn hex_digits(&mut self, count: usize, escape_start: usize) -> Result<u32, AuthorsParseError> {
        let mut code = 0u32;
        for _ in 0..count {
            let digit = self
                .peek()
                .and_then(|d| d.to_digit(16))
                .ok_or(AuthorsParseError {
                    offset: escape_start,
                    kind: AuthorsErrorKind::InvalidEscape,
                })?;
            self.bump();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn code_point(&self, code: u32, escape_start: usize) -> Result<char, AuthorsParseError> {
        char::from_u32(code).ok_or(AuthorsParseError {
            offset: escape_start,
            kind: AuthorsErrorKind::InvalidEscape,
        })
    }
}
