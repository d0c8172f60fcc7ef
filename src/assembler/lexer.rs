//! Lexical primitives over one source line
//!
//! Lines are folded to upper-case before they reach the lexer, so token
//! patterns only need the upper-case alphabet. All primitives are
//! consume-style: on a match they advance the cursor past the token, on a
//! miss they leave it untouched so the caller can try something else.

use std::sync::LazyLock;

use regex::Regex;

use crate::assembler::Error;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+").expect("integer pattern"));
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z_][A-Z0-9_]*").expect("identifier pattern"));

/// A cursor over the unparsed remainder of one source line
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Cursor<'a> {
        Cursor { rest: line }
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Skip spaces and tabs; reports whether anything was skipped
    pub fn skip_whitespace(&mut self) -> bool {
        let trimmed = self.rest.trim_start_matches([' ', '\t']);
        let skipped = trimmed.len() < self.rest.len();
        self.rest = trimmed;
        skipped
    }

    /// Consume one optional comma
    pub fn consume_comma(&mut self) -> bool {
        match self.rest.strip_prefix(',') {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// A semicolon kills the remainder of the line
    pub fn skip_comment(&mut self) {
        if self.rest.starts_with(';') {
            self.rest = "";
        }
    }

    /// Decimal integer literal with an optional leading `-`. Negative
    /// values are the 64-bit two's-complement of the magnitude. A literal
    /// whose magnitude does not fit in 64 bits is a fatal error; a
    /// non-integer leaves the cursor untouched.
    pub fn try_integer(&mut self, line_number: usize) -> Result<Option<u64>, Error> {
        let mut probe = *self;
        probe.skip_whitespace();
        let Some(found) = INTEGER.find(probe.rest) else {
            return Ok(None);
        };
        let lexeme = found.as_str();
        let (negative, digits) = match lexeme.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, lexeme),
        };
        let magnitude: u64 = digits
            .parse()
            .map_err(|_| Error::IntegerOverflow { line_number })?;
        probe.rest = &probe.rest[found.end()..];
        *self = probe;
        Ok(Some(if negative {
            magnitude.wrapping_neg()
        } else {
            magnitude
        }))
    }

    /// Identifier: a letter or `_`, then letters, digits or `_`. Maximal
    /// munch, so a directive keyword only matches when followed by
    /// end-of-line, whitespace or a non-alphanumeric character.
    pub fn try_identifier(&mut self) -> Option<String> {
        let mut probe = *self;
        probe.skip_whitespace();
        let found = IDENTIFIER.find(probe.rest)?;
        let identifier = found.as_str().to_string();
        probe.rest = &probe.rest[found.end()..];
        *self = probe;
        Some(identifier)
    }

    /// Label: an identifier followed by optional whitespace and `:`.
    /// Restores the cursor when the colon is missing.
    pub fn try_label(&mut self) -> Option<String> {
        let mut probe = *self;
        let identifier = probe.try_identifier()?;
        probe.skip_whitespace();
        let rest = probe.rest.strip_prefix(':')?;
        probe.rest = rest;
        probe.skip_whitespace();
        *self = probe;
        Some(identifier)
    }

    /// String literal delimited by `'` or `"`, yielding its raw bytes.
    /// A NUL byte or the end of the line before the closing delimiter is
    /// a fatal unterminated-string error.
    pub fn take_string(&mut self, line_number: usize) -> Result<Option<Vec<u8>>, Error> {
        let bytes = self.rest.as_bytes();
        let delimiter = match bytes.first() {
            Some(&b @ (b'\'' | b'"')) => b,
            _ => return Ok(None),
        };
        for (i, &byte) in bytes[1..].iter().enumerate() {
            if byte == delimiter {
                let content = bytes[1..1 + i].to_vec();
                // the delimiter is ASCII, so this lands on a char boundary
                self.rest = &self.rest[2 + i..];
                return Ok(Some(content));
            }
            if byte == b'\n' || byte == 0 {
                break;
            }
        }
        Err(Error::UnterminatedString { line_number })
    }
}
