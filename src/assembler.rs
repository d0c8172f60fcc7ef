//! Converts SUBLEQ assembly into a bit-packed ROM image in a single pass
//!
//! The source language is line oriented and case insensitive: every line
//! is folded to upper-case before any parsing. A line is an optional
//! leading label `name:`, an optional statement, and an optional comment
//! starting at `;`:
//!
//! ```ignore
//! ; clear X, then loop forever
//! start:
//!     SUBLEQ X, X, next    ; X <- 0
//! next: SUBLEQ Z, Z, start
//! X: DW 7
//! Z: DW 0
//! msg: DW 'HI', 0, msg     ; strings expand one word per byte
//! ```
//!
//! Statements are the directives `SUBLEQ a, b, c` (three 26-bit operand
//! fields), `DW v1, v2, ...` (52-bit data words), `ORG address` (zero
//! padding to an absolute bit address), `MACRO name p1 p2 ...` / `ENDM`
//! (macro definition), or a macro call. Operands are decimal integers
//! (optionally negative, two's-complement in 64 bits) or identifiers;
//! there is no operand arithmetic. Labels may be referenced before they
//! are defined; assembly fails if a referenced label is never defined.
//!
//! Macros are expanded by re-parsing the recorded body with a
//! substitution map. Labels defined inside a macro body are local to one
//! expansion: each call site rewrites them to a mangled name that cannot
//! be spelled in source, so two expansions of the same macro never
//! collide (see [macros]).
//!
//! The output is a headerless binary with fields bit-packed MSB-first
//! within each byte in source order (see [emit]).

pub mod directives;
pub mod emit;
pub mod lexer;
pub mod macros;
pub mod symbols;
pub mod word;

use std::{fmt, fs};

use lexer::Cursor;
use macros::{Macro, MacroBuilder, SubstMap};
use symbols::SymbolTable;
use word::{Word, WordValue};

use crate::logging::warning;

/// Assemble a file into a ROM image
pub fn assemble_from_file(path: &str) -> Result<Vec<u8>, Error> {
    let source = fs::read_to_string(path).map_err(|_| Error::ReadError {
        path: path.to_string(),
    })?;
    assemble(&source)
}

/// Assemble source code into a ROM image
pub fn assemble(source: &str) -> Result<Vec<u8>, Error> {
    let mut assembler = Assembler::new();
    for (index, line) in source.lines().enumerate() {
        assembler.line(line, index + 1)?;
    }
    assembler.finish()
}

/// All assembly state: the symbol table, the emitted words, the macro
/// store, the open macro definition (if any) and the substitution
/// counter used to mangle macro-local labels.
pub struct Assembler {
    pub(crate) symbols: SymbolTable,
    pub(crate) code: Vec<Word>,
    pub(crate) code_size_bits: u64,
    pub(crate) macros: Vec<Macro>,
    pub(crate) defining: Option<MacroBuilder>,
    pub(crate) substitutions: u64,
}

impl Assembler {
    pub fn new() -> Assembler {
        Assembler {
            symbols: SymbolTable::new(),
            code: Vec::new(),
            code_size_bits: 0,
            macros: Vec::new(),
            defining: None,
            substitutions: 0,
        }
    }

    fn line(&mut self, raw: &str, line_number: usize) -> Result<(), Error> {
        let folded = raw.to_ascii_uppercase();
        if self.defining.is_some() {
            macros::body_line(self, &folded, line_number)
        } else {
            self.parse_line(&folded, line_number, None)
        }
    }

    /// Parse one (folded) line. `subst` is the substitution map of the
    /// enclosing macro expansion, if any; macro bodies re-enter here.
    pub(crate) fn parse_line(
        &mut self,
        text: &str,
        line_number: usize,
        subst: Option<&SubstMap>,
    ) -> Result<(), Error> {
        let mut cur = Cursor::new(text);
        cur.skip_whitespace();

        // A leading label takes the current bit address before the rest
        // of the line is processed.
        if let Some(label) = cur.try_label() {
            self.define_label(&label, subst, line_number)?;
        }

        if let Some(ident) = cur.try_identifier() {
            match ident.as_str() {
                "SUBLEQ" => directives::subleq(self, &mut cur, line_number, subst)?,
                "DW" => directives::dw(self, &mut cur, line_number, subst)?,
                "ORG" => directives::org(self, &mut cur, line_number)?,
                "MACRO" => macros::definition(self, &mut cur, line_number)?,
                "ENDM" => return Err(Error::EndmOutsideMacro { line_number }),
                _ => macros::expand(self, &ident, &mut cur, line_number, subst)?,
            }
        }

        cur.skip_whitespace();
        cur.skip_comment();
        if !cur.is_empty() {
            return Err(Error::UnexpectedTokens { line_number });
        }
        Ok(())
    }

    /// One operand: an integer literal or an identifier. Inside a macro
    /// expansion the substitution map wins over the global symbol table.
    /// Returns `Ok(None)` when the cursor holds neither, so callers can
    /// pick their own diagnostic.
    pub(crate) fn parse_arg(
        &mut self,
        cur: &mut Cursor,
        line_number: usize,
        subst: Option<&SubstMap>,
    ) -> Result<Option<WordValue>, Error> {
        if let Some(value) = cur.try_integer(line_number)? {
            return Ok(Some(WordValue::Immediate(value)));
        }
        if let Some(ident) = cur.try_identifier() {
            if let Some(bound) = subst.and_then(|map| map.get(&ident)) {
                return Ok(Some(bound.clone()));
            }
            return match self.symbols.label_id(&ident) {
                Some(id) => Ok(Some(WordValue::Symbol(id))),
                None => Err(Error::MacroAsOperand {
                    name: ident,
                    line_number,
                }),
            };
        }
        Ok(None)
    }

    pub(crate) fn push_word(&mut self, value: WordValue, size_bits: u32, source_line: usize) {
        self.code.push(Word {
            source_line,
            value,
            offset_bits: self.code_size_bits,
            size_bits,
        });
        self.code_size_bits += size_bits as u64;
    }

    fn define_label(
        &mut self,
        name: &str,
        subst: Option<&SubstMap>,
        line_number: usize,
    ) -> Result<(), Error> {
        if let Some(bound) = subst.and_then(|map| map.get(name)) {
            return match bound {
                WordValue::Symbol(id) => {
                    self.symbols.set_address(*id, self.code_size_bits);
                    Ok(())
                }
                WordValue::Immediate(_) => Err(Error::InvalidLabel {
                    name: name.to_string(),
                    line_number,
                }),
            };
        }
        match self.symbols.label_id(name) {
            Some(id) => {
                if self.symbols.address(id).is_some() {
                    warning(format!("label \"{}\" redefined", name), line_number);
                }
                self.symbols.set_address(id, self.code_size_bits);
                Ok(())
            }
            None => Err(Error::SymbolCollision {
                name: name.to_string(),
                line_number,
            }),
        }
    }

    fn finish(self) -> Result<Vec<u8>, Error> {
        if let Some(builder) = &self.defining {
            return Err(Error::UnterminatedMacro {
                name: builder.name.clone(),
            });
        }
        for word in &self.code {
            if let WordValue::Symbol(id) = word.value {
                if self.symbols.address(id).is_none() {
                    return Err(Error::UndefinedSymbol {
                        line_number: word.source_line,
                    });
                }
            }
        }
        Ok(emit::emit(&self.code, &self.symbols))
    }
}

impl Default for Assembler {
    fn default() -> Assembler {
        Assembler::new()
    }
}

/// An error that can occur during the assembly process. Every error is
/// fatal: assembly stops at the first one.
#[derive(Debug)]
pub enum Error {
    /// A string literal with no closing delimiter on its line
    UnterminatedString { line_number: usize },
    /// An integer literal whose magnitude does not fit in 64 bits
    IntegerOverflow { line_number: usize },
    /// A directive needed an operand and found none
    ExpectedArgument { line_number: usize },
    /// A `DW` item that is neither a value, an identifier nor a string
    InvalidWordValue { line_number: usize },
    /// `ORG` without a parseable address
    ExpectedAddress { line_number: usize },
    /// `ORG` below the current output size
    OrgBackwards {
        address: u64,
        size_bits: u64,
        line_number: usize,
    },
    /// Leftover tokens after a complete statement
    UnexpectedTokens { line_number: usize },
    /// A name already taken by a label or macro
    SymbolCollision { name: String, line_number: usize },
    /// A macro-body label bound to an immediate argument
    InvalidLabel { name: String, line_number: usize },
    /// `MACRO` without a name
    ExpectedMacroName { line_number: usize },
    /// The same parameter name twice in one macro
    DuplicateParameter { name: String, line_number: usize },
    /// `MACRO` inside an open macro body
    NestedMacro { line_number: usize },
    /// `ENDM` with no open macro body
    EndmOutsideMacro { line_number: usize },
    /// End of input with a macro body still open
    UnterminatedMacro { name: String },
    /// A line starting with an identifier that names no macro
    UnknownMacro { name: String, line_number: usize },
    /// A macro name where an operand was expected
    MacroAsOperand { name: String, line_number: usize },
    /// A macro call whose argument count differs from the definition
    ArgumentCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        line_number: usize,
    },
    /// A referenced label that was never defined
    UndefinedSymbol { line_number: usize },
    /// The input file could not be read
    ReadError { path: String },
}

impl std::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnterminatedString { line_number } => {
                write!(f, "unterminated string literal at line {}", line_number)
            }
            Error::IntegerOverflow { line_number } => {
                write!(f, "integer literal overflows 64 bits at line {}", line_number)
            }
            Error::ExpectedArgument { line_number } => {
                write!(f, "expected argument at line {}", line_number)
            }
            Error::InvalidWordValue { line_number } => {
                write!(f, "invalid word value at line {}", line_number)
            }
            Error::ExpectedAddress { line_number } => {
                write!(
                    f,
                    "unable to parse address in ORG directive at line {}",
                    line_number
                )
            }
            Error::OrgBackwards {
                address,
                size_bits,
                line_number,
            } => {
                write!(
                    f,
                    "ORG address ({}) is less than current code size ({}) at line {}",
                    address, size_bits, line_number
                )
            }
            Error::UnexpectedTokens { line_number } => {
                write!(f, "unexpected tokens at line {}", line_number)
            }
            Error::SymbolCollision { name, line_number } => {
                write!(
                    f,
                    "symbol \"{}\" collides with an existing definition at line {}",
                    name, line_number
                )
            }
            Error::InvalidLabel { name, line_number } => {
                write!(
                    f,
                    "macro argument \"{}\" cannot be defined as a label at line {}",
                    name, line_number
                )
            }
            Error::ExpectedMacroName { line_number } => {
                write!(f, "expected macro name at line {}", line_number)
            }
            Error::DuplicateParameter { name, line_number } => {
                write!(
                    f,
                    "duplicate macro parameter \"{}\" at line {}",
                    name, line_number
                )
            }
            Error::NestedMacro { line_number } => {
                write!(
                    f,
                    "macro definition inside a macro body at line {}",
                    line_number
                )
            }
            Error::EndmOutsideMacro { line_number } => {
                write!(
                    f,
                    "ENDM outside a macro definition at line {}",
                    line_number
                )
            }
            Error::UnterminatedMacro { name } => {
                write!(f, "macro \"{}\" has no matching ENDM", name)
            }
            Error::UnknownMacro { name, line_number } => {
                write!(f, "unknown macro \"{}\" at line {}", name, line_number)
            }
            Error::MacroAsOperand { name, line_number } => {
                write!(
                    f,
                    "macro \"{}\" used as an operand at line {}",
                    name, line_number
                )
            }
            Error::ArgumentCountMismatch {
                name,
                expected,
                found,
                line_number,
            } => {
                write!(
                    f,
                    "macro \"{}\" expects {} arguments, found {} at line {}",
                    name, expected, found, line_number
                )
            }
            Error::UndefinedSymbol { line_number } => {
                write!(f, "undefined symbol at line {}", line_number)
            }
            Error::ReadError { path } => {
                write!(f, "failed to read file {}", path)
            }
        }
    }
}
