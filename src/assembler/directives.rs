//! `SUBLEQ`, `DW` and `ORG` directive handlers

use crate::assembler::lexer::Cursor;
use crate::assembler::macros::SubstMap;
use crate::assembler::word::{DATA_BITS, OPERAND_BITS, WordValue};
use crate::assembler::{Assembler, Error};

/// `SUBLEQ a, b, c` — three operand fields of 26 bits each
pub(crate) fn subleq(
    asm: &mut Assembler,
    cur: &mut Cursor,
    line_number: usize,
    subst: Option<&SubstMap>,
) -> Result<(), Error> {
    let a = required_arg(asm, cur, line_number, subst)?;
    separator(cur, line_number)?;
    let b = required_arg(asm, cur, line_number, subst)?;
    separator(cur, line_number)?;
    let c = required_arg(asm, cur, line_number, subst)?;

    asm.push_word(a, OPERAND_BITS, line_number);
    asm.push_word(b, OPERAND_BITS, line_number);
    asm.push_word(c, OPERAND_BITS, line_number);
    Ok(())
}

fn required_arg(
    asm: &mut Assembler,
    cur: &mut Cursor,
    line_number: usize,
    subst: Option<&SubstMap>,
) -> Result<WordValue, Error> {
    asm.parse_arg(cur, line_number, subst)?
        .ok_or(Error::ExpectedArgument { line_number })
}

// Optional whitespace, optional comma, optional whitespace; at least one
// of the three must consume something.
fn separator(cur: &mut Cursor, line_number: usize) -> Result<(), Error> {
    let mut separated = cur.skip_whitespace();
    separated |= cur.consume_comma();
    cur.skip_whitespace();
    if separated {
        Ok(())
    } else {
        Err(Error::ExpectedArgument { line_number })
    }
}

/// `DW v1, v2, ...` — one 52-bit word per value; a string literal expands
/// to one word per byte
pub(crate) fn dw(
    asm: &mut Assembler,
    cur: &mut Cursor,
    line_number: usize,
    subst: Option<&SubstMap>,
) -> Result<(), Error> {
    cur.skip_whitespace();
    cur.skip_comment();
    while !cur.is_empty() {
        if let Some(bytes) = cur.take_string(line_number)? {
            for byte in bytes {
                asm.push_word(WordValue::Immediate(byte as u64), DATA_BITS, line_number);
            }
        } else {
            match asm.parse_arg(cur, line_number, subst)? {
                Some(value) => asm.push_word(value, DATA_BITS, line_number),
                None => return Err(Error::InvalidWordValue { line_number }),
            }
        }
        cur.skip_whitespace();
        cur.consume_comma();
        cur.skip_whitespace();
        cur.skip_comment();
    }
    Ok(())
}

/// `ORG address` — pad with zero words until the output is `address` bits
/// long. Moving backwards is fatal; the padding need not be a whole
/// number of 52-bit words.
pub(crate) fn org(
    asm: &mut Assembler,
    cur: &mut Cursor,
    line_number: usize,
) -> Result<(), Error> {
    let address = cur
        .try_integer(line_number)?
        .ok_or(Error::ExpectedAddress { line_number })?;
    if address < asm.code_size_bits {
        return Err(Error::OrgBackwards {
            address,
            size_bits: asm.code_size_bits,
            line_number,
        });
    }
    while asm.code_size_bits + DATA_BITS as u64 <= address {
        asm.push_word(WordValue::Immediate(0), DATA_BITS, line_number);
    }
    let remainder = address - asm.code_size_bits;
    if remainder > 0 {
        asm.push_word(WordValue::Immediate(0), remainder as u32, line_number);
    }
    Ok(())
}
