//! Macro store, definition mode and call expansion
//!
//! A macro body is recorded verbatim between `MACRO` and `ENDM`; the only
//! inspection done at definition time is collecting leading labels into
//! the macro's local set. At a call site the body is re-parsed line by
//! line with a substitution map that binds parameters to the call
//! arguments and every local label to a mangled global `name~k`, where
//! `k` is unique per expansion. `~` is not an identifier character, so
//! mangled names cannot be spelled in source and two expansions can never
//! collide.

use std::collections::HashMap;

use crate::assembler::lexer::Cursor;
use crate::assembler::symbols::Symbol;
use crate::assembler::word::WordValue;
use crate::assembler::{Assembler, Error};

/// Per-expansion bindings, consulted before the global symbol table
pub type SubstMap = HashMap<String, WordValue>;

#[derive(Debug, Clone)]
pub struct BodyLine {
    pub text: String,
    pub line_number: usize,
}

#[derive(Debug, Clone)]
pub struct Macro {
    pub params: Vec<String>,
    pub body: Vec<BodyLine>,
    pub locals: Vec<String>,
}

/// A macro between its `MACRO` line and the matching `ENDM`
#[derive(Debug)]
pub struct MacroBuilder {
    pub name: String,
    params: Vec<String>,
    body: Vec<BodyLine>,
    locals: Vec<String>,
}

impl MacroBuilder {
    fn new(name: String, params: Vec<String>) -> MacroBuilder {
        MacroBuilder {
            name,
            params,
            body: Vec::new(),
            locals: Vec::new(),
        }
    }

    fn finish(self) -> Macro {
        Macro {
            params: self.params,
            body: self.body,
            locals: self.locals,
        }
    }
}

/// Handle a `MACRO name [p1[, p2 ...]]` line
pub(crate) fn definition(
    asm: &mut Assembler,
    cur: &mut Cursor,
    line_number: usize,
) -> Result<(), Error> {
    let name = cur
        .try_identifier()
        .ok_or(Error::ExpectedMacroName { line_number })?;
    if asm.symbols.lookup(&name).is_some() {
        return Err(Error::SymbolCollision { name, line_number });
    }
    asm.symbols.insert_macro(&name, asm.macros.len());

    let mut params = Vec::new();
    loop {
        cur.skip_whitespace();
        cur.consume_comma();
        match cur.try_identifier() {
            Some(param) => {
                if params.contains(&param) {
                    return Err(Error::DuplicateParameter {
                        name: param,
                        line_number,
                    });
                }
                params.push(param);
            }
            None => break,
        }
    }

    asm.defining = Some(MacroBuilder::new(name, params));
    Ok(())
}

/// Accumulate one line of an open macro body, or close it on `ENDM`
pub(crate) fn body_line(
    asm: &mut Assembler,
    text: &str,
    line_number: usize,
) -> Result<(), Error> {
    let mut cur = Cursor::new(text);
    cur.skip_whitespace();

    let mut probe = cur;
    if probe.try_identifier().as_deref() == Some("ENDM") {
        probe.skip_whitespace();
        probe.skip_comment();
        if !probe.is_empty() {
            return Err(Error::UnexpectedTokens { line_number });
        }
        if let Some(builder) = asm.defining.take() {
            asm.macros.push(builder.finish());
        }
        return Ok(());
    }

    // The only semantic inspection at definition time: a leading label is
    // a local, and a nested definition is rejected here rather than at
    // expansion time.
    let mut scan = cur;
    let label = scan.try_label();
    if scan.try_identifier().as_deref() == Some("MACRO") {
        return Err(Error::NestedMacro { line_number });
    }
    if let Some(builder) = asm.defining.as_mut() {
        if let Some(label) = label {
            if !builder.locals.contains(&label) {
                builder.locals.push(label);
            }
        }
        builder.body.push(BodyLine {
            text: text.to_string(),
            line_number,
        });
    }
    Ok(())
}

/// Expand a macro call: parse the arguments, build the substitution map
/// and re-parse the body with it. Recursion between this and
/// `Assembler::parse_line` handles nested calls depth-first.
pub(crate) fn expand(
    asm: &mut Assembler,
    name: &str,
    cur: &mut Cursor,
    line_number: usize,
    subst: Option<&SubstMap>,
) -> Result<(), Error> {
    let index = match asm.symbols.lookup(name) {
        Some(Symbol::Macro(index)) => index,
        _ => {
            return Err(Error::UnknownMacro {
                name: name.to_string(),
                line_number,
            });
        }
    };
    let mac = asm.macros[index].clone();

    // Arguments resolve through the caller's substitution map, so a
    // nested call can forward its own parameters.
    let mut args = Vec::new();
    if let Some(first) = asm.parse_arg(cur, line_number, subst)? {
        args.push(first);
        loop {
            let mut separated = cur.skip_whitespace();
            separated |= cur.consume_comma();
            cur.skip_whitespace();
            if !separated {
                break;
            }
            match asm.parse_arg(cur, line_number, subst)? {
                Some(value) => args.push(value),
                None => break,
            }
        }
    }
    if args.len() != mac.params.len() {
        return Err(Error::ArgumentCountMismatch {
            name: name.to_string(),
            expected: mac.params.len(),
            found: args.len(),
            line_number,
        });
    }

    let k = asm.substitutions;
    asm.substitutions += 1;

    let mut map = SubstMap::new();
    for (param, arg) in mac.params.iter().zip(args) {
        map.insert(param.clone(), arg);
    }
    for local in &mac.locals {
        let mangled = format!("{}~{}", local, k);
        if let Some(id) = asm.symbols.label_id(&mangled) {
            map.insert(local.clone(), WordValue::Symbol(id));
        }
    }

    for line in &mac.body {
        asm.parse_line(&line.text, line.line_number, Some(&map))?;
    }
    Ok(())
}
