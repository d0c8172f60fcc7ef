//! Symbol table shared by labels and macros
//!
//! Labels and macro names live in one namespace and collide. A label's
//! address slot is created eagerly on first reference so forward
//! references work; the slot stays `None` until the label is defined.

use std::collections::HashMap;

/// Index of a label's address slot
pub type SymbolId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Label(SymbolId),
    Macro(usize),
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    map: HashMap<String, Symbol>,
    addresses: Vec<Option<u64>>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.map.get(name).copied()
    }

    /// Get the label id for `name`, creating an undefined slot if the name
    /// is new. Returns `None` if the name is taken by a macro.
    pub fn label_id(&mut self, name: &str) -> Option<SymbolId> {
        match self.map.get(name) {
            Some(Symbol::Label(id)) => Some(*id),
            Some(Symbol::Macro(_)) => None,
            None => {
                let id = self.addresses.len();
                self.addresses.push(None);
                self.map.insert(name.to_string(), Symbol::Label(id));
                Some(id)
            }
        }
    }

    /// Register `name` as a macro. The caller checks for collisions first.
    pub fn insert_macro(&mut self, name: &str, index: usize) {
        self.map.insert(name.to_string(), Symbol::Macro(index));
    }

    pub fn address(&self, id: SymbolId) -> Option<u64> {
        self.addresses[id]
    }

    pub fn set_address(&mut self, id: SymbolId, address: u64) {
        self.addresses[id] = Some(address);
    }
}
