// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Defines semantic identifiers and the registry that names them

use std::collections::BTreeMap;
use std::fmt;

/// The kind of concept a [`SemId`] names.
///
/// Discriminants are stable; the binary tree format writes them as `i32`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[repr(i32)]
pub enum SemKind {
    Structure = 1,
    Symbol = 2,
    Process = 3,
    Receptor = 4,
    Protocol = 5,
}

impl SemKind {
    pub fn from_i32(value: i32) -> Option<SemKind> {
        match value {
            1 => Some(SemKind::Structure),
            2 => Some(SemKind::Symbol),
            3 => Some(SemKind::Process),
            4 => Some(SemKind::Receptor),
            5 => Some(SemKind::Protocol),
            _ => None,
        }
    }
}

impl fmt::Display for SemKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            SemKind::Structure => "structure",
            SemKind::Symbol => "symbol",
            SemKind::Process => "process",
            SemKind::Receptor => "receptor",
            SemKind::Protocol => "protocol",
        };
        write!(f, "{}", name)
    }
}

/// A semantic identifier: a `(context, kind, id)` triple naming a symbol,
/// structure, or other concept.  Equality is component-wise.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SemId {
    pub context: u32,
    pub kind: SemKind,
    pub id: u32,
}

impl SemId {
    pub const fn new(context: u32, kind: SemKind, id: u32) -> SemId {
        SemId { context, kind, id }
    }

    /// A symbol in the system context.
    pub const fn sys_symbol(id: u32) -> SemId {
        SemId::new(SYS_CONTEXT, SemKind::Symbol, id)
    }

    /// A structure in the system context.
    pub const fn sys_structure(id: u32) -> SemId {
        SemId::new(SYS_CONTEXT, SemKind::Structure, id)
    }

    pub fn is_null(&self) -> bool {
        self.id == 0
    }
}

impl fmt::Display for SemId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.context, self.kind, self.id)
    }
}

/// The system context.
pub const SYS_CONTEXT: u32 = 0;

pub const NULL_SYMBOL: SemId = SemId::sys_symbol(0);
pub const NULL_STRUCTURE: SemId = SemId::sys_structure(0);

// Built-in structures.
pub const BIT: SemId = SemId::sys_structure(1);
pub const INTEGER: SemId = SemId::sys_structure(2);
pub const FLOAT: SemId = SemId::sys_structure(3);
pub const CHAR: SemId = SemId::sys_structure(4);
pub const CSTRING: SemId = SemId::sys_structure(5);
pub const SYMBOL: SemId = SemId::sys_structure(6);
pub const BLOB: SemId = SemId::sys_structure(7);
pub const INTEGER64: SemId = SemId::sys_structure(8);
pub const TREE: SemId = SemId::sys_structure(9);
pub const TREE_PATH: SemId = SemId::sys_structure(10);

// Pattern-operator symbols.  These tag the nodes of a pattern tree.
pub const SEMTREX_SYMBOL_LITERAL: SemId = SemId::sys_symbol(20);
pub const SEMTREX_SYMBOL_LITERAL_NOT: SemId = SemId::sys_symbol(21);
pub const SEMTREX_SYMBOL: SemId = SemId::sys_symbol(22);
pub const SEMTREX_SYMBOL_SET: SemId = SemId::sys_symbol(23);
pub const SEMTREX_SYMBOL_ANY: SemId = SemId::sys_symbol(24);
pub const SEMTREX_SEQUENCE: SemId = SemId::sys_symbol(25);
pub const SEMTREX_OR: SemId = SemId::sys_symbol(26);
pub const SEMTREX_NOT: SemId = SemId::sys_symbol(27);
pub const SEMTREX_ZERO_OR_MORE: SemId = SemId::sys_symbol(28);
pub const SEMTREX_ONE_OR_MORE: SemId = SemId::sys_symbol(29);
pub const SEMTREX_ZERO_OR_ONE: SemId = SemId::sys_symbol(30);
pub const SEMTREX_VALUE_LITERAL: SemId = SemId::sys_symbol(31);
pub const SEMTREX_VALUE_LITERAL_NOT: SemId = SemId::sys_symbol(32);
pub const SEMTREX_VALUE_SET: SemId = SemId::sys_symbol(33);
pub const SEMTREX_GROUP: SemId = SemId::sys_symbol(34);
pub const SEMTREX_DESCEND: SemId = SemId::sys_symbol(35);
pub const SEMTREX_WALK: SemId = SemId::sys_symbol(36);

// Match-result symbols.
pub const SEMTREX_MATCH: SemId = SemId::sys_symbol(40);
pub const SEMTREX_MATCH_SYMBOL: SemId = SemId::sys_symbol(41);
pub const SEMTREX_MATCH_PATH: SemId = SemId::sys_symbol(42);
pub const SEMTREX_MATCH_SIBLINGS_COUNT: SemId = SemId::sys_symbol(43);

// Symbols used by the embody/replace collaborator.
pub const SEMANTIC_MAP: SemId = SemId::sys_symbol(44);
pub const SEMANTIC_LINK: SemId = SemId::sys_symbol(45);
pub const USAGE: SemId = SemId::sys_symbol(46);
pub const REPLACEMENT_VALUE: SemId = SemId::sys_symbol(47);

struct SymbolDef {
    label: String,
    structure: SemId,
}

struct StructureDef {
    label: String,
    parts: Vec<SemId>,
}

/// One context's worth of definitions.
#[derive(Default)]
struct ContextTable {
    symbols: BTreeMap<u32, SymbolDef>,
    structures: BTreeMap<u32, StructureDef>,
    next_symbol_id: u32,
    next_structure_id: u32,
}

impl ContextTable {
    fn new() -> ContextTable {
        ContextTable {
            symbols: BTreeMap::new(),
            structures: BTreeMap::new(),
            next_symbol_id: 1,
            next_structure_id: 1,
        }
    }
}

/// A process-local registry of symbol and structure definitions, partitioned
/// by context.  Lookups by name search contexts in ascending order and return
/// the first hit, so iteration order is deterministic.
pub struct Registry {
    contexts: BTreeMap<u32, ContextTable>,
}

impl Registry {
    /// Creates a registry with the built-in definitions installed.
    pub fn new() -> Registry {
        let mut registry = Registry {
            contexts: BTreeMap::new(),
        };
        registry.install_builtins();
        registry
    }

    fn context_mut(&mut self, context: u32) -> &mut ContextTable {
        self.contexts.entry(context).or_insert_with(ContextTable::new)
    }

    /// Defines a new symbol in `context`, allocating the next free id.
    pub fn define_symbol(&mut self, context: u32, structure: SemId, label: &str) -> SemId {
        let table = self.context_mut(context);
        let id = table.next_symbol_id;
        table.next_symbol_id += 1;
        table.symbols.insert(
            id,
            SymbolDef {
                label: label.to_string(),
                structure,
            },
        );
        SemId::new(context, SemKind::Symbol, id)
    }

    /// Defines a new structure in `context`, allocating the next free id.
    pub fn define_structure(&mut self, context: u32, label: &str, parts: &[SemId]) -> SemId {
        let table = self.context_mut(context);
        let id = table.next_structure_id;
        table.next_structure_id += 1;
        table.structures.insert(
            id,
            StructureDef {
                label: label.to_string(),
                parts: parts.to_vec(),
            },
        );
        SemId::new(context, SemKind::Structure, id)
    }

    /// Returns the label of a symbol or structure, if it is defined.
    pub fn label(&self, id: SemId) -> Option<&str> {
        let table = self.contexts.get(&id.context)?;
        match id.kind {
            SemKind::Symbol => table.symbols.get(&id.id).map(|d| d.label.as_str()),
            SemKind::Structure => table.structures.get(&id.id).map(|d| d.label.as_str()),
            _ => None,
        }
    }

    /// Returns the structure a symbol's surface is declared to carry.
    pub fn structure_of(&self, symbol: SemId) -> Option<SemId> {
        let table = self.contexts.get(&symbol.context)?;
        table.symbols.get(&symbol.id).map(|d| d.structure)
    }

    /// Returns the ordered parts of a structure definition.
    pub fn structure_parts(&self, structure: SemId) -> Option<&[SemId]> {
        let table = self.contexts.get(&structure.context)?;
        table
            .structures
            .get(&structure.id)
            .map(|d| d.parts.as_slice())
    }

    /// Finds a symbol by label, searching contexts in ascending order.
    pub fn symbol_named(&self, label: &str) -> Option<SemId> {
        for (&context, table) in &self.contexts {
            for (&id, def) in &table.symbols {
                if def.label == label {
                    return Some(SemId::new(context, SemKind::Symbol, id));
                }
            }
        }
        None
    }

    /// Finds a structure by label, searching contexts in ascending order.
    pub fn structure_named(&self, label: &str) -> Option<SemId> {
        for (&context, table) in &self.contexts {
            for (&id, def) in &table.structures {
                if def.label == label {
                    return Some(SemId::new(context, SemKind::Structure, id));
                }
            }
        }
        None
    }

    /// Writes a definition at a fixed id, bypassing allocation.  Only the
    /// builtin installer uses this; it must run before any user definitions
    /// so the allocators never hand out an occupied id.
    fn install_symbol(&mut self, id: SemId, structure: SemId, label: &str) {
        let table = self.context_mut(id.context);
        table.symbols.insert(
            id.id,
            SymbolDef {
                label: label.to_string(),
                structure,
            },
        );
        if table.next_symbol_id <= id.id {
            table.next_symbol_id = id.id + 1;
        }
    }

    fn install_structure(&mut self, id: SemId, label: &str, parts: &[SemId]) {
        let table = self.context_mut(id.context);
        table.structures.insert(
            id.id,
            StructureDef {
                label: label.to_string(),
                parts: parts.to_vec(),
            },
        );
        if table.next_structure_id <= id.id {
            table.next_structure_id = id.id + 1;
        }
    }

    fn install_builtins(&mut self) {
        self.install_structure(BIT, "BIT", &[]);
        self.install_structure(INTEGER, "INTEGER", &[]);
        self.install_structure(FLOAT, "FLOAT", &[]);
        self.install_structure(CHAR, "CHAR", &[]);
        self.install_structure(CSTRING, "CSTRING", &[]);
        self.install_structure(SYMBOL, "SYMBOL", &[]);
        self.install_structure(BLOB, "BLOB", &[]);
        self.install_structure(INTEGER64, "INTEGER64", &[]);
        self.install_structure(TREE, "TREE", &[]);
        self.install_structure(TREE_PATH, "TREE_PATH", &[]);

        self.install_symbol(SEMTREX_SYMBOL_LITERAL, TREE, "SEMTREX_SYMBOL_LITERAL");
        self.install_symbol(
            SEMTREX_SYMBOL_LITERAL_NOT,
            TREE,
            "SEMTREX_SYMBOL_LITERAL_NOT",
        );
        self.install_symbol(SEMTREX_SYMBOL, SYMBOL, "SEMTREX_SYMBOL");
        self.install_symbol(SEMTREX_SYMBOL_SET, TREE, "SEMTREX_SYMBOL_SET");
        self.install_symbol(SEMTREX_SYMBOL_ANY, TREE, "SEMTREX_SYMBOL_ANY");
        self.install_symbol(SEMTREX_SEQUENCE, TREE, "SEMTREX_SEQUENCE");
        self.install_symbol(SEMTREX_OR, TREE, "SEMTREX_OR");
        self.install_symbol(SEMTREX_NOT, TREE, "SEMTREX_NOT");
        self.install_symbol(SEMTREX_ZERO_OR_MORE, TREE, "SEMTREX_ZERO_OR_MORE");
        self.install_symbol(SEMTREX_ONE_OR_MORE, TREE, "SEMTREX_ONE_OR_MORE");
        self.install_symbol(SEMTREX_ZERO_OR_ONE, TREE, "SEMTREX_ZERO_OR_ONE");
        self.install_symbol(SEMTREX_VALUE_LITERAL, TREE, "SEMTREX_VALUE_LITERAL");
        self.install_symbol(
            SEMTREX_VALUE_LITERAL_NOT,
            TREE,
            "SEMTREX_VALUE_LITERAL_NOT",
        );
        self.install_symbol(SEMTREX_VALUE_SET, TREE, "SEMTREX_VALUE_SET");
        self.install_symbol(SEMTREX_GROUP, SYMBOL, "SEMTREX_GROUP");
        self.install_symbol(SEMTREX_DESCEND, TREE, "SEMTREX_DESCEND");
        self.install_symbol(SEMTREX_WALK, TREE, "SEMTREX_WALK");

        self.install_symbol(SEMTREX_MATCH, TREE, "SEMTREX_MATCH");
        self.install_symbol(SEMTREX_MATCH_SYMBOL, SYMBOL, "SEMTREX_MATCH_SYMBOL");
        self.install_symbol(SEMTREX_MATCH_PATH, TREE_PATH, "SEMTREX_MATCH_PATH");
        self.install_symbol(
            SEMTREX_MATCH_SIBLINGS_COUNT,
            INTEGER,
            "SEMTREX_MATCH_SIBLINGS_COUNT",
        );

        self.install_symbol(SEMANTIC_MAP, TREE, "SEMANTIC_MAP");
        self.install_symbol(SEMANTIC_LINK, TREE, "SEMANTIC_LINK");
        self.install_symbol(USAGE, SYMBOL, "USAGE");
        self.install_symbol(REPLACEMENT_VALUE, TREE, "REPLACEMENT_VALUE");
    }
}

impl Default for Registry {
    fn default() -> Registry {
        Registry::new()
    }
}
