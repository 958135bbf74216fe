// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use semtrex::semantics::CSTRING;
use semtrex::semantics::INTEGER;
use semtrex::semantics::NULL_STRUCTURE;
use semtrex::semantics::NULL_SYMBOL;
use semtrex::semantics::SEMTREX_GROUP;
use semtrex::semantics::SEMTREX_SYMBOL_LITERAL;
use semtrex::semantics::SEMTREX_WALK;
use semtrex::semantics::TREE_PATH;
use semtrex::Registry;
use semtrex::SemKind;

#[test]
fn builtin_ids_are_stable() {
    let registry = Registry::new();
    assert_eq!(CSTRING.id, 5);
    assert_eq!(TREE_PATH.id, 10);
    assert_eq!(SEMTREX_SYMBOL_LITERAL.id, 20);
    assert_eq!(SEMTREX_GROUP.id, 34);
    assert_eq!(SEMTREX_WALK.id, 36);
    assert_eq!(registry.label(SEMTREX_GROUP), Some("SEMTREX_GROUP"));
    assert_eq!(registry.label(CSTRING), Some("CSTRING"));
    assert_eq!(registry.symbol_named("SEMTREX_WALK"), Some(SEMTREX_WALK));
    assert_eq!(registry.structure_named("INTEGER"), Some(INTEGER));
}

#[test]
fn the_null_sentinels_are_distinct() {
    assert_ne!(NULL_SYMBOL, NULL_STRUCTURE);
    assert!(NULL_SYMBOL.is_null());
    assert_eq!(NULL_SYMBOL.kind, SemKind::Symbol);
    assert_eq!(NULL_STRUCTURE.kind, SemKind::Structure);
}

#[test]
fn user_definitions_never_collide_with_builtins() {
    let mut registry = Registry::new();
    let first = registry.define_symbol(0, CSTRING, "first");
    let second = registry.define_symbol(0, CSTRING, "second");
    assert!(first.id > SEMTREX_WALK.id);
    assert_eq!(second.id, first.id + 1);
    assert_eq!(registry.label(first), Some("first"));
    assert_eq!(registry.structure_of(first), Some(CSTRING));
}

#[test]
fn lookups_by_name_search_contexts_in_order() {
    let mut registry = Registry::new();
    let in_zero = registry.define_symbol(0, CSTRING, "shared");
    let in_two = registry.define_symbol(2, CSTRING, "shared");
    assert_ne!(in_zero, in_two);
    // The lowest context wins.
    assert_eq!(registry.symbol_named("shared"), Some(in_zero));
    assert_eq!(registry.symbol_named("missing"), None);
}

#[test]
fn structures_record_their_parts() {
    let mut registry = Registry::new();
    let pair = registry.define_structure(0, "PAIR", &[INTEGER, INTEGER]);
    assert_eq!(registry.structure_parts(pair), Some(&[INTEGER, INTEGER][..]));
    assert_eq!(registry.structure_named("PAIR"), Some(pair));
}
