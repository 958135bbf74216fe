// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use semtrex::automaton::BuildError;
use semtrex::semantics::CSTRING;
use semtrex::semantics::SEMTREX_GROUP;
use semtrex::semantics::SEMTREX_OR;
use semtrex::semantics::SEMTREX_SEQUENCE;
use semtrex::semantics::SEMTREX_SYMBOL;
use semtrex::semantics::SEMTREX_SYMBOL_LITERAL;
use semtrex::semantics::SEMTREX_ZERO_OR_MORE;
use semtrex::Automaton;
use semtrex::Registry;
use semtrex::SemId;
use semtrex::Surface;
use semtrex::Tree;

fn literal(symbol: SemId) -> Tree {
    let mut tree = Tree::new(SEMTREX_SYMBOL_LITERAL, Surface::Null);
    let root = tree.root();
    tree.add_child(root, SEMTREX_SYMBOL, Surface::Sem(symbol));
    tree
}

#[test]
fn malformed_arities_are_rejected() {
    let mut registry = Registry::new();
    let a = registry.define_symbol(0, CSTRING, "A");

    // An OR must have exactly two operands.
    let mut lopsided = Tree::new(SEMTREX_OR, Surface::Null);
    let root = lopsided.root();
    let only = literal(a);
    lopsided.graft(root, &only, only.root());
    match Automaton::build(&lopsided) {
        Err(BuildError::BadArity { op, got, .. }) => {
            assert_eq!(op, SEMTREX_OR);
            assert_eq!(got, 1);
        }
        other => panic!("expected BadArity, got {:?}", other),
    }

    // A quantifier wraps exactly one operand.
    let mut crowded = Tree::new(SEMTREX_ZERO_OR_MORE, Surface::Null);
    let root = crowded.root();
    let first = literal(a);
    crowded.graft(root, &first, first.root());
    crowded.graft(root, &first, first.root());
    assert!(matches!(
        Automaton::build(&crowded),
        Err(BuildError::BadArity { got: 2, .. }),
    ));

    // A group needs a body.
    let empty = Tree::new(SEMTREX_GROUP, Surface::Sem(a));
    assert!(matches!(
        Automaton::build(&empty),
        Err(BuildError::BadArity { got: 0, .. }),
    ));

    // A sequence needs at least one operand.
    let empty = Tree::new(SEMTREX_SEQUENCE, Surface::Null);
    assert!(matches!(
        Automaton::build(&empty),
        Err(BuildError::BadArity { got: 0, .. }),
    ));
}

#[test]
fn non_operator_nodes_are_rejected() {
    let mut registry = Registry::new();
    let a = registry.define_symbol(0, CSTRING, "A");
    let not_a_pattern = Tree::new(a, Surface::Null);
    assert!(matches!(
        Automaton::build(&not_a_pattern),
        Err(BuildError::UnexpectedOperator(op)) if op == a,
    ));
}
