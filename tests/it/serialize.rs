// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use semtrex::semantics::CSTRING;
use semtrex::semantics::TREE;
use semtrex::serialize::from_bytes;
use semtrex::serialize::from_json;
use semtrex::serialize::from_text;
use semtrex::serialize::to_bytes;
use semtrex::serialize::to_json;
use semtrex::serialize::to_text;
use semtrex::serialize::SerializeError;
use semtrex::Registry;
use semtrex::SemId;
use semtrex::Surface;
use semtrex::Tree;

fn registry() -> (Registry, SemId, SemId) {
    let mut registry = Registry::new();
    let node = registry.define_symbol(0, TREE, "NODE");
    let leaf = registry.define_symbol(0, CSTRING, "LEAF");
    (registry, node, leaf)
}

fn fixture(node: SemId, leaf: SemId) -> Tree {
    let mut tree = Tree::new(node, Surface::Null);
    let root = tree.root();
    tree.add_child(root, leaf, "hi \"there\"\n");
    tree.add_child(root, leaf, 42i64);
    tree.add_child(root, leaf, 1.5f64);
    tree.add_child(root, leaf, true);
    let nested = tree.add_child(root, node, Surface::Sem(leaf));
    tree.add_child(nested, leaf, Surface::Null);
    tree
}

#[test]
fn text_form_is_readable_and_round_trips() {
    let (registry, node, leaf) = registry();
    let tree = fixture(node, leaf);
    let text = to_text(&registry, &tree);
    assert_eq!(
        text,
        "(NODE (LEAF:\"hi \\\"there\\\"\\n\") (LEAF:42) (LEAF:1.5) (LEAF:true) (NODE:{0,2,49} (LEAF)))",
    );
    let back = from_text(&registry, &text).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn text_blobs_inflate_zero_filled() {
    let (registry, node, _) = registry();
    let tree = Tree::new(node, vec![7u8, 8, 9]);
    let text = to_text(&registry, &tree);
    assert_eq!(text, "(NODE:<blob:3>)");
    let back = from_text(&registry, &text).unwrap();
    assert_eq!(*back.surface(back.root()), Surface::Bytes(vec![0, 0, 0]));
}

#[test]
fn text_errors_are_named() {
    let (registry, _, _) = registry();
    assert!(matches!(
        from_text(&registry, "(WHAT)"),
        Err(SerializeError::UnknownLabel(_, 1)),
    ));
    assert!(matches!(
        from_text(&registry, "(NODE"),
        Err(SerializeError::UnexpectedEnd),
    ));
    assert!(matches!(
        from_text(&registry, "(NODE) trailing"),
        Err(SerializeError::UnexpectedCharacter('t', _)),
    ));
}

#[test]
fn binary_form_round_trips_with_the_fixed_tag_set() {
    let (_, node, leaf) = registry();
    let tree = fixture(node, leaf);
    let bytes = to_bytes(&tree);
    let back = from_bytes(&bytes).unwrap();

    let root = back.root();
    assert_eq!(back.symbol(root), node);
    assert_eq!(back.child_count(root), 5);
    assert_eq!(
        *back.surface(back.child(root, 1).unwrap()),
        Surface::Text("hi \"there\"\n".into()),
    );
    // Integers flatten to float64 in the fixed tag set.
    assert_eq!(
        *back.surface(back.child(root, 2).unwrap()),
        Surface::Float(42.0),
    );
    assert_eq!(
        *back.surface(back.child(root, 3).unwrap()),
        Surface::Float(1.5),
    );
    assert_eq!(
        *back.surface(back.child(root, 4).unwrap()),
        Surface::Bool(true),
    );
    let nested = back.child(root, 5).unwrap();
    assert_eq!(*back.surface(nested), Surface::Sem(leaf));
    assert_eq!(back.child_count(nested), 1);

    assert!(matches!(
        from_bytes(&bytes[..10]),
        Err(SerializeError::Truncated),
    ));
}

#[test]
fn json_form_mirrors_the_binary_tags() {
    let (_, node, leaf) = registry();
    let mut tree = Tree::new(node, Surface::Null);
    let root = tree.root();
    tree.add_child(root, leaf, vec![1u8, 2, 3]);
    tree.add_child(root, leaf, "x");

    let json = to_json(&tree);
    assert_eq!(json["kind"], 2);
    assert_eq!(json["surface"]["tag"], 0);
    // Blobs serialize as arrays of bytes.
    assert_eq!(json["children"][0]["surface"]["tag"], 4);
    assert_eq!(json["children"][0]["surface"]["value"][2], 3);
    assert_eq!(json["children"][1]["surface"]["tag"], 2);

    let back = from_json(&json).unwrap();
    assert_eq!(back.child_count(back.root()), 2);
    assert_eq!(
        *back.surface(back.child(back.root(), 1).unwrap()),
        Surface::Bytes(vec![1, 2, 3]),
    );
    assert_eq!(
        *back.surface(back.child(back.root(), 2).unwrap()),
        Surface::Text("x".into()),
    );
}
