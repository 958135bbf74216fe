// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use semtrex::semantics::CSTRING;
use semtrex::Registry;
use semtrex::SemId;
use semtrex::Surface;
use semtrex::Tree;

fn symbols(labels: &[&str]) -> (Registry, Vec<SemId>) {
    let mut registry = Registry::new();
    let ids = labels
        .iter()
        .map(|label| registry.define_symbol(0, CSTRING, label))
        .collect();
    (registry, ids)
}

#[test]
fn can_navigate_children_and_siblings() {
    let (_, ids) = symbols(&["P", "A", "B", "C"]);
    let (p, a, b, c) = (ids[0], ids[1], ids[2], ids[3]);
    let mut tree = Tree::new(p, Surface::Null);
    let root = tree.root();
    let first = tree.add_child(root, a, Surface::Null);
    let second = tree.add_child(root, b, Surface::Null);
    let third = tree.add_child(root, c, Surface::Null);

    assert_eq!(tree.child_count(root), 3);
    assert_eq!(tree.child(root, 1), Some(first));
    assert_eq!(tree.child(root, 3), Some(third));
    assert_eq!(tree.child(root, 4), None);
    assert_eq!(tree.child(root, 0), None);
    assert_eq!(tree.parent(first), Some(root));
    assert_eq!(tree.parent(root), None);
    assert_eq!(tree.next_sibling(first), Some(second));
    assert_eq!(tree.next_sibling(third), None);
    assert_eq!(tree.node_index(second), 2);
    assert_eq!(tree.node_index(root), 1);
    assert_eq!(tree.symbol(second), b);
}

#[test]
fn can_resolve_paths() {
    let (_, ids) = symbols(&["P", "A", "B"]);
    let (p, a, b) = (ids[0], ids[1], ids[2]);
    let mut tree = Tree::new(p, Surface::Null);
    let root = tree.root();
    let child = tree.add_child(root, a, Surface::Null);
    let grandchild = tree.add_child(child, b, Surface::Null);

    assert_eq!(tree.path_of(root), Vec::<usize>::new());
    assert_eq!(tree.path_of(grandchild), vec![1, 1]);
    assert_eq!(tree.node_at(&[]), Some(root));
    assert_eq!(tree.node_at(&[1, 1]), Some(grandchild));
    assert_eq!(tree.node_at(&[2]), None);
    assert_eq!(tree.node_at(&[1, 1, 1]), None);
}

#[test]
fn mutations_keep_parents_consistent() {
    let (_, ids) = symbols(&["P", "A", "B", "C"]);
    let (p, a, b, c) = (ids[0], ids[1], ids[2], ids[3]);
    let mut tree = Tree::new(p, Surface::Null);
    let root = tree.root();
    let first = tree.add_child(root, a, Surface::Null);
    tree.add_child(first, c, Surface::Null);
    let second = tree.add_child(root, b, Surface::Null);

    let detached = tree.detach(first);
    assert_eq!(tree.parent(detached), None);
    assert_eq!(tree.child_count(root), 1);
    assert_eq!(tree.node_index(second), 1);
    // A detached subtree is itself a valid tree.
    assert_eq!(tree.path_of(detached), Vec::<usize>::new());
    assert_eq!(tree.child_count(detached), 1);

    let inserted = tree.insert_at(root, 1, c, Surface::Null).unwrap();
    assert_eq!(tree.child(root, 1), Some(inserted));
    assert_eq!(tree.node_index(second), 2);
    assert!(tree.insert_at(root, 4, c, Surface::Null).is_err());
    assert!(tree.insert_at(root, 0, c, Surface::Null).is_err());

    // Attaching moves a node, detaching it from its prior parent.
    tree.attach(second, inserted);
    assert_eq!(tree.child_count(root), 1);
    assert_eq!(tree.parent(inserted), Some(second));
    assert_eq!(tree.child(second, 1), Some(inserted));
}

#[test]
fn morph_overwrites_symbol_and_surface_only() {
    let (_, ids) = symbols(&["P", "A", "B"]);
    let (p, a, b) = (ids[0], ids[1], ids[2]);
    let mut tree = Tree::new(p, Surface::Null);
    let root = tree.root();
    let dst = tree.add_child(root, a, "before");
    tree.add_child(dst, a, Surface::Null);
    let src = tree.add_child(root, b, 42i64);

    tree.morph(dst, src);
    assert_eq!(tree.symbol(dst), b);
    assert_eq!(*tree.surface(dst), Surface::Int(42));
    assert_eq!(tree.child_count(dst), 1);
    assert_eq!(tree.parent(dst), Some(root));
}

#[test]
fn replace_children_transfers_ownership() {
    let (_, ids) = symbols(&["P", "A", "B", "C"]);
    let (p, a, b, c) = (ids[0], ids[1], ids[2], ids[3]);
    let mut tree = Tree::new(p, Surface::Null);
    let root = tree.root();
    let dst = tree.add_child(root, a, Surface::Null);
    tree.add_child(dst, c, Surface::Null);
    let src = tree.add_child(root, b, Surface::Null);
    let moved = tree.add_child(src, c, "payload");

    tree.replace_children(dst, src);
    assert_eq!(tree.child_count(src), 0);
    assert_eq!(tree.child(dst, 1), Some(moved));
    assert_eq!(tree.parent(moved), Some(dst));
}

#[test]
fn clone_subtree_is_deep_and_detached() {
    let (_, ids) = symbols(&["P", "A", "B"]);
    let (p, a, b) = (ids[0], ids[1], ids[2]);
    let mut tree = Tree::new(p, Surface::Null);
    let root = tree.root();
    let child = tree.add_child(root, a, "x");
    tree.add_child(child, b, 1.5f64);

    let clone = tree.clone_subtree(child);
    assert_eq!(clone.symbol(clone.root()), a);
    assert_eq!(clone.parent(clone.root()), None);
    assert_eq!(clone.child_count(clone.root()), 1);
    assert!(tree.subtree_eq(child, &clone, clone.root()));

    // Mutating the clone leaves the original untouched.
    let mut clone = clone;
    let clone_root = clone.root();
    clone.set_surface(clone_root, "y");
    assert_eq!(*tree.surface(child), Surface::Text("x".to_string()));
}

#[test]
fn walk_visits_depth_first_pre_order() {
    let (_, ids) = symbols(&["P", "A", "B", "C", "D"]);
    let (p, a, b, c, d) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
    let mut tree = Tree::new(p, Surface::Null);
    let root = tree.root();
    let first = tree.add_child(root, a, Surface::Null);
    let deep = tree.add_child(first, b, Surface::Null);
    tree.add_child(deep, c, Surface::Null);
    tree.add_child(root, d, Surface::Null);

    let visited: Vec<_> = tree.walk(root).map(|n| tree.symbol(n)).collect();
    assert_eq!(visited, vec![p, a, b, c, d]);

    // Walking a subtree never escapes it.
    let visited: Vec<_> = tree.walk(first).map(|n| tree.symbol(n)).collect();
    assert_eq!(visited, vec![a, b, c]);
}

#[test]
fn surface_equality_is_structural() {
    assert_eq!(Surface::Bytes(vec![1, 2]), Surface::Bytes(vec![1, 2]));
    assert_ne!(Surface::Bytes(vec![1, 2]), Surface::Bytes(vec![1, 3]));
    assert_ne!(Surface::Int(1), Surface::Float(1.0));
    assert_eq!(Surface::Text("a".into()), Surface::Text("a".into()));
}
