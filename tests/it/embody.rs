// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

use semtrex::compile;
use semtrex::embody::embody_from_match;
use semtrex::embody::matches_to_sem_map;
use semtrex::embody::replace_matches;
use semtrex::semantics::CSTRING;
use semtrex::semantics::REPLACEMENT_VALUE;
use semtrex::semantics::SEMANTIC_LINK;
use semtrex::semantics::SEMANTIC_MAP;
use semtrex::semantics::USAGE;
use semtrex::serialize::from_text;
use semtrex::serialize::to_text;
use semtrex::Registry;
use semtrex::Surface;
use semtrex::Tree;

fn registry() -> Registry {
    let mut registry = Registry::new();
    for label in [
        "HomeLocation",
        "lat",
        "lon",
        "TASK",
        "TITLE",
        "STATUS",
        "P",
        "A",
        "B",
        "C",
        "G",
    ] {
        registry.define_symbol(0, CSTRING, label);
    }
    registry
}

fn matched(registry: &Registry, pattern: &str, tree_text: &str) -> (Tree, Vec<semtrex::Match>) {
    let automaton = compile(registry, pattern).expect("cannot compile pattern");
    let tree = from_text(registry, tree_text).expect("cannot parse target tree");
    let matches = automaton.captures(&tree).expect("pattern does not match");
    (tree, matches)
}

#[test]
fn a_single_leaf_capture_becomes_a_surface() {
    let registry = registry();
    let (tree, matches) = matched(
        &registry,
        "/HomeLocation/<lat:lat>",
        "(HomeLocation (lat:42.25) (lon:73.25))",
    );
    let embodied = embody_from_match(&tree, &matches).unwrap();
    assert_eq!(
        embodied.symbol(embodied.root()),
        registry.symbol_named("lat").unwrap(),
    );
    assert_eq!(*embodied.surface(embodied.root()), Surface::Float(42.25));
    assert_eq!(embodied.child_count(embodied.root()), 0);
}

#[test]
fn multiple_captures_wrap_under_the_first_symbol() {
    let registry = registry();
    let (tree, matches) = matched(
        &registry,
        "/HomeLocation/(<lat:lat>,<lon:lon>)",
        "(HomeLocation (lat:42.25) (lon:73.25))",
    );
    let embodied = embody_from_match(&tree, &matches).unwrap();
    let root = embodied.root();
    let lat = registry.symbol_named("lat").unwrap();
    let lon = registry.symbol_named("lon").unwrap();
    assert_eq!(embodied.symbol(root), lat);
    assert_eq!(embodied.child_count(root), 2);
    let first = embodied.child(root, 1).unwrap();
    let second = embodied.child(root, 2).unwrap();
    assert_eq!(embodied.symbol(first), lat);
    assert_eq!(*embodied.surface(first), Surface::Float(42.25));
    assert_eq!(embodied.symbol(second), lon);
    assert_eq!(*embodied.surface(second), Surface::Float(73.25));
}

#[test]
fn wide_captures_clone_the_matched_nodes() {
    let registry = registry();
    let (tree, matches) = matched(&registry, "/P/<G:A,B>", "(P (A (C)) (B))");
    let embodied = embody_from_match(&tree, &matches).unwrap();
    let root = embodied.root();
    assert_eq!(embodied.symbol(root), registry.symbol_named("G").unwrap());
    assert_eq!(embodied.child_count(root), 2);
    let a = embodied.child(root, 1).unwrap();
    assert_eq!(embodied.symbol(a), registry.symbol_named("A").unwrap());
    assert_eq!(embodied.child_count(a), 1);
}

#[test]
fn no_captures_embody_nothing() {
    let registry = registry();
    let (tree, matches) = matched(&registry, "/P", "(P)");
    assert!(matches.is_empty());
    assert!(embody_from_match(&tree, &matches).is_none());
}

#[test]
fn replace_splices_a_clone_at_the_same_position() {
    let registry = registry();
    let automaton = compile(&registry, "/TASK/(TITLE,<G:STATUS>)").unwrap();
    let mut tree = from_text(
        &registry,
        r#"(TASK (TITLE:"Build semtrex") (STATUS:"in-progress") (P))"#,
    )
    .unwrap();
    let matches = automaton.captures(&tree).unwrap();
    let replacement = from_text(&registry, r#"(STATUS:"done")"#).unwrap();

    replace_matches(&mut tree, &matches, &replacement).unwrap();
    assert_eq!(
        to_text(&registry, &tree),
        r#"(TASK (TITLE:"Build semtrex") (STATUS:"done") (P))"#,
    );
}

#[test]
fn replacing_the_root_rewrites_it_in_place() {
    let registry = registry();
    let automaton = compile(&registry, "/<G:A>").unwrap();
    let mut tree = from_text(&registry, "(A (B))").unwrap();
    let matches = automaton.captures(&tree).unwrap();
    let replacement = from_text(&registry, "(C (P))").unwrap();

    replace_matches(&mut tree, &matches, &replacement).unwrap();
    assert_eq!(to_text(&registry, &tree), "(C (P))");
}

#[test]
fn sem_maps_flatten_captures_depth_first() {
    let registry = registry();
    let (tree, matches) = matched(
        &registry,
        "/HomeLocation/(<lat:lat>,<lon:lon>)",
        "(HomeLocation (lat:42.25) (lon:73.25))",
    );
    let map = matches_to_sem_map(&tree, &matches);
    let root = map.root();
    assert_eq!(map.symbol(root), SEMANTIC_MAP);
    assert_eq!(map.child_count(root), 2);

    let link = map.child(root, 1).unwrap();
    assert_eq!(map.symbol(link), SEMANTIC_LINK);
    let usage = map.child(link, 1).unwrap();
    assert_eq!(map.symbol(usage), USAGE);
    assert_eq!(
        *map.surface(usage),
        Surface::Sem(registry.symbol_named("lat").unwrap()),
    );
    let value = map.child(link, 2).unwrap();
    assert_eq!(map.symbol(value), REPLACEMENT_VALUE);
    // A single childless matched node flattens to a (symbol, surface) leaf.
    let leaf = map.child(value, 1).unwrap();
    assert_eq!(map.symbol(leaf), registry.symbol_named("lat").unwrap());
    assert_eq!(*map.surface(leaf), Surface::Float(42.25));
}
