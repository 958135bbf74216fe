// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Rebuilds and rewrites trees from capture results

use crate::matcher::Match;
use crate::semantics::REPLACEMENT_VALUE;
use crate::semantics::SEMANTIC_LINK;
use crate::semantics::SEMANTIC_MAP;
use crate::semantics::USAGE;
use crate::tree::NodeRef;
use crate::tree::Surface;
use crate::tree::Tree;
use crate::tree::TreeError;

/// Builds a new tree from capture results.
///
/// A single top-level capture becomes a node bearing the capture symbol:
/// its surface is lifted from the matched node when exactly one childless
/// node matched, otherwise the matched nodes are cloned in as children.
/// Multiple top-level captures are wrapped under a root bearing the first
/// capture's symbol.  Nested captures recurse.
pub fn embody_from_match(tree: &Tree, matches: &[Match]) -> Option<Tree> {
    match matches {
        [] => None,
        [only] => Some(embody_one(tree, only)),
        [first, ..] => {
            let mut wrapped = Tree::new(first.symbol, Surface::Null);
            let root = wrapped.root();
            for m in matches {
                let child = embody_one(tree, m);
                wrapped.graft(root, &child, child.root());
            }
            Some(wrapped)
        }
    }
}

fn embody_one(tree: &Tree, m: &Match) -> Tree {
    if !m.children.is_empty() {
        let mut embodied = Tree::new(m.symbol, Surface::Null);
        let root = embodied.root();
        for child in &m.children {
            let subtree = embody_one(tree, child);
            embodied.graft(root, &subtree, subtree.root());
        }
        return embodied;
    }
    let nodes = m.nodes(tree);
    if let [node] = nodes[..] {
        if tree.child_count(node) == 0 {
            return Tree::new(m.symbol, tree.surface(node).clone());
        }
    }
    let mut embodied = Tree::new(m.symbol, Surface::Null);
    let root = embodied.root();
    for node in nodes {
        embodied.graft(root, tree, node);
    }
    embodied
}

/// Replaces every top-level capture's target node with a deep clone of
/// `replacement`, splicing it in at the same child position.  A capture
/// whose path no longer resolves is skipped.
pub fn replace_matches(
    tree: &mut Tree,
    matches: &[Match],
    replacement: &Tree,
) -> Result<(), TreeError> {
    for m in matches {
        let target = match tree.node_at(&m.path) {
            Some(target) => target,
            None => continue,
        };
        match tree.parent(target) {
            Some(parent) => {
                let index = tree.node_index(target);
                tree.detach(target);
                tree.graft_at(parent, index, replacement, replacement.root())?;
            }
            None => {
                // The capture addressed the root; rewrite it in place.
                let clone = replacement.clone_subtree(replacement.root());
                tree.set_symbol(target, clone.symbol(clone.root()));
                tree.set_surface(target, clone.surface(clone.root()).clone());
                let old: Vec<NodeRef> = tree.children(target).collect();
                for child in old {
                    tree.detach(child);
                }
                for child in clone.children(clone.root()).collect::<Vec<_>>() {
                    tree.graft(target, &clone, child);
                }
            }
        }
    }
    Ok(())
}

/// Renders capture results as a `SEMANTIC_MAP`: one `SEMANTIC_LINK` per
/// capture, nested captures flattened depth-first, each link holding a
/// `USAGE` (the capture symbol) and a `REPLACEMENT_VALUE` (the matched
/// subtree, or a single `(symbol, surface)` leaf when one childless node
/// matched).
pub fn matches_to_sem_map(tree: &Tree, matches: &[Match]) -> Tree {
    let mut map = Tree::new(SEMANTIC_MAP, Surface::Null);
    let root = map.root();
    for m in matches {
        add_links(&mut map, root, tree, m);
    }
    map
}

fn add_links(map: &mut Tree, root: NodeRef, tree: &Tree, m: &Match) {
    let link = map.add_child(root, SEMANTIC_LINK, Surface::Null);
    map.add_child(link, USAGE, Surface::Sem(m.symbol));
    let value = map.add_child(link, REPLACEMENT_VALUE, Surface::Null);
    let nodes = m.nodes(tree);
    if let [node] = nodes[..] {
        if tree.child_count(node) == 0 {
            map.add_child(value, tree.symbol(node), tree.surface(node).clone());
        } else {
            map.graft(value, tree, node);
        }
    } else {
        for node in nodes {
            map.graft(value, tree, node);
        }
    }
    for child in &m.children {
        add_links(map, root, tree, child);
    }
}
