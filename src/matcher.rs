// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Executes a compiled automaton against a target tree

use log::debug;
use log::trace;

use crate::automaton::Automaton;
use crate::automaton::Outlet;
use crate::automaton::StateId;
use crate::automaton::StateKind;
use crate::automaton::Transition;
use crate::automaton::ACCEPT;
use crate::semantics::SemId;
use crate::semantics::SEMTREX_MATCH;
use crate::semantics::SEMTREX_MATCH_PATH;
use crate::semantics::SEMTREX_MATCH_SIBLINGS_COUNT;
use crate::semantics::SEMTREX_MATCH_SYMBOL;
use crate::tree::NodeRef;
use crate::tree::Path;
use crate::tree::Surface;
use crate::tree::Tree;

/// One completed capture group: a named span of the matched tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    /// The capture symbol the group was declared with.
    pub symbol: SemId,
    /// The path of the first matched node, from the target root.
    pub path: Path,
    /// How many consecutive siblings the group spans, at least 1.
    pub siblings_count: usize,
    /// Captures of groups nested inside this one, in completion order.
    pub children: Vec<Match>,
}

impl Match {
    /// Searches a capture forest depth-first for the first capture bearing
    /// `symbol`.
    pub fn find<'a>(matches: &'a [Match], symbol: SemId) -> Option<&'a Match> {
        for m in matches {
            if m.symbol == symbol {
                return Some(m);
            }
            if let Some(found) = Match::find(&m.children, symbol) {
                return Some(found);
            }
        }
        None
    }

    /// Resolves this capture against the tree it was produced from,
    /// returning the matched node and its `siblings_count - 1` following
    /// siblings.
    pub fn nodes(&self, tree: &Tree) -> Vec<NodeRef> {
        let mut nodes = Vec::new();
        let mut current = match tree.node_at(&self.path) {
            Some(node) => node,
            None => return nodes,
        };
        nodes.push(current);
        for _ in 1..self.siblings_count {
            match tree.next_sibling(current) {
                Some(next) => {
                    nodes.push(next);
                    current = next;
                }
                None => break,
            }
        }
        nodes
    }

    /// Renders this capture (and its nested captures) as a `SEMTREX_MATCH`
    /// tree.  The path is written as text, `/1/2` style, with `/` alone
    /// denoting the root.
    pub fn to_tree(&self) -> Tree {
        let mut tree = Tree::new(SEMTREX_MATCH, Surface::Null);
        let root = tree.root();
        self.write_into(&mut tree, root);
        tree
    }

    fn write_into(&self, tree: &mut Tree, node: NodeRef) {
        tree.add_child(node, SEMTREX_MATCH_SYMBOL, Surface::Sem(self.symbol));
        let mut path = String::new();
        if self.path.is_empty() {
            path.push('/');
        } else {
            for step in &self.path {
                path.push('/');
                path.push_str(&step.to_string());
            }
        }
        tree.add_child(node, SEMTREX_MATCH_PATH, path);
        tree.add_child(
            node,
            SEMTREX_MATCH_SIBLINGS_COUNT,
            self.siblings_count as i64,
        );
        for child in &self.children {
            let nested = tree.add_child(node, SEMTREX_MATCH, Surface::Null);
            child.write_into(tree, nested);
        }
    }
}

/// An open capture group awaiting its close.
#[derive(Clone)]
struct OpenFrame {
    uid: u32,
    symbol: SemId,
    start: Option<NodeRef>,
    path: Path,
    children: Vec<Match>,
}

enum BranchKind {
    /// The untried alternative of a split.
    Split { alt: Outlet },
    /// A walk in progress: where it started, where it currently stands, and
    /// the state its body begins at.
    Walk {
        origin: NodeRef,
        current: NodeRef,
        retry: StateId,
    },
}

/// A resumption point for backtracking.  Snapshots deep-copy the capture
/// state so a failed branch cannot corrupt its parent's frames.
struct Branch {
    kind: BranchKind,
    cursor: Option<NodeRef>,
    open: Vec<OpenFrame>,
    done: Vec<Match>,
}

impl Automaton {
    /// Reports whether the pattern matches the tree.
    pub fn is_match(&self, tree: &Tree) -> bool {
        self.captures(tree).is_some()
    }

    /// Matches the pattern against the tree, returning the completed
    /// capture groups in pre-order.  "No match" is `None`, not an error.
    pub fn captures(&self, tree: &Tree) -> Option<Vec<Match>> {
        debug!("matching against {:?}", tree);
        self.run(tree, self.start, ACCEPT, Some(tree.root()))
    }

    /// Runs the automaton from `start` until `accept` (or the shared match
    /// state) is reached.  `~` sub-matches re-enter here with the bypass
    /// target as their accept state and their own capture stacks, which the
    /// caller discards.
    fn run(
        &self,
        tree: &Tree,
        start: StateId,
        accept: StateId,
        origin: Option<NodeRef>,
    ) -> Option<Vec<Match>> {
        let mut state_id = start;
        let mut cursor = origin;
        let mut open: Vec<OpenFrame> = Vec::new();
        let mut done: Vec<Match> = Vec::new();
        let mut branches: Vec<Branch> = Vec::new();

        'execute: loop {
            if state_id == accept || matches!(self.state(state_id).kind, StateKind::Match) {
                // Every traversed GroupOpen has met its GroupClose by now.
                debug_assert!(open.is_empty());
                return Some(done);
            }
            let state = self.state(state_id);
            trace!("state {:?} cursor {:?}", state.kind, cursor);
            let followed: Option<Outlet> = match &state.kind {
                StateKind::Match => unreachable!(),
                StateKind::Symbol(spec) => match cursor {
                    Some(node) if spec.admits(tree.symbol(node)) => Some(state.out),
                    _ => None,
                },
                StateKind::Value(spec) => match cursor {
                    Some(node) if spec.admits(tree.symbol(node), tree.surface(node)) => {
                        Some(state.out)
                    }
                    _ => None,
                },
                StateKind::Any => match cursor {
                    Some(_) => Some(state.out),
                    None => None,
                },
                StateKind::Split => {
                    branches.push(Branch {
                        kind: BranchKind::Split { alt: state.out1 },
                        cursor,
                        open: open.clone(),
                        done: done.clone(),
                    });
                    Some(state.out)
                }
                StateKind::GroupOpen { capture, uid } => {
                    open.push(OpenFrame {
                        uid: *uid,
                        symbol: *capture,
                        start: cursor,
                        path: cursor.map(|n| tree.path_of(n)).unwrap_or_default(),
                        children: Vec::new(),
                    });
                    Some(state.out)
                }
                StateKind::GroupClose { open: open_state } => {
                    let uid = match &self.state(*open_state).kind {
                        StateKind::GroupOpen { uid, .. } => *uid,
                        _ => unreachable!(),
                    };
                    // Opens and closes nest strictly, so the matching frame
                    // is on top.
                    let frame = open.pop().unwrap();
                    debug_assert_eq!(frame.uid, uid);
                    if let Some(start) = frame.start {
                        let m = Match {
                            symbol: frame.symbol,
                            path: frame.path,
                            siblings_count: siblings_count(tree, start, cursor),
                            children: frame.children,
                        };
                        match open.last_mut() {
                            Some(parent) => parent.children.push(m),
                            None => done.push(m),
                        }
                    }
                    Some(state.out)
                }
                StateKind::Descend => match cursor {
                    Some(node) => {
                        cursor = tree.child(node, 1);
                        Some(state.out)
                    }
                    None => None,
                },
                StateKind::Walk => match cursor {
                    Some(node) => {
                        branches.push(Branch {
                            kind: BranchKind::Walk {
                                origin: node,
                                current: node,
                                retry: state.out.target.unwrap(),
                            },
                            cursor,
                            open: open.clone(),
                            done: done.clone(),
                        });
                        Some(state.out)
                    }
                    None => None,
                },
                StateKind::Not => {
                    let body = state.out.target.unwrap();
                    let bypass = state.out1;
                    // The negated body runs as an isolated sub-match whose
                    // captures never escape.
                    if self.run(tree, body, bypass.target.unwrap(), cursor).is_some() {
                        None
                    } else {
                        Some(bypass)
                    }
                }
            };

            if let Some(outlet) = followed {
                cursor = step(tree, cursor, outlet.transition);
                state_id = outlet.target.unwrap();
                continue 'execute;
            }

            // Backtrack to the most recent viable branch point.
            while let Some(branch) = branches.pop() {
                match branch.kind {
                    BranchKind::Split { alt } => {
                        cursor = step(tree, branch.cursor, alt.transition);
                        open = branch.open;
                        done = branch.done;
                        state_id = alt.target.unwrap();
                        continue 'execute;
                    }
                    BranchKind::Walk {
                        origin,
                        current,
                        retry,
                    } => {
                        if let Some(next) = tree.step_walk(origin, current) {
                            cursor = Some(next);
                            open = branch.open.clone();
                            done = branch.done.clone();
                            branches.push(Branch {
                                kind: BranchKind::Walk {
                                    origin,
                                    current: next,
                                    retry,
                                },
                                cursor,
                                open: branch.open,
                                done: branch.done,
                            });
                            state_id = retry;
                            continue 'execute;
                        }
                        // Walk exhausted; keep unwinding.
                    }
                }
            }
            return None;
        }
    }
}

/// Applies a transition to the cursor.  Motion from a vacant cursor stays
/// vacant; only consuming states reject one.
fn step(tree: &Tree, cursor: Option<NodeRef>, transition: Transition) -> Option<NodeRef> {
    let node = cursor?;
    match transition {
        Transition::None => Some(node),
        Transition::Down => tree.child(node, 1),
        Transition::Across(levels) => {
            let mut node = node;
            for _ in 0..levels {
                node = tree.parent(node)?;
            }
            tree.next_sibling(node)
        }
    }
}

/// How many consecutive siblings a capture spans: the distance from the
/// start node to the end cursor when they share a parent, otherwise the
/// count of nodes reached by walking `next_sibling` from the start until
/// the end node or the end of the sibling run; never less than 1.
fn siblings_count(tree: &Tree, start: NodeRef, end: Option<NodeRef>) -> usize {
    if let Some(end) = end {
        if tree.parent(start).is_some() && tree.parent(start) == tree.parent(end) {
            let from = tree.node_index(start);
            let to = tree.node_index(end);
            return if to > from { to - from } else { 1 };
        }
    }
    let mut count = 1;
    let mut node = start;
    while let Some(next) = tree.next_sibling(node) {
        if Some(next) == end {
            return count;
        }
        count += 1;
        node = next;
    }
    count
}
