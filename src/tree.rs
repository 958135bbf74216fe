// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Defines the ordered, semantically tagged trees that patterns match against

use std::fmt;

use smallvec::SmallVec;
use thiserror::Error;

use crate::semantics::SemId;

/// A path from the root of a tree to one of its nodes.  Indices are
/// 1-based; the empty path denotes the root.
pub type Path = Vec<usize>;

type NodeID = u32;

/// A reference to a node in a [`Tree`].  References are only meaningful
/// against the tree that produced them.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeRef(NodeID);

/// The scalar payload attached to a tree node.
///
/// Equality is structural: byte arrays compare by content and identifiers
/// component-wise.
#[derive(Clone, Debug, PartialEq)]
pub enum Surface {
    Null,
    Int(i64),
    Float(f64),
    Char(char),
    Bool(bool),
    Text(String),
    Bytes(Vec<u8>),
    Sem(SemId),
}

impl From<i64> for Surface {
    fn from(value: i64) -> Surface {
        Surface::Int(value)
    }
}

impl From<f64> for Surface {
    fn from(value: f64) -> Surface {
        Surface::Float(value)
    }
}

impl From<char> for Surface {
    fn from(value: char) -> Surface {
        Surface::Char(value)
    }
}

impl From<bool> for Surface {
    fn from(value: bool) -> Surface {
        Surface::Bool(value)
    }
}

impl From<&str> for Surface {
    fn from(value: &str) -> Surface {
        Surface::Text(value.to_string())
    }
}

impl From<String> for Surface {
    fn from(value: String) -> Surface {
        Surface::Text(value)
    }
}

impl From<Vec<u8>> for Surface {
    fn from(value: Vec<u8>) -> Surface {
        Surface::Bytes(value)
    }
}

impl From<SemId> for Surface {
    fn from(value: SemId) -> Surface {
        Surface::Sem(value)
    }
}

/// An error from a tree mutation with an invalid index
#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Insert index {index} out of range 1..={limit}")]
    OutOfRange { index: usize, limit: usize },
}

struct NodeData {
    symbol: SemId,
    surface: Surface,
    parent: Option<NodeRef>,
    children: SmallVec<[NodeRef; 4]>,
}

/// An ordered tree of `(symbol, surface, children)` nodes.
///
/// Nodes live in an arena owned by the tree; [`NodeRef`]s are copyable
/// handles into it.  Detached subtrees stay in the arena as extra roots and
/// are reclaimed when the tree is dropped.
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeRef,
}

impl Tree {
    /// Creates a new tree consisting of a single root node.
    pub fn new<S: Into<Surface>>(symbol: SemId, surface: S) -> Tree {
        let root = NodeData {
            symbol,
            surface: surface.into(),
            parent: None,
            children: SmallVec::new(),
        };
        Tree {
            nodes: vec![root],
            root: NodeRef(0),
        }
    }

    /// Returns the root of this tree.
    pub fn root(&self) -> NodeRef {
        self.root
    }

    fn node(&self, node: NodeRef) -> &NodeData {
        &self.nodes[node.0 as usize]
    }

    fn node_mut(&mut self, node: NodeRef) -> &mut NodeData {
        &mut self.nodes[node.0 as usize]
    }

    fn alloc(&mut self, symbol: SemId, surface: Surface, parent: Option<NodeRef>) -> NodeRef {
        let index = self.nodes.len() as NodeID;
        self.nodes.push(NodeData {
            symbol,
            surface,
            parent,
            children: SmallVec::new(),
        });
        NodeRef(index)
    }

    /// Appends a new child to `parent`, returning a reference to it.
    pub fn add_child<S: Into<Surface>>(
        &mut self,
        parent: NodeRef,
        symbol: SemId,
        surface: S,
    ) -> NodeRef {
        let child = self.alloc(symbol, surface.into(), Some(parent));
        self.node_mut(parent).children.push(child);
        child
    }

    /// Appends an existing node as the last child of `parent`, detaching it
    /// from its prior parent first.
    pub fn attach(&mut self, parent: NodeRef, child: NodeRef) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Appends a deep copy of `src_node` (and its descendants) from another
    /// tree as the last child of `parent`.
    pub fn graft(&mut self, parent: NodeRef, src: &Tree, src_node: NodeRef) -> NodeRef {
        let data = src.node(src_node);
        let copy = self.add_child(parent, data.symbol, data.surface.clone());
        for i in 1..=src.child_count(src_node) {
            let child = src.child(src_node, i).unwrap();
            self.graft(copy, src, child);
        }
        copy
    }

    /// Inserts a deep copy of `src_node` from another tree at 1-based
    /// position `index` among `parent`'s children.
    pub fn graft_at(
        &mut self,
        parent: NodeRef,
        index: usize,
        src: &Tree,
        src_node: NodeRef,
    ) -> Result<NodeRef, TreeError> {
        let limit = self.child_count(parent) + 1;
        if index < 1 || index > limit {
            return Err(TreeError::OutOfRange { index, limit });
        }
        self.graft(parent, src, src_node);
        let children = &mut self.node_mut(parent).children;
        let copy = children.pop().unwrap();
        children.insert(index - 1, copy);
        Ok(copy)
    }

    /// Inserts a new node at 1-based position `index` among `parent`'s
    /// children.  `index` may be one past the last child to append.
    pub fn insert_at<S: Into<Surface>>(
        &mut self,
        parent: NodeRef,
        index: usize,
        symbol: SemId,
        surface: S,
    ) -> Result<NodeRef, TreeError> {
        let limit = self.child_count(parent) + 1;
        if index < 1 || index > limit {
            return Err(TreeError::OutOfRange { index, limit });
        }
        let child = self.alloc(symbol, surface.into(), Some(parent));
        self.node_mut(parent).children.insert(index - 1, child);
        Ok(child)
    }

    /// Returns the symbol of a node.
    pub fn symbol(&self, node: NodeRef) -> SemId {
        self.node(node).symbol
    }

    /// Returns the surface of a node.
    pub fn surface(&self, node: NodeRef) -> &Surface {
        &self.node(node).surface
    }

    pub fn set_symbol(&mut self, node: NodeRef, symbol: SemId) {
        self.node_mut(node).symbol = symbol;
    }

    pub fn set_surface<S: Into<Surface>>(&mut self, node: NodeRef, surface: S) {
        self.node_mut(node).surface = surface.into();
    }

    /// Returns the `index`th child of `node` (1-based), if it exists.
    pub fn child(&self, node: NodeRef, index: usize) -> Option<NodeRef> {
        if index == 0 {
            return None;
        }
        self.node(node).children.get(index - 1).copied()
    }

    /// Returns the number of children of `node`.
    pub fn child_count(&self, node: NodeRef) -> usize {
        self.node(node).children.len()
    }

    /// Returns the children of `node` in order.
    pub fn children(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        self.node(node).children.iter().copied()
    }

    /// Returns the parent of `node`, or `None` at a root.
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.node(node).parent
    }

    /// Returns the next sibling of `node`, if there is one.
    pub fn next_sibling(&self, node: NodeRef) -> Option<NodeRef> {
        let parent = self.node(node).parent?;
        let siblings = &self.node(parent).children;
        let index = siblings.iter().position(|&c| c == node).unwrap();
        siblings.get(index + 1).copied()
    }

    /// Returns the 1-based position of `node` among its siblings; a root is
    /// at position 1.
    pub fn node_index(&self, node: NodeRef) -> usize {
        match self.node(node).parent {
            None => 1,
            Some(parent) => {
                let siblings = &self.node(parent).children;
                siblings.iter().position(|&c| c == node).unwrap() + 1
            }
        }
    }

    /// Returns the path of `node` from its root.
    pub fn path_of(&self, node: NodeRef) -> Path {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.node(current).parent {
            path.push(self.node_index(current));
            current = parent;
        }
        path.reverse();
        path
    }

    /// Resolves a path against the tree's root.  Any out-of-range index
    /// yields `None`.
    pub fn node_at(&self, path: &[usize]) -> Option<NodeRef> {
        let mut current = self.root;
        for &index in path {
            current = self.child(current, index)?;
        }
        Some(current)
    }

    /// Detaches `node` from its parent, leaving it as an extra root in the
    /// arena.  Detaching a root is a no-op.
    pub fn detach(&mut self, node: NodeRef) -> NodeRef {
        if let Some(parent) = self.node(node).parent {
            let siblings = &mut self.node_mut(parent).children;
            let index = siblings.iter().position(|&c| c == node).unwrap();
            siblings.remove(index);
            self.node_mut(node).parent = None;
        }
        node
    }

    /// Overwrites `dst`'s symbol and surface with `src`'s, preserving
    /// `dst`'s children and parent.
    pub fn morph(&mut self, dst: NodeRef, src: NodeRef) {
        let symbol = self.node(src).symbol;
        let surface = self.node(src).surface.clone();
        let data = self.node_mut(dst);
        data.symbol = symbol;
        data.surface = surface;
    }

    /// Transfers `src`'s children into `dst`, replacing `dst`'s children
    /// and leaving `src` childless.  Parent pointers are updated.
    pub fn replace_children(&mut self, dst: NodeRef, src: NodeRef) {
        let moved = std::mem::take(&mut self.node_mut(src).children);
        for &child in &moved {
            self.node_mut(child).parent = Some(dst);
        }
        let old = std::mem::replace(&mut self.node_mut(dst).children, moved);
        for child in old {
            self.node_mut(child).parent = None;
        }
    }

    /// Deep-copies the subtree rooted at `node` into a new tree.
    pub fn clone_subtree(&self, node: NodeRef) -> Tree {
        let data = self.node(node);
        let mut tree = Tree::new(data.symbol, data.surface.clone());
        let root = tree.root;
        for i in 1..=self.child_count(node) {
            let child = self.child(node, i).unwrap();
            tree.graft(root, self, child);
        }
        tree
    }

    /// Returns the node after `current` in a depth-first pre-order walk of
    /// the subtree rooted at `origin`, or `None` when the walk is done.
    pub fn step_walk(&self, origin: NodeRef, current: NodeRef) -> Option<NodeRef> {
        if let Some(child) = self.child(current, 1) {
            return Some(child);
        }
        let mut node = current;
        while node != origin {
            if let Some(sibling) = self.next_sibling(node) {
                return Some(sibling);
            }
            node = self.parent(node)?;
        }
        None
    }

    /// Walks the subtree rooted at `from` in depth-first pre-order.
    pub fn walk(&self, from: NodeRef) -> Walk {
        Walk {
            tree: self,
            origin: from,
            next: Some(from),
        }
    }

    /// Structural equality of two subtrees: same symbols, surfaces, and
    /// child shapes throughout.
    pub fn subtree_eq(&self, node: NodeRef, other: &Tree, other_node: NodeRef) -> bool {
        let a = self.node(node);
        let b = other.node(other_node);
        if a.symbol != b.symbol || a.surface != b.surface {
            return false;
        }
        if a.children.len() != b.children.len() {
            return false;
        }
        a.children
            .iter()
            .zip(b.children.iter())
            .all(|(&c, &d)| self.subtree_eq(c, other, d))
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Tree) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn fmt_node(tree: &Tree, node: NodeRef, f: &mut fmt::Formatter) -> fmt::Result {
            write!(f, "({}", tree.symbol(node))?;
            match tree.surface(node) {
                Surface::Null => {}
                surface => write!(f, ":{:?}", surface)?,
            }
            for child in tree.children(node) {
                write!(f, " ")?;
                fmt_node(tree, child, f)?;
            }
            write!(f, ")")
        }
        fmt_node(self, self.root, f)
    }
}

/// A depth-first pre-order traversal of a subtree
pub struct Walk<'a> {
    tree: &'a Tree,
    origin: NodeRef,
    next: Option<NodeRef>,
}

impl Iterator for Walk<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let current = self.next?;
        self.next = self.tree.step_walk(self.origin, current);
        Some(current)
    }
}
