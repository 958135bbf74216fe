// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! This library implements _semtrex_, a pattern language over ordered,
//! semantically tagged trees — the tree analogue of regular expressions
//! over strings.
//!
//! # Overview
//!
//! A semtrex is written in a compact surface syntax (`/TASK/(TITLE,STATUS)`
//! matches a `TASK` node whose first two children are a `TITLE` and a
//! `STATUS`).  [`parser::parse`] turns that syntax into a _pattern tree_
//! whose nodes are drawn from a fixed vocabulary of operator symbols,
//! [`Automaton::build`] lowers the pattern tree into a Thompson-style state
//! graph whose transitions encode tree topology (down to a child, across to
//! a sibling, up and across), and [`Automaton::captures`] executes the
//! graph against a target [`Tree`] with backtracking, yielding the named
//! capture groups.  The [`embody`] module rebuilds and rewrites trees from
//! those captures.
//!
//! Symbols are identified by `(context, kind, id)` triples resolved through
//! a [`Registry`]; trees attach an optional scalar [`Surface`] to every
//! node.  Matching is synchronous and never mutates the automaton or the
//! target tree.

pub mod automaton;
pub mod embody;
pub mod matcher;
pub mod parser;
pub mod pretty;
pub mod semantics;
pub mod serialize;
pub mod tree;

use thiserror::Error;

pub use automaton::Automaton;
pub use automaton::BuildError;
pub use matcher::Match;
pub use parser::Location;
pub use parser::ParseError;
pub use semantics::Registry;
pub use semantics::SemId;
pub use semantics::SemKind;
pub use tree::NodeRef;
pub use tree::Path;
pub use tree::Surface;
pub use tree::Tree;
pub use tree::TreeError;

/// An error from compiling a pattern string into an automaton
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Parses and lowers a pattern in one step.
pub fn compile(registry: &Registry, pattern: &str) -> Result<Automaton, CompileError> {
    let pattern = parser::parse(registry, pattern)?;
    Ok(Automaton::build(&pattern)?)
}
