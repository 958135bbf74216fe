// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Lowers pattern trees into Thompson-style automata with depth-aware
//! transitions

use smallvec::SmallVec;
use thiserror::Error;

use crate::semantics::SemId;
use crate::semantics::NULL_SYMBOL;
use crate::semantics::SEMTREX_DESCEND;
use crate::semantics::SEMTREX_GROUP;
use crate::semantics::SEMTREX_NOT;
use crate::semantics::SEMTREX_ONE_OR_MORE;
use crate::semantics::SEMTREX_OR;
use crate::semantics::SEMTREX_SEQUENCE;
use crate::semantics::SEMTREX_SYMBOL_ANY;
use crate::semantics::SEMTREX_SYMBOL_LITERAL;
use crate::semantics::SEMTREX_SYMBOL_LITERAL_NOT;
use crate::semantics::SEMTREX_SYMBOL_SET;
use crate::semantics::SEMTREX_VALUE_LITERAL;
use crate::semantics::SEMTREX_VALUE_LITERAL_NOT;
use crate::semantics::SEMTREX_VALUE_SET;
use crate::semantics::SEMTREX_WALK;
use crate::semantics::SEMTREX_ZERO_OR_MORE;
use crate::semantics::SEMTREX_ZERO_OR_ONE;
use crate::tree::NodeRef;
use crate::tree::Surface;
use crate::tree::Tree;

/// An error from lowering a malformed pattern tree
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Operator {op} has {got} children, expected {expected}")]
    BadArity {
        op: SemId,
        got: usize,
        expected: &'static str,
    },
    #[error("{0} is not a pattern operator")]
    UnexpectedOperator(SemId),
}

type StateID = u32;

/// A reference to a state in an [`Automaton`]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct StateId(StateID);

/// The shared accept state, pre-allocated in every automaton.
pub(crate) const ACCEPT: StateId = StateId(0);

/// Cursor motion taken when following a successor edge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Transition {
    /// Leave the cursor where it is.
    None,
    /// Descend to the first child.
    Down,
    /// Pop this many parents, then advance to the next sibling.
    Across(u32),
}

/// A successor edge: where to go, and how the cursor moves getting there.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Outlet {
    pub target: Option<StateId>,
    pub transition: Transition,
}

impl Outlet {
    fn unpatched() -> Outlet {
        Outlet {
            target: None,
            transition: Transition::None,
        }
    }
}

/// The match specification of a symbol state: a set of admissible symbols,
/// possibly complemented.
#[derive(Clone, Debug)]
pub(crate) struct SymbolSpec {
    pub not: bool,
    pub symbols: SmallVec<[SemId; 4]>,
}

impl SymbolSpec {
    pub(crate) fn admits(&self, symbol: SemId) -> bool {
        self.symbols.contains(&symbol) != self.not
    }
}

/// The match specification of a value state: the expected symbol plus a set
/// of admissible surfaces, possibly complemented.
#[derive(Clone, Debug)]
pub(crate) struct ValueSpec {
    pub not: bool,
    pub symbol: SemId,
    pub values: Vec<Surface>,
}

impl ValueSpec {
    pub(crate) fn admits(&self, symbol: SemId, surface: &Surface) -> bool {
        let matched = symbol == self.symbol && self.values.iter().any(|v| v == surface);
        matched != self.not
    }
}

#[derive(Debug)]
pub(crate) enum StateKind {
    Match,
    Symbol(SymbolSpec),
    Value(ValueSpec),
    Any,
    Split,
    GroupOpen { capture: SemId, uid: u32 },
    GroupClose { open: StateId },
    Descend,
    Walk,
    Not,
}

impl StateKind {
    /// Whether this state consumes the cursor node when it succeeds.  Only
    /// consuming states may advance the cursor on their outgoing edges.
    fn is_consuming(&self) -> bool {
        matches!(
            self,
            StateKind::Symbol(_) | StateKind::Value(_) | StateKind::Any
        )
    }
}

#[derive(Debug)]
pub(crate) struct State {
    pub kind: StateKind,
    pub out: Outlet,
    pub out1: Outlet,
}

/// A compiled semtrex pattern: a graph of states executed against a target
/// tree by the matcher.
#[derive(Debug)]
pub struct Automaton {
    pub(crate) states: Vec<State>,
    pub(crate) start: StateId,
}

impl Automaton {
    /// Lowers a pattern tree into an automaton.
    pub fn build(pattern: &Tree) -> Result<Automaton, BuildError> {
        let mut builder = Builder::new();
        let fragment = builder.build_node(pattern, pattern.root(), 0)?;
        builder.patch(fragment.outs, ACCEPT, 0);
        Ok(Automaton {
            states: builder.states,
            start: fragment.start,
        })
    }

    pub(crate) fn state(&self, id: StateId) -> &State {
        &self.states[id.0 as usize]
    }
}

#[derive(Clone, Copy)]
enum Slot {
    Out,
    Out1,
}

/// A successor slot that is not yet patched, remembering the level its
/// state was built at so the final transition can be computed when the
/// enclosing composition decides where it leads.
struct PendingOut {
    state: StateId,
    slot: Slot,
    level: i32,
    consuming: bool,
}

/// A partial automaton: a start state plus the dangling exits that the next
/// composition step will patch.
struct Fragment {
    start: StateId,
    outs: Vec<PendingOut>,
}

struct Builder {
    states: Vec<State>,
    next_group_uid: u32,
}

impl Builder {
    fn new() -> Builder {
        Builder {
            // The accept state always sits at id 0.
            states: vec![State {
                kind: StateKind::Match,
                out: Outlet::unpatched(),
                out1: Outlet::unpatched(),
            }],
            next_group_uid: 1,
        }
    }

    fn add_state(&mut self, kind: StateKind) -> StateId {
        let id = StateId(self.states.len() as StateID);
        self.states.push(State {
            kind,
            out: Outlet::unpatched(),
            out1: Outlet::unpatched(),
        });
        id
    }

    fn set_out(&mut self, state: StateId, target: StateId, transition: Transition) {
        self.states[state.0 as usize].out = Outlet {
            target: Some(target),
            transition,
        };
    }

    fn pending(&self, state: StateId, slot: Slot, level: i32) -> PendingOut {
        PendingOut {
            state,
            slot,
            level,
            consuming: self.states[state.0 as usize].kind.is_consuming(),
        }
    }

    /// Patches a fragment's dangling exits to `target`.  The transition on
    /// each exit becomes the difference between the level the exit was
    /// created at and the level of this composition point; a difference of
    /// zero on a non-consuming state is rewritten to no motion at all, so
    /// purely structural states never advance the cursor.
    fn patch(&mut self, outs: Vec<PendingOut>, target: StateId, level: i32) {
        for out in outs {
            let delta = out.level - level;
            let transition = if delta == 0 {
                if out.consuming {
                    Transition::Across(0)
                } else {
                    Transition::None
                }
            } else {
                Transition::Across((-delta) as u32)
            };
            let outlet = Outlet {
                target: Some(target),
                transition,
            };
            let state = &mut self.states[out.state.0 as usize];
            match out.slot {
                Slot::Out => state.out = outlet,
                Slot::Out1 => state.out1 = outlet,
            }
        }
    }

    fn build_node(&mut self, pattern: &Tree, node: NodeRef, level: i32) -> Result<Fragment, BuildError> {
        let op = pattern.symbol(node);
        if op == SEMTREX_SYMBOL_LITERAL || op == SEMTREX_SYMBOL_LITERAL_NOT {
            self.build_literal(pattern, node, level, op == SEMTREX_SYMBOL_LITERAL_NOT)
        } else if op == SEMTREX_SYMBOL_ANY {
            self.check_arity(pattern, node, 0, 1, "0 or 1")?;
            let state = self.add_state(StateKind::Any);
            self.with_descent(pattern, node, 1, level, state)
        } else if op == SEMTREX_VALUE_LITERAL || op == SEMTREX_VALUE_LITERAL_NOT {
            self.build_value(pattern, node, level, op == SEMTREX_VALUE_LITERAL_NOT)
        } else if op == SEMTREX_SEQUENCE {
            self.check_arity(pattern, node, 1, usize::MAX, "at least 1")?;
            let mut fragments = Vec::new();
            for child in pattern.children(node).collect::<Vec<_>>() {
                fragments.push(self.build_node(pattern, child, level)?);
            }
            let mut iter = fragments.into_iter();
            let first = iter.next().unwrap();
            let mut outs = first.outs;
            for next in iter {
                self.patch(outs, next.start, level);
                outs = next.outs;
            }
            Ok(Fragment {
                start: first.start,
                outs,
            })
        } else if op == SEMTREX_OR {
            self.check_arity(pattern, node, 2, 2, "exactly 2")?;
            let left = self.build_node(pattern, pattern.child(node, 1).unwrap(), level)?;
            let right = self.build_node(pattern, pattern.child(node, 2).unwrap(), level)?;
            let split = self.add_state(StateKind::Split);
            self.set_out(split, left.start, Transition::None);
            self.states[split.0 as usize].out1 = Outlet {
                target: Some(right.start),
                transition: Transition::None,
            };
            let mut outs = left.outs;
            outs.extend(right.outs);
            Ok(Fragment { start: split, outs })
        } else if op == SEMTREX_ZERO_OR_MORE || op == SEMTREX_ONE_OR_MORE {
            self.check_arity(pattern, node, 1, 1, "exactly 1")?;
            let body = self.build_node(pattern, pattern.child(node, 1).unwrap(), level)?;
            let split = self.add_state(StateKind::Split);
            self.set_out(split, body.start, Transition::None);
            self.patch(body.outs, split, level);
            let start = if op == SEMTREX_ZERO_OR_MORE {
                split
            } else {
                body.start
            };
            Ok(Fragment {
                start,
                outs: vec![self.pending(split, Slot::Out1, level)],
            })
        } else if op == SEMTREX_ZERO_OR_ONE {
            self.check_arity(pattern, node, 1, 1, "exactly 1")?;
            let body = self.build_node(pattern, pattern.child(node, 1).unwrap(), level)?;
            let split = self.add_state(StateKind::Split);
            self.set_out(split, body.start, Transition::None);
            let mut outs = body.outs;
            outs.push(self.pending(split, Slot::Out1, level));
            Ok(Fragment { start: split, outs })
        } else if op == SEMTREX_GROUP {
            self.check_arity(pattern, node, 1, 1, "exactly 1")?;
            let capture = match pattern.surface(node) {
                Surface::Sem(capture) => *capture,
                _ => NULL_SYMBOL,
            };
            let uid = self.next_group_uid;
            self.next_group_uid += 1;
            let open = self.add_state(StateKind::GroupOpen { capture, uid });
            let body = self.build_node(pattern, pattern.child(node, 1).unwrap(), level)?;
            let close = self.add_state(StateKind::GroupClose { open });
            self.set_out(open, body.start, Transition::None);
            self.patch(body.outs, close, level);
            Ok(Fragment {
                start: open,
                outs: vec![self.pending(close, Slot::Out, level)],
            })
        } else if op == SEMTREX_DESCEND {
            self.check_arity(pattern, node, 1, 1, "exactly 1")?;
            let state = self.add_state(StateKind::Descend);
            let body = self.build_node(pattern, pattern.child(node, 1).unwrap(), level - 1)?;
            self.set_out(state, body.start, Transition::None);
            Ok(Fragment {
                start: state,
                outs: body.outs,
            })
        } else if op == SEMTREX_NOT {
            self.check_arity(pattern, node, 1, 1, "exactly 1")?;
            let state = self.add_state(StateKind::Not);
            let body = self.build_node(pattern, pattern.child(node, 1).unwrap(), level)?;
            self.set_out(state, body.start, Transition::None);
            let mut outs = body.outs;
            outs.push(self.pending(state, Slot::Out1, level));
            Ok(Fragment { start: state, outs })
        } else if op == SEMTREX_WALK {
            self.check_arity(pattern, node, 1, 1, "exactly 1")?;
            let state = self.add_state(StateKind::Walk);
            let body = self.build_node(pattern, pattern.child(node, 1).unwrap(), level)?;
            self.set_out(state, body.start, Transition::None);
            Ok(Fragment {
                start: state,
                outs: body.outs,
            })
        } else {
            Err(BuildError::UnexpectedOperator(op))
        }
    }

    /// Builds a `SYMBOL_LITERAL` or `SYMBOL_LITERAL_NOT`: a symbol state
    /// whose admissible set comes from the selector child, plus optional
    /// descent sugar.
    fn build_literal(
        &mut self,
        pattern: &Tree,
        node: NodeRef,
        level: i32,
        not: bool,
    ) -> Result<Fragment, BuildError> {
        self.check_arity(pattern, node, 1, 2, "1 or 2")?;
        let selector = pattern.child(node, 1).unwrap();
        let mut symbols = SmallVec::new();
        if pattern.symbol(selector) == SEMTREX_SYMBOL_SET {
            for member in pattern.children(selector) {
                if let Surface::Sem(symbol) = pattern.surface(member) {
                    symbols.push(*symbol);
                }
            }
        } else if let Surface::Sem(symbol) = pattern.surface(selector) {
            symbols.push(*symbol);
        }
        let state = self.add_state(StateKind::Symbol(SymbolSpec { not, symbols }));
        self.with_descent(pattern, node, 2, level, state)
    }

    /// Builds a `VALUE_LITERAL` or `VALUE_LITERAL_NOT`: a value state whose
    /// payload is the cloned value child (or the members of a `VALUE_SET`).
    fn build_value(
        &mut self,
        pattern: &Tree,
        node: NodeRef,
        level: i32,
        not: bool,
    ) -> Result<Fragment, BuildError> {
        self.check_arity(pattern, node, 1, 1, "exactly 1")?;
        let payload = pattern.child(node, 1).unwrap();
        let (symbol, values) = if pattern.symbol(payload) == SEMTREX_VALUE_SET {
            let first = pattern.child(payload, 1).ok_or(BuildError::BadArity {
                op: SEMTREX_VALUE_SET,
                got: 0,
                expected: "at least 1",
            })?;
            let values = pattern
                .children(payload)
                .map(|v| pattern.surface(v).clone())
                .collect();
            (pattern.symbol(first), values)
        } else {
            (
                pattern.symbol(payload),
                vec![pattern.surface(payload).clone()],
            )
        };
        let state = self.add_state(StateKind::Value(ValueSpec {
            not,
            symbol,
            values,
        }));
        Ok(Fragment {
            start: state,
            outs: vec![self.pending(state, Slot::Out, level)],
        })
    }

    /// Wires the optional descent-sugar child at `index` onto a consuming
    /// state: the state's edge descends into the matched node's first child
    /// and the inner fragment is built one level down.  Without sugar the
    /// state's exit is left dangling at the current level.
    fn with_descent(
        &mut self,
        pattern: &Tree,
        node: NodeRef,
        index: usize,
        level: i32,
        state: StateId,
    ) -> Result<Fragment, BuildError> {
        match pattern.child(node, index) {
            Some(child) => {
                let inner = self.build_node(pattern, child, level - 1)?;
                self.set_out(state, inner.start, Transition::Down);
                Ok(Fragment {
                    start: state,
                    outs: inner.outs,
                })
            }
            None => Ok(Fragment {
                start: state,
                outs: vec![self.pending(state, Slot::Out, level)],
            }),
        }
    }

    fn check_arity(
        &self,
        pattern: &Tree,
        node: NodeRef,
        min: usize,
        max: usize,
        expected: &'static str,
    ) -> Result<(), BuildError> {
        let got = pattern.child_count(node);
        if got < min || got > max {
            return Err(BuildError::BadArity {
                op: pattern.symbol(node),
                got,
                expected,
            });
        }
        Ok(())
    }
}
