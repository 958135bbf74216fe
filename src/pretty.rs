// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Renders pattern trees back to the semtrex surface syntax

use std::fmt;
use std::fmt::Write;

use crate::semantics::Registry;
use crate::semantics::SemId;
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

/// Renders a pattern tree to its surface syntax.  Re-parsing the output
/// yields a structurally equal pattern tree.
pub fn print(registry: &Registry, pattern: &Tree) -> String {
    let mut out = String::from("/");
    // Writing to a String cannot fail.
    write_node(&mut out, registry, pattern, pattern.root(), Prec::Alternation).unwrap();
    out
}

/// How tightly the surrounding syntax binds; a node whose own level is
/// looser than the context gets parenthesized.
#[derive(Clone, Copy, PartialEq, PartialOrd)]
enum Prec {
    Alternation,
    Sequence,
    Element,
    Atom,
}

fn level_of(tree: &Tree, node: NodeRef) -> Prec {
    let symbol = tree.symbol(node);
    if symbol == SEMTREX_OR {
        Prec::Alternation
    } else if symbol == SEMTREX_SEQUENCE {
        Prec::Sequence
    } else if symbol == SEMTREX_NOT || symbol == SEMTREX_WALK || symbol == SEMTREX_DESCEND {
        // Prefix operators swallow a postfix quantifier into their operand.
        Prec::Element
    } else if (symbol == SEMTREX_SYMBOL_LITERAL || symbol == SEMTREX_SYMBOL_ANY)
        && tree.child_count(node) == descent_child_index(tree, node)
    {
        // A literal carrying descent sugar does the same.
        Prec::Element
    } else {
        Prec::Atom
    }
}

/// 1-based index a descent-sugar child would occupy on this literal.
fn descent_child_index(tree: &Tree, node: NodeRef) -> usize {
    if tree.symbol(node) == SEMTREX_SYMBOL_LITERAL {
        2
    } else {
        1
    }
}

fn write_node(
    f: &mut String,
    registry: &Registry,
    tree: &Tree,
    node: NodeRef,
    required: Prec,
) -> fmt::Result {
    if level_of(tree, node) < required {
        f.push('(');
        write_bare(f, registry, tree, node)?;
        f.push(')');
        Ok(())
    } else {
        write_bare(f, registry, tree, node)
    }
}

fn write_bare(f: &mut String, registry: &Registry, tree: &Tree, node: NodeRef) -> fmt::Result {
    let symbol = tree.symbol(node);
    if symbol == SEMTREX_OR {
        write_node(f, registry, tree, tree.child(node, 1).unwrap(), Prec::Alternation)?;
        f.push('|');
        write_node(f, registry, tree, tree.child(node, 2).unwrap(), Prec::Sequence)
    } else if symbol == SEMTREX_SEQUENCE {
        for (i, child) in tree.children(node).enumerate() {
            if i > 0 {
                f.push(',');
            }
            write_node(f, registry, tree, child, Prec::Element)?;
        }
        Ok(())
    } else if symbol == SEMTREX_ZERO_OR_MORE
        || symbol == SEMTREX_ONE_OR_MORE
        || symbol == SEMTREX_ZERO_OR_ONE
    {
        write_node(f, registry, tree, tree.child(node, 1).unwrap(), Prec::Atom)?;
        f.push(if symbol == SEMTREX_ZERO_OR_MORE {
            '*'
        } else if symbol == SEMTREX_ONE_OR_MORE {
            '+'
        } else {
            '?'
        });
        Ok(())
    } else if symbol == SEMTREX_NOT {
        f.push('~');
        write_node(f, registry, tree, tree.child(node, 1).unwrap(), Prec::Element)
    } else if symbol == SEMTREX_WALK {
        f.push('%');
        write_node(f, registry, tree, tree.child(node, 1).unwrap(), Prec::Element)
    } else if symbol == SEMTREX_DESCEND {
        f.push('/');
        write_node(f, registry, tree, tree.child(node, 1).unwrap(), Prec::Element)
    } else if symbol == SEMTREX_GROUP {
        let capture = match tree.surface(node) {
            Surface::Sem(capture) => *capture,
            _ => crate::semantics::NULL_SYMBOL,
        };
        f.push('<');
        write_label(f, registry, capture)?;
        f.push(':');
        write_node(f, registry, tree, tree.child(node, 1).unwrap(), Prec::Alternation)?;
        f.push('>');
        Ok(())
    } else if symbol == SEMTREX_SYMBOL_ANY {
        f.push('.');
        if let Some(child) = tree.child(node, 1) {
            f.push('/');
            write_node(f, registry, tree, child, Prec::Element)?;
        }
        Ok(())
    } else if symbol == SEMTREX_SYMBOL_LITERAL || symbol == SEMTREX_SYMBOL_LITERAL_NOT {
        if symbol == SEMTREX_SYMBOL_LITERAL_NOT {
            f.push('!');
        }
        let selector = tree.child(node, 1).unwrap();
        write_selector(f, registry, tree, selector)?;
        if symbol == SEMTREX_SYMBOL_LITERAL {
            if let Some(child) = tree.child(node, 2) {
                f.push('/');
                write_node(f, registry, tree, child, Prec::Element)?;
            }
        }
        Ok(())
    } else if symbol == SEMTREX_VALUE_LITERAL || symbol == SEMTREX_VALUE_LITERAL_NOT {
        let payload = tree.child(node, 1).unwrap();
        if tree.symbol(payload) == SEMTREX_VALUE_SET {
            let first = tree.child(payload, 1).unwrap();
            write_label(f, registry, tree.symbol(first))?;
            f.push_str(if symbol == SEMTREX_VALUE_LITERAL { "=" } else { "!=" });
            f.push('{');
            for (i, value) in tree.children(payload).enumerate() {
                if i > 0 {
                    f.push(',');
                }
                write_value(f, tree.surface(value))?;
            }
            f.push('}');
        } else {
            write_label(f, registry, tree.symbol(payload))?;
            f.push_str(if symbol == SEMTREX_VALUE_LITERAL { "=" } else { "!=" });
            write_value(f, tree.surface(payload))?;
        }
        Ok(())
    } else {
        // Not a pattern operator; render the raw identifier so the output
        // stays inspectable.
        write!(f, "{}", symbol)
    }
}

/// Renders a `SEMTREX_SYMBOL` or `SEMTREX_SYMBOL_SET` selector node.
fn write_selector(
    f: &mut String,
    registry: &Registry,
    tree: &Tree,
    selector: NodeRef,
) -> fmt::Result {
    if tree.symbol(selector) == SEMTREX_SYMBOL_SET {
        f.push('{');
        for (i, member) in tree.children(selector).enumerate() {
            if i > 0 {
                f.push(',');
            }
            if let Surface::Sem(symbol) = tree.surface(member) {
                write_label(f, registry, *symbol)?;
            }
        }
        f.push('}');
        Ok(())
    } else {
        match tree.surface(selector) {
            Surface::Sem(symbol) => write_label(f, registry, *symbol),
            _ => Ok(()),
        }
    }
}

fn write_label(f: &mut String, registry: &Registry, symbol: SemId) -> fmt::Result {
    match registry.label(symbol) {
        Some(label) => f.write_str(label),
        None => write!(f, "{}", symbol),
    }
}

fn write_value(f: &mut String, value: &Surface) -> fmt::Result {
    match value {
        Surface::Int(value) => write!(f, "{}", value),
        Surface::Float(value) => {
            // A trailing `.0` keeps an integral float re-parsing as a float.
            if value.fract() == 0.0 && value.is_finite() {
                write!(f, "{:.1}", value)
            } else {
                write!(f, "{}", value)
            }
        }
        Surface::Char(value) => write!(f, "'{}'", value),
        Surface::Text(value) => {
            f.push('"');
            for ch in value.chars() {
                match ch {
                    '"' => f.push_str("\\\""),
                    '\\' => f.push_str("\\\\"),
                    '\n' => f.push_str("\\n"),
                    '\t' => f.push_str("\\t"),
                    ch => f.push(ch),
                }
            }
            f.push('"');
            Ok(())
        }
        Surface::Bool(value) => write!(f, "{}", value),
        Surface::Null => f.write_str("null"),
        Surface::Bytes(bytes) => write!(f, "<blob:{}>", bytes.len()),
        Surface::Sem(symbol) => write!(f, "{}", symbol),
    }
}
