// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Reads and writes trees in text, binary, and JSON forms

use std::fmt;

use serde::ser;
use serde::ser::SerializeMap;
use serde::ser::SerializeSeq;
use thiserror::Error;

use crate::semantics::Registry;
use crate::semantics::SemId;
use crate::semantics::SemKind;
use crate::tree::NodeRef;
use crate::tree::Surface;
use crate::tree::Tree;

/// An error from reading a serialized tree
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Unexpected character '{0}' at byte {1}")]
    UnexpectedCharacter(char, usize),
    #[error("Unexpected end of input")]
    UnexpectedEnd,
    #[error("Unknown label '{0}' at byte {1}")]
    UnknownLabel(String, usize),
    #[error("Malformed number at byte {0}")]
    BadNumber(usize),
    #[error("Truncated binary tree")]
    Truncated,
    #[error("Invalid surface tag {0}")]
    BadTag(u8),
    #[error("Invalid semantic kind {0}")]
    BadKind(i32),
    #[error("Invalid UTF-8 in string surface")]
    BadUtf8,
    #[error("Malformed JSON tree: {0}")]
    BadJson(String),
}

// ------------------------------------------------------------------------------------------------
// Text form: (LABEL[:surface] child*)

impl Tree {
    /// fmt::Displays this tree in its text form, resolving labels through
    /// the registry.
    pub fn display_with<'a>(&'a self, registry: &'a Registry) -> impl fmt::Display + 'a {
        struct DisplayTree<'a>(&'a Tree, &'a Registry);

        impl fmt::Display for DisplayTree<'_> {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write_text_node(f, self.0, self.0.root(), self.1)
            }
        }

        DisplayTree(self, registry)
    }
}

/// Writes a tree to its text form.
pub fn to_text(registry: &Registry, tree: &Tree) -> String {
    tree.display_with(registry).to_string()
}

fn write_text_node(
    f: &mut fmt::Formatter,
    tree: &Tree,
    node: NodeRef,
    registry: &Registry,
) -> fmt::Result {
    write!(f, "(")?;
    match registry.label(tree.symbol(node)) {
        Some(label) => write!(f, "{}", label)?,
        None => write!(f, "{}", tree.symbol(node))?,
    }
    match tree.surface(node) {
        Surface::Null => {}
        surface => {
            write!(f, ":")?;
            write_text_surface(f, surface)?;
        }
    }
    for child in tree.children(node) {
        write!(f, " ")?;
        write_text_node(f, tree, child, registry)?;
    }
    write!(f, ")")
}

fn write_text_surface(f: &mut fmt::Formatter, surface: &Surface) -> fmt::Result {
    match surface {
        Surface::Null => write!(f, "null"),
        Surface::Int(value) => write!(f, "{}", value),
        Surface::Float(value) => {
            if value.fract() == 0.0 && value.is_finite() {
                write!(f, "{:.1}", value)
            } else {
                write!(f, "{}", value)
            }
        }
        Surface::Bool(value) => write!(f, "{}", value),
        Surface::Char(value) => write_quoted(f, &value.to_string()),
        Surface::Text(value) => write_quoted(f, value),
        Surface::Bytes(bytes) => write!(f, "<blob:{}>", bytes.len()),
        Surface::Sem(id) => write!(f, "{{{},{},{}}}", id.context, id.kind as i32, id.id),
    }
}

fn write_quoted(f: &mut fmt::Formatter, value: &str) -> fmt::Result {
    write!(f, "\"")?;
    for ch in value.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            ch => write!(f, "{}", ch)?,
        }
    }
    write!(f, "\"")
}

/// Reads a tree from its text form, resolving labels through the registry.
/// Blob surfaces are inflated as zero-filled arrays of the recorded length.
pub fn from_text(registry: &Registry, source: &str) -> Result<Tree, SerializeError> {
    let mut reader = TextReader {
        registry,
        source,
        pos: 0,
    };
    reader.skip_whitespace();
    let tree = reader.read_node()?;
    reader.skip_whitespace();
    match reader.peek() {
        None => Ok(tree),
        Some(ch) => Err(SerializeError::UnexpectedCharacter(ch, reader.pos)),
    }
}

struct TextReader<'a> {
    registry: &'a Registry,
    source: &'a str,
    pos: usize,
}

impl TextReader<'_> {
    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Result<char, SerializeError> {
        let ch = self.peek().ok_or(SerializeError::UnexpectedEnd)?;
        self.pos += ch.len_utf8();
        Ok(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_ascii_whitespace() {
                break;
            }
            self.pos += ch.len_utf8();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), SerializeError> {
        match self.bump()? {
            ch if ch == expected => Ok(()),
            ch => Err(SerializeError::UnexpectedCharacter(ch, self.pos - ch.len_utf8())),
        }
    }

    fn read_node(&mut self) -> Result<Tree, SerializeError> {
        self.expect('(')?;
        let label_start = self.pos;
        let label = self.read_word();
        if label.is_empty() {
            let ch = self.peek().ok_or(SerializeError::UnexpectedEnd)?;
            return Err(SerializeError::UnexpectedCharacter(ch, self.pos));
        }
        let symbol = self
            .registry
            .symbol_named(&label)
            .ok_or_else(|| SerializeError::UnknownLabel(label, label_start))?;
        let surface = if self.peek() == Some(':') {
            self.bump()?;
            self.read_surface()?
        } else {
            Surface::Null
        };
        let mut tree = Tree::new(symbol, surface);
        let root = tree.root();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(')') => {
                    self.bump()?;
                    return Ok(tree);
                }
                Some('(') => {
                    let child = self.read_node()?;
                    tree.graft(root, &child, child.root());
                }
                Some(ch) => return Err(SerializeError::UnexpectedCharacter(ch, self.pos)),
                None => return Err(SerializeError::UnexpectedEnd),
            }
        }
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while let Some(ch) = self.peek() {
            if ch == '_' || ch.is_ascii_alphanumeric() {
                self.pos += ch.len_utf8();
            } else {
                break;
            }
        }
        self.source[start..self.pos].to_string()
    }

    fn read_surface(&mut self) -> Result<Surface, SerializeError> {
        match self.peek().ok_or(SerializeError::UnexpectedEnd)? {
            '"' => self.read_string().map(Surface::Text),
            '{' => self.read_identifier(),
            '<' => self.read_blob(),
            '-' => self.read_number(),
            ch if ch.is_ascii_digit() => self.read_number(),
            ch if ch.is_ascii_alphabetic() => {
                let start = self.pos;
                match self.read_word().as_str() {
                    "true" => Ok(Surface::Bool(true)),
                    "false" => Ok(Surface::Bool(false)),
                    "null" => Ok(Surface::Null),
                    _ => Err(SerializeError::UnexpectedCharacter(ch, start)),
                }
            }
            ch => Err(SerializeError::UnexpectedCharacter(ch, self.pos)),
        }
    }

    fn read_string(&mut self) -> Result<String, SerializeError> {
        self.expect('"')?;
        let mut value = String::new();
        let mut escape = false;
        loop {
            let ch = self.bump()?;
            if escape {
                escape = false;
                value.push(match ch {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    _ => ch,
                });
            } else {
                match ch {
                    '"' => return Ok(value),
                    '\\' => escape = true,
                    _ => value.push(ch),
                }
            }
        }
    }

    fn read_number(&mut self) -> Result<Surface, SerializeError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump()?;
        }
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                self.bump()?;
            } else {
                break;
            }
        }
        let mut float = false;
        if self.peek() == Some('.') {
            float = true;
            self.bump()?;
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    self.bump()?;
                } else {
                    break;
                }
            }
        }
        let text = &self.source[start..self.pos];
        if float {
            text.parse::<f64>()
                .map(Surface::Float)
                .map_err(|_| SerializeError::BadNumber(start))
        } else {
            text.parse::<i64>()
                .map(Surface::Int)
                .map_err(|_| SerializeError::BadNumber(start))
        }
    }

    fn read_identifier(&mut self) -> Result<Surface, SerializeError> {
        self.expect('{')?;
        let context = self.read_int()?;
        self.expect(',')?;
        let kind = self.read_int()?;
        self.expect(',')?;
        let id = self.read_int()?;
        self.expect('}')?;
        let kind = SemKind::from_i32(kind as i32).ok_or(SerializeError::BadKind(kind as i32))?;
        Ok(Surface::Sem(SemId::new(context as u32, kind, id as u32)))
    }

    fn read_int(&mut self) -> Result<i64, SerializeError> {
        match self.read_number()? {
            Surface::Int(value) => Ok(value),
            _ => Err(SerializeError::BadNumber(self.pos)),
        }
    }

    fn read_blob(&mut self) -> Result<Surface, SerializeError> {
        self.expect('<')?;
        let word = self.read_word();
        if word != "blob" {
            return Err(SerializeError::UnexpectedCharacter('<', self.pos));
        }
        self.expect(':')?;
        let len = self.read_int()?;
        self.expect('>')?;
        Ok(Surface::Bytes(vec![0; len as usize]))
    }
}

// ------------------------------------------------------------------------------------------------
// Binary form: per-node header, surface tag, then children in order

const TAG_NULL: u8 = 0;
const TAG_FLOAT: u8 = 1;
const TAG_TEXT: u8 = 2;
const TAG_BOOL: u8 = 3;
const TAG_BYTES: u8 = 4;
const TAG_SEM: u8 = 5;

/// Writes a tree to its binary form.  The fixed tag set flattens integer
/// and character surfaces to float64 and utf8 respectively.
pub fn to_bytes(tree: &Tree) -> Vec<u8> {
    let mut out = Vec::new();
    write_binary_node(&mut out, tree, tree.root());
    out
}

fn write_binary_node(out: &mut Vec<u8>, tree: &Tree, node: NodeRef) {
    let symbol = tree.symbol(node);
    out.extend_from_slice(&(symbol.context as i32).to_le_bytes());
    out.extend_from_slice(&(symbol.kind as i32).to_le_bytes());
    out.extend_from_slice(&(symbol.id as i32).to_le_bytes());
    out.extend_from_slice(&(tree.child_count(node) as u32).to_le_bytes());
    match tree.surface(node) {
        Surface::Null => out.push(TAG_NULL),
        Surface::Int(value) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&(*value as f64).to_le_bytes());
        }
        Surface::Float(value) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&value.to_le_bytes());
        }
        Surface::Char(value) => {
            out.push(TAG_TEXT);
            let mut buffer = [0u8; 4];
            let encoded = value.encode_utf8(&mut buffer);
            out.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
            out.extend_from_slice(encoded.as_bytes());
        }
        Surface::Text(value) => {
            out.push(TAG_TEXT);
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
            out.extend_from_slice(value.as_bytes());
        }
        Surface::Bool(value) => {
            out.push(TAG_BOOL);
            out.push(*value as u8);
        }
        Surface::Bytes(bytes) => {
            out.push(TAG_BYTES);
            out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
            out.extend_from_slice(bytes);
        }
        Surface::Sem(id) => {
            out.push(TAG_SEM);
            out.extend_from_slice(&(id.context as i32).to_le_bytes());
            out.extend_from_slice(&(id.kind as i32).to_le_bytes());
            out.extend_from_slice(&(id.id as i32).to_le_bytes());
        }
    }
    for child in tree.children(node) {
        write_binary_node(out, tree, child);
    }
}

/// Reads a tree from its binary form.
pub fn from_bytes(bytes: &[u8]) -> Result<Tree, SerializeError> {
    let mut reader = BinaryReader { bytes, pos: 0 };
    let (symbol, surface, count) = reader.read_header()?;
    let mut tree = Tree::new(symbol, surface);
    let root = tree.root();
    for _ in 0..count {
        reader.read_into(&mut tree, root)?;
    }
    Ok(tree)
}

struct BinaryReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl BinaryReader<'_> {
    fn take(&mut self, n: usize) -> Result<&[u8], SerializeError> {
        if self.pos + n > self.bytes.len() {
            return Err(SerializeError::Truncated);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_i32(&mut self) -> Result<i32, SerializeError> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u32(&mut self) -> Result<u32, SerializeError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u8(&mut self) -> Result<u8, SerializeError> {
        Ok(self.take(1)?[0])
    }

    fn read_f64(&mut self) -> Result<f64, SerializeError> {
        let bytes = self.take(8)?;
        let mut buffer = [0u8; 8];
        buffer.copy_from_slice(bytes);
        Ok(f64::from_le_bytes(buffer))
    }

    fn read_sem_id(&mut self) -> Result<SemId, SerializeError> {
        let context = self.read_i32()?;
        let kind = self.read_i32()?;
        let id = self.read_i32()?;
        let kind = SemKind::from_i32(kind).ok_or(SerializeError::BadKind(kind))?;
        Ok(SemId::new(context as u32, kind, id as u32))
    }

    fn read_header(&mut self) -> Result<(SemId, Surface, u32), SerializeError> {
        let symbol = self.read_sem_id()?;
        let count = self.read_u32()?;
        let surface = match self.read_u8()? {
            TAG_NULL => Surface::Null,
            TAG_FLOAT => Surface::Float(self.read_f64()?),
            TAG_TEXT => {
                let len = self.read_u32()? as usize;
                let bytes = self.take(len)?;
                let text = std::str::from_utf8(bytes).map_err(|_| SerializeError::BadUtf8)?;
                Surface::Text(text.to_string())
            }
            TAG_BOOL => Surface::Bool(self.read_u8()? != 0),
            TAG_BYTES => {
                let len = self.read_u32()? as usize;
                Surface::Bytes(self.take(len)?.to_vec())
            }
            TAG_SEM => Surface::Sem(self.read_sem_id()?),
            tag => return Err(SerializeError::BadTag(tag)),
        };
        Ok((symbol, surface, count))
    }

    fn read_into(&mut self, tree: &mut Tree, parent: NodeRef) -> Result<(), SerializeError> {
        let (symbol, surface, count) = self.read_header()?;
        let node = tree.add_child(parent, symbol, surface);
        for _ in 0..count {
            self.read_into(tree, node)?;
        }
        Ok(())
    }
}

// ------------------------------------------------------------------------------------------------
// JSON form: mirrors the binary tag set, blobs as arrays of bytes

struct JsonNode<'a>(&'a Tree, NodeRef);

impl ser::Serialize for JsonNode<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let tree = self.0;
        let node = self.1;
        let symbol = tree.symbol(node);
        // Serializing as a map instead of a struct so we don't have to
        // encode a struct name.
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("context", &symbol.context)?;
        map.serialize_entry("kind", &(symbol.kind as i32))?;
        map.serialize_entry("id", &symbol.id)?;
        map.serialize_entry("surface", &JsonSurface(tree.surface(node)))?;
        map.serialize_entry("children", &JsonChildren(tree, node))?;
        map.end()
    }
}

struct JsonSurface<'a>(&'a Surface);

impl ser::Serialize for JsonSurface<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        match self.0 {
            Surface::Null => {
                map.serialize_entry("tag", &TAG_NULL)?;
            }
            Surface::Int(value) => {
                map.serialize_entry("tag", &TAG_FLOAT)?;
                map.serialize_entry("value", &(*value as f64))?;
            }
            Surface::Float(value) => {
                map.serialize_entry("tag", &TAG_FLOAT)?;
                map.serialize_entry("value", value)?;
            }
            Surface::Char(value) => {
                map.serialize_entry("tag", &TAG_TEXT)?;
                map.serialize_entry("value", &value.to_string())?;
            }
            Surface::Text(value) => {
                map.serialize_entry("tag", &TAG_TEXT)?;
                map.serialize_entry("value", value)?;
            }
            Surface::Bool(value) => {
                map.serialize_entry("tag", &TAG_BOOL)?;
                map.serialize_entry("value", value)?;
            }
            Surface::Bytes(bytes) => {
                map.serialize_entry("tag", &TAG_BYTES)?;
                map.serialize_entry("value", bytes)?;
            }
            Surface::Sem(id) => {
                map.serialize_entry("tag", &TAG_SEM)?;
                map.serialize_entry("value", &[id.context as i32, id.kind as i32, id.id as i32])?;
            }
        }
        map.end()
    }
}

struct JsonChildren<'a>(&'a Tree, NodeRef);

impl ser::Serialize for JsonChildren<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let tree = self.0;
        let node = self.1;
        let mut seq = serializer.serialize_seq(Some(tree.child_count(node)))?;
        for child in tree.children(node) {
            seq.serialize_element(&JsonNode(tree, child))?;
        }
        seq.end()
    }
}

/// Writes a tree to its JSON form.
pub fn to_json(tree: &Tree) -> serde_json::Value {
    serde_json::to_value(JsonNode(tree, tree.root())).unwrap()
}

/// Writes a tree to a JSON string.
pub fn to_json_string(tree: &Tree) -> String {
    serde_json::to_string(&JsonNode(tree, tree.root())).unwrap()
}

/// Reads a tree from its JSON form.
pub fn from_json(value: &serde_json::Value) -> Result<Tree, SerializeError> {
    let (symbol, surface) = read_json_header(value)?;
    let mut tree = Tree::new(symbol, surface);
    let root = tree.root();
    read_json_children(value, &mut tree, root)?;
    Ok(tree)
}

fn json_field<'a>(
    value: &'a serde_json::Value,
    field: &str,
) -> Result<&'a serde_json::Value, SerializeError> {
    value
        .get(field)
        .ok_or_else(|| SerializeError::BadJson(format!("missing field '{}'", field)))
}

fn read_json_header(value: &serde_json::Value) -> Result<(SemId, Surface), SerializeError> {
    let context = json_field(value, "context")?
        .as_u64()
        .ok_or_else(|| SerializeError::BadJson("context is not an integer".into()))?;
    let kind = json_field(value, "kind")?
        .as_i64()
        .ok_or_else(|| SerializeError::BadJson("kind is not an integer".into()))?;
    let id = json_field(value, "id")?
        .as_u64()
        .ok_or_else(|| SerializeError::BadJson("id is not an integer".into()))?;
    let kind = SemKind::from_i32(kind as i32).ok_or(SerializeError::BadKind(kind as i32))?;
    let symbol = SemId::new(context as u32, kind, id as u32);
    let surface = read_json_surface(json_field(value, "surface")?)?;
    Ok((symbol, surface))
}

fn read_json_surface(value: &serde_json::Value) -> Result<Surface, SerializeError> {
    let tag = json_field(value, "tag")?
        .as_u64()
        .ok_or_else(|| SerializeError::BadJson("tag is not an integer".into()))? as u8;
    match tag {
        TAG_NULL => Ok(Surface::Null),
        TAG_FLOAT => {
            let number = json_field(value, "value")?
                .as_f64()
                .ok_or_else(|| SerializeError::BadJson("value is not a number".into()))?;
            Ok(Surface::Float(number))
        }
        TAG_TEXT => {
            let text = json_field(value, "value")?
                .as_str()
                .ok_or_else(|| SerializeError::BadJson("value is not a string".into()))?;
            Ok(Surface::Text(text.to_string()))
        }
        TAG_BOOL => {
            let flag = json_field(value, "value")?
                .as_bool()
                .ok_or_else(|| SerializeError::BadJson("value is not a boolean".into()))?;
            Ok(Surface::Bool(flag))
        }
        TAG_BYTES => {
            let items = json_field(value, "value")?
                .as_array()
                .ok_or_else(|| SerializeError::BadJson("value is not an array".into()))?;
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                let byte = item
                    .as_u64()
                    .ok_or_else(|| SerializeError::BadJson("blob byte is not an integer".into()))?;
                bytes.push(byte as u8);
            }
            Ok(Surface::Bytes(bytes))
        }
        TAG_SEM => {
            let items = json_field(value, "value")?
                .as_array()
                .ok_or_else(|| SerializeError::BadJson("value is not an array".into()))?;
            if items.len() != 3 {
                return Err(SerializeError::BadJson("identifier is not a triple".into()));
            }
            let part = |i: usize| -> Result<i64, SerializeError> {
                items[i]
                    .as_i64()
                    .ok_or_else(|| SerializeError::BadJson("identifier part is not an integer".into()))
            };
            let kind = SemKind::from_i32(part(1)? as i32)
                .ok_or_else(|| SerializeError::BadKind(part(1).unwrap_or(0) as i32))?;
            Ok(Surface::Sem(SemId::new(part(0)? as u32, kind, part(2)? as u32)))
        }
        tag => Err(SerializeError::BadTag(tag)),
    }
}

fn read_json_children(
    value: &serde_json::Value,
    tree: &mut Tree,
    parent: NodeRef,
) -> Result<(), SerializeError> {
    let children = json_field(value, "children")?
        .as_array()
        .ok_or_else(|| SerializeError::BadJson("children is not an array".into()))?;
    for child in children {
        let (symbol, surface) = read_json_header(child)?;
        let node = tree.add_child(parent, symbol, surface);
        read_json_children(child, tree, node)?;
    }
    Ok(())
}
