// -*- coding: utf-8 -*-
// ------------------------------------------------------------------------------------------------
// Copyright © 2021, tree-sitter authors.
// Licensed under either of Apache License, Version 2.0, or MIT license, at your option.
// Please see the LICENSE-APACHE or LICENSE-MIT files in this distribution for license details.
// ------------------------------------------------------------------------------------------------

//! Parses the semtrex surface syntax into pattern trees

use std::fmt::Display;
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use crate::semantics::Registry;
use crate::semantics::SemId;
use crate::semantics::SEMTREX_DESCEND;
use crate::semantics::SEMTREX_GROUP;
use crate::semantics::SEMTREX_NOT;
use crate::semantics::SEMTREX_ONE_OR_MORE;
use crate::semantics::SEMTREX_OR;
use crate::semantics::SEMTREX_SEQUENCE;
use crate::semantics::SEMTREX_SYMBOL;
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
use crate::tree::Surface;
use crate::tree::Tree;

/// Parses a semtrex pattern, resolving its labels through `registry`, and
/// returns the pattern tree.
pub fn parse(registry: &Registry, source: &str) -> Result<Tree, ParseError> {
    Parser::new(registry, source)?.parse_pattern()
}

/// The byte offset of a pattern entity within its source string
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Location(pub usize);

impl Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "byte {}", self.0)
    }
}

/// An error that can occur while parsing a semtrex pattern
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unexpected character '{0}' at {1}")]
    UnexpectedCharacter(char, Location),
    #[error("Unterminated string literal at {0}")]
    UnterminatedString(Location),
    #[error("Unterminated character literal at {0}")]
    UnterminatedChar(Location),
    #[error("Expected {expected} but found {got} at {loc}")]
    UnexpectedToken {
        expected: &'static str,
        got: String,
        loc: Location,
    },
    #[error("Unterminated {0} at {1}")]
    UnterminatedConstruct(&'static str, Location),
    #[error("Unknown symbol '{0}' at {1}")]
    UnknownSymbol(String, Location),
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Slash,
    Percent,
    Dot,
    Comma,
    Pipe,
    Star,
    Plus,
    Question,
    Tilde,
    Bang,
    Equals,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Less,
    Greater,
    Colon,
    Label(String),
    Int(i64),
    Float(f64),
    CharLit(char),
    StrLit(String),
    Eof,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Slash => "'/'".into(),
            Token::Percent => "'%'".into(),
            Token::Dot => "'.'".into(),
            Token::Comma => "','".into(),
            Token::Pipe => "'|'".into(),
            Token::Star => "'*'".into(),
            Token::Plus => "'+'".into(),
            Token::Question => "'?'".into(),
            Token::Tilde => "'~'".into(),
            Token::Bang => "'!'".into(),
            Token::Equals => "'='".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::Less => "'<'".into(),
            Token::Greater => "'>'".into(),
            Token::Colon => "':'".into(),
            Token::Label(label) => format!("label '{}'", label),
            Token::Int(value) => format!("integer {}", value),
            Token::Float(value) => format!("float {}", value),
            Token::CharLit(value) => format!("character '{}'", value),
            Token::StrLit(value) => format!("string {:?}", value),
            Token::Eof => "end of pattern".into(),
        }
    }
}

fn is_label_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_label(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
    offset: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            source,
            chars: source.chars().peekable(),
            offset: 0,
        }
    }

    fn try_peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip(&mut self) {
        if let Some(ch) = self.chars.next() {
            self.offset += ch.len_utf8();
        }
    }

    fn consume_while(&mut self, mut f: impl FnMut(char) -> bool) -> &'a str {
        let start = self.offset;
        while let Some(ch) = self.try_peek() {
            if !f(ch) {
                break;
            }
            self.skip();
        }
        &self.source[start..self.offset]
    }

    /// Whether the character after the `.` at the current offset is a
    /// digit, making the `.` a fraction point rather than a `.` token.
    fn dot_starts_fraction(&self) -> bool {
        self.source[self.offset + 1..]
            .bytes()
            .next()
            .map_or(false, |b| b.is_ascii_digit())
    }

    fn next_token(&mut self) -> Result<(Token, Location), ParseError> {
        while let Some(ch) = self.try_peek() {
            if !ch.is_ascii_whitespace() {
                break;
            }
            self.skip();
        }
        let loc = Location(self.offset);
        let ch = match self.try_peek() {
            None => return Ok((Token::Eof, loc)),
            Some(ch) => ch,
        };
        let token = match ch {
            '/' => Token::Slash,
            '%' => Token::Percent,
            '.' => Token::Dot,
            ',' => Token::Comma,
            '|' => Token::Pipe,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Question,
            '~' => Token::Tilde,
            '!' => Token::Bang,
            '=' => Token::Equals,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '<' => Token::Less,
            '>' => Token::Greater,
            ':' => Token::Colon,
            '\'' => return self.char_literal(loc),
            '"' => return self.string_literal(loc),
            '-' => return self.number(loc),
            ch if ch.is_ascii_digit() => return self.number(loc),
            ch if is_label_start(ch) => {
                let label = self.consume_while(is_label);
                return Ok((Token::Label(label.to_string()), loc));
            }
            ch => return Err(ParseError::UnexpectedCharacter(ch, loc)),
        };
        self.skip();
        Ok((token, loc))
    }

    fn char_literal(&mut self, loc: Location) -> Result<(Token, Location), ParseError> {
        self.skip();
        let value = match self.try_peek() {
            None | Some('\'') => return Err(ParseError::UnterminatedChar(loc)),
            Some(ch) => ch,
        };
        self.skip();
        if self.try_peek() != Some('\'') {
            return Err(ParseError::UnterminatedChar(loc));
        }
        self.skip();
        Ok((Token::CharLit(value), loc))
    }

    fn string_literal(&mut self, loc: Location) -> Result<(Token, Location), ParseError> {
        self.skip();
        let mut escape = false;
        let mut value = String::new();
        loop {
            let ch = match self.try_peek() {
                None => return Err(ParseError::UnterminatedString(loc)),
                Some(ch) => ch,
            };
            self.skip();
            if escape {
                escape = false;
                value.push(match ch {
                    'n' => '\n',
                    't' => '\t',
                    _ => ch,
                });
            } else {
                match ch {
                    '"' => return Ok((Token::StrLit(value), loc)),
                    '\\' => escape = true,
                    _ => value.push(ch),
                }
            }
        }
    }

    fn number(&mut self, loc: Location) -> Result<(Token, Location), ParseError> {
        let start = self.offset;
        if self.try_peek() == Some('-') {
            self.skip();
            match self.try_peek() {
                Some(ch) if ch.is_ascii_digit() => {}
                _ => return Err(ParseError::UnexpectedCharacter('-', loc)),
            }
        }
        self.consume_while(|ch| ch.is_ascii_digit());
        if self.try_peek() == Some('.') && self.dot_starts_fraction() {
            self.skip();
            self.consume_while(|ch| ch.is_ascii_digit());
            // The scanned text is a well-formed decimal literal.
            let value = self.source[start..self.offset].parse::<f64>().unwrap();
            return Ok((Token::Float(value), loc));
        }
        let value = self.source[start..self.offset].parse::<i64>().unwrap();
        Ok((Token::Int(value), loc))
    }
}

struct Parser<'a> {
    registry: &'a Registry,
    lexer: Lexer<'a>,
    lookahead: (Token, Location),
}

impl<'a> Parser<'a> {
    fn new(registry: &'a Registry, source: &'a str) -> Result<Parser<'a>, ParseError> {
        let mut lexer = Lexer::new(source);
        let lookahead = lexer.next_token()?;
        Ok(Parser {
            registry,
            lexer,
            lookahead,
        })
    }

    fn peek(&self) -> &Token {
        &self.lookahead.0
    }

    fn loc(&self) -> Location {
        self.lookahead.1
    }

    fn advance(&mut self) -> Result<(Token, Location), ParseError> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.lookahead, next))
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<Location, ParseError> {
        if *self.peek() == token {
            let (_, loc) = self.advance()?;
            Ok(loc)
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            expected,
            got: self.peek().describe(),
            loc: self.loc(),
        }
    }

    fn resolve(&self, label: &str, loc: Location) -> Result<SemId, ParseError> {
        self.registry
            .symbol_named(label)
            .ok_or_else(|| ParseError::UnknownSymbol(label.to_string(), loc))
    }

    fn parse_pattern(&mut self) -> Result<Tree, ParseError> {
        self.expect(Token::Slash, "'/'")?;
        let pattern = self.parse_siblings()?;
        if *self.peek() != Token::Eof {
            return Err(self.unexpected("end of pattern"));
        }
        Ok(pattern)
    }

    /// `siblings = seqExpr ("|" seqExpr)*`, folding alternation to the
    /// left; `OR` always has exactly two children.
    fn parse_siblings(&mut self) -> Result<Tree, ParseError> {
        let mut left = self.parse_seq()?;
        while *self.peek() == Token::Pipe {
            self.advance()?;
            let right = self.parse_seq()?;
            let mut or = Tree::new(SEMTREX_OR, Surface::Null);
            let root = or.root();
            or.graft(root, &left, left.root());
            or.graft(root, &right, right.root());
            left = or;
        }
        Ok(left)
    }

    /// `seqExpr = element ("," element)*`; a single element stays bare.
    fn parse_seq(&mut self) -> Result<Tree, ParseError> {
        let first = self.parse_element()?;
        if *self.peek() != Token::Comma {
            return Ok(first);
        }
        let mut seq = Tree::new(SEMTREX_SEQUENCE, Surface::Null);
        let root = seq.root();
        seq.graft(root, &first, first.root());
        while *self.peek() == Token::Comma {
            self.advance()?;
            let next = self.parse_element()?;
            seq.graft(root, &next, next.root());
        }
        Ok(seq)
    }

    fn parse_element(&mut self) -> Result<Tree, ParseError> {
        match self.peek() {
            Token::Percent => {
                self.advance()?;
                let body = self.parse_element()?;
                Ok(wrap(SEMTREX_WALK, Surface::Null, &body))
            }
            Token::Tilde => {
                self.advance()?;
                let body = self.parse_element()?;
                Ok(wrap(SEMTREX_NOT, Surface::Null, &body))
            }
            Token::Less => {
                let group = self.parse_group()?;
                self.parse_postfix(group)
            }
            _ => {
                let atom = self.parse_atom()?;
                self.parse_postfix(atom)
            }
        }
    }

    /// `group = "<" LABEL ":" siblings ">"`; the group's surface is the
    /// capture symbol the results will bear.
    fn parse_group(&mut self) -> Result<Tree, ParseError> {
        let open = self.expect(Token::Less, "'<'")?;
        let (token, loc) = self.advance()?;
        let symbol = match token {
            Token::Label(label) => self.resolve(&label, loc)?,
            token => {
                return Err(ParseError::UnexpectedToken {
                    expected: "capture name",
                    got: token.describe(),
                    loc,
                })
            }
        };
        self.expect(Token::Colon, "':'")?;
        let body = self.parse_siblings()?;
        if *self.peek() == Token::Eof {
            return Err(ParseError::UnterminatedConstruct("group", open));
        }
        self.expect(Token::Greater, "'>'")?;
        Ok(wrap(SEMTREX_GROUP, Surface::Sem(symbol), &body))
    }

    fn parse_postfix(&mut self, body: Tree) -> Result<Tree, ParseError> {
        let op = match self.peek() {
            Token::Star => SEMTREX_ZERO_OR_MORE,
            Token::Plus => SEMTREX_ONE_OR_MORE,
            Token::Question => SEMTREX_ZERO_OR_ONE,
            _ => return Ok(body),
        };
        self.advance()?;
        Ok(wrap(op, Surface::Null, &body))
    }

    fn parse_atom(&mut self) -> Result<Tree, ParseError> {
        match self.peek() {
            Token::Slash => {
                self.advance()?;
                let body = self.parse_element()?;
                Ok(wrap(SEMTREX_DESCEND, Surface::Null, &body))
            }
            Token::Dot => {
                self.advance()?;
                let mut any = Tree::new(SEMTREX_SYMBOL_ANY, Surface::Null);
                if *self.peek() == Token::Slash {
                    self.advance()?;
                    let child = self.parse_element()?;
                    let root = any.root();
                    any.graft(root, &child, child.root());
                }
                Ok(any)
            }
            Token::LParen => {
                let (_, open) = self.advance()?;
                let body = self.parse_siblings()?;
                if *self.peek() == Token::Eof {
                    return Err(ParseError::UnterminatedConstruct(
                        "parenthesized pattern",
                        open,
                    ));
                }
                self.expect(Token::RParen, "')'")?;
                Ok(body)
            }
            Token::Bang => {
                self.advance()?;
                let selector = match self.peek() {
                    Token::LBrace => self.parse_symbol_set()?,
                    Token::Label(_) => {
                        let (token, loc) = self.advance()?;
                        let label = match token {
                            Token::Label(label) => label,
                            _ => unreachable!(),
                        };
                        let symbol = self.resolve(&label, loc)?;
                        Tree::new(SEMTREX_SYMBOL, Surface::Sem(symbol))
                    }
                    _ => return Err(self.unexpected("symbol name or symbol set")),
                };
                Ok(wrap(SEMTREX_SYMBOL_LITERAL_NOT, Surface::Null, &selector))
            }
            Token::LBrace => {
                let selector = self.parse_symbol_set()?;
                Ok(wrap(SEMTREX_SYMBOL_LITERAL, Surface::Null, &selector))
            }
            Token::Label(_) => {
                let (token, loc) = self.advance()?;
                let label = match token {
                    Token::Label(label) => label,
                    _ => unreachable!(),
                };
                let symbol = self.resolve(&label, loc)?;
                self.parse_post_value(symbol)
            }
            _ => Err(self.unexpected("a pattern element")),
        }
    }

    /// What may follow a bare label: `= value`, `!= value`, or a `/ child`
    /// descent applying `child` to the first child of a matched node.  The
    /// descent stays a second child of the literal rather than a `DESCEND`
    /// wrapper, preserving the level information the automaton builder
    /// relies on.
    fn parse_post_value(&mut self, symbol: SemId) -> Result<Tree, ParseError> {
        match self.peek() {
            Token::Bang => {
                self.advance()?;
                self.expect(Token::Equals, "'='")?;
                let values = self.parse_value_spec(symbol)?;
                Ok(wrap(SEMTREX_VALUE_LITERAL_NOT, Surface::Null, &values))
            }
            Token::Equals => {
                self.advance()?;
                let values = self.parse_value_spec(symbol)?;
                Ok(wrap(SEMTREX_VALUE_LITERAL, Surface::Null, &values))
            }
            Token::Slash => {
                self.advance()?;
                let child = self.parse_element()?;
                let mut literal = Tree::new(SEMTREX_SYMBOL_LITERAL, Surface::Null);
                let root = literal.root();
                literal.add_child(root, SEMTREX_SYMBOL, Surface::Sem(symbol));
                literal.graft(root, &child, child.root());
                Ok(literal)
            }
            _ => {
                let mut literal = Tree::new(SEMTREX_SYMBOL_LITERAL, Surface::Null);
                let root = literal.root();
                literal.add_child(root, SEMTREX_SYMBOL, Surface::Sem(symbol));
                Ok(literal)
            }
        }
    }

    /// `value(set) = value | "{" value ("," value)* "}"`.  Every value
    /// node bears the matched symbol so the matcher compares symbol and
    /// surface jointly.
    fn parse_value_spec(&mut self, symbol: SemId) -> Result<Tree, ParseError> {
        if *self.peek() == Token::LBrace {
            let (_, open) = self.advance()?;
            let mut set = Tree::new(SEMTREX_VALUE_SET, Surface::Null);
            let root = set.root();
            let value = self.parse_value()?;
            set.add_child(root, symbol, value);
            while *self.peek() == Token::Comma {
                self.advance()?;
                let value = self.parse_value()?;
                set.add_child(root, symbol, value);
            }
            if *self.peek() == Token::Eof {
                return Err(ParseError::UnterminatedConstruct("value set", open));
            }
            self.expect(Token::RBrace, "'}'")?;
            Ok(set)
        } else {
            let value = self.parse_value()?;
            Ok(Tree::new(symbol, value))
        }
    }

    fn parse_value(&mut self) -> Result<Surface, ParseError> {
        match self.peek() {
            Token::Int(_) | Token::Float(_) | Token::CharLit(_) | Token::StrLit(_) => {
                let (token, _) = self.advance()?;
                Ok(match token {
                    Token::Int(value) => Surface::Int(value),
                    Token::Float(value) => Surface::Float(value),
                    Token::CharLit(value) => Surface::Char(value),
                    Token::StrLit(value) => Surface::Text(value),
                    _ => unreachable!(),
                })
            }
            _ => Err(self.unexpected("a value literal")),
        }
    }

    /// `symset = LABEL ("," LABEL)*` inside braces.
    fn parse_symbol_set(&mut self) -> Result<Tree, ParseError> {
        let open = self.expect(Token::LBrace, "'{'")?;
        let mut set = Tree::new(SEMTREX_SYMBOL_SET, Surface::Null);
        let root = set.root();
        loop {
            let (token, loc) = self.advance()?;
            let symbol = match token {
                Token::Label(label) => self.resolve(&label, loc)?,
                Token::Eof => {
                    return Err(ParseError::UnterminatedConstruct("symbol set", open))
                }
                _ => {
                    return Err(ParseError::UnexpectedToken {
                        expected: "symbol name",
                        got: token.describe(),
                        loc,
                    })
                }
            };
            set.add_child(root, SEMTREX_SYMBOL, Surface::Sem(symbol));
            if *self.peek() != Token::Comma {
                break;
            }
            self.advance()?;
        }
        if *self.peek() == Token::Eof {
            return Err(ParseError::UnterminatedConstruct("symbol set", open));
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(set)
    }
}

/// Wraps a subtree under a fresh single-child operator node.
fn wrap(symbol: SemId, surface: Surface, body: &Tree) -> Tree {
    let mut tree = Tree::new(symbol, surface);
    let root = tree.root();
    tree.graft(root, body, body.root());
    tree
}
