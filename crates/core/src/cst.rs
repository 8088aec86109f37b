//! Concrete syntax tree parser for formatting tools.
//!
//! Shares the scanner and the literal scan routines with the value parser,
//! but records `(start, end)` byte spans and leaves literal bodies in their
//! raw textual form instead of decoding them. Objects keep an ordered list
//! of (key, value) entry pairs, so duplicate keys and their source
//! positions survive for tooling to report on.

use serde::{Deserialize, Serialize};

use crate::dispatch::{classify, Token};
use crate::error::{Error, Result};
use crate::options::ParseOptions;
use crate::parser::{binary, number, regex, string, temporal};
use crate::scanner::Scanner;

/// Byte range of a node in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// An object entry. Duplicate keys are preserved in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CstEntry {
    pub key: CstNode,
    pub value: CstNode,
}

/// Node kind; containers carry their children, literals carry nothing and
/// are read back through [`CstNode::raw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CstKind {
    Null,
    Bool,
    Number,
    BigInt,
    String,
    DateTime,
    TimeOnly,
    Duration,
    Regex,
    Binary,
    Array(Vec<CstNode>),
    Tuple(Vec<CstNode>),
    Object(Vec<CstEntry>),
    Map(Vec<(CstNode, CstNode)>),
    Set(Vec<CstNode>),
}

/// A node of the concrete syntax tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CstNode {
    pub kind: CstKind,
    pub span: Span,
}

impl CstNode {
    /// The raw source text of this node, escapes and literal forms intact.
    #[must_use]
    pub fn raw<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// Parse a document into a CST with default options.
pub fn parse(text: &str) -> Result<CstNode> {
    parse_with(text, &ParseOptions::default())
}

/// Parse a document into a CST.
///
/// The duplicate-key policy is ignored here: preserving duplicates is the
/// point of the CST. Depth and binary-size bounds still apply, and literal
/// bodies are validated exactly as the value parser validates them.
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<CstNode> {
    let mut parser = CstParser {
        sc: Scanner::new(text.as_bytes()),
        depth: options.max_depth,
        options,
    };
    let node = parser.parse_node()?;
    parser.sc.skip_ws();
    if !parser.sc.eof() {
        return Err(Error::syntax(
            parser.sc.pos(),
            "unexpected trailing data after value",
        ));
    }
    Ok(node)
}

struct CstParser<'a, 'o> {
    sc: Scanner<'a>,
    depth: usize,
    options: &'o ParseOptions,
}

impl CstParser<'_, '_> {
    fn enter(&mut self) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::range(
                self.sc.pos(),
                "maximum nesting depth exceeded",
            ));
        }
        self.depth -= 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth += 1;
    }

    fn node(&self, kind: CstKind, start: usize) -> CstNode {
        CstNode {
            kind,
            span: Span {
                start,
                end: self.sc.pos(),
            },
        }
    }

    fn parse_node(&mut self) -> Result<CstNode> {
        self.sc.skip_ws();
        let start = self.sc.pos();
        let Some(byte) = self.sc.peek() else {
            return Err(Error::syntax(start, "unexpected end of input"));
        };

        match classify(byte) {
            Token::Str => {
                string::scan(&mut self.sc)?;
                Ok(self.node(CstKind::String, start))
            }
            Token::Digit | Token::Minus => {
                let scanned = number::scan(&mut self.sc)?;
                let kind = match scanned.class {
                    number::NumberClass::BigInt => CstKind::BigInt,
                    _ => CstKind::Number,
                };
                Ok(self.node(kind, start))
            }
            Token::Brace => self.parse_brace(start),
            Token::Bracket => {
                let items = self.parse_sequence(b'[', b']')?;
                Ok(self.node(CstKind::Array(items), start))
            }
            Token::Paren => {
                let items = self.parse_sequence(b'(', b')')?;
                Ok(self.node(CstKind::Tuple(items), start))
            }
            Token::True => {
                self.sc.expect_literal(b"true")?;
                Ok(self.node(CstKind::Bool, start))
            }
            Token::False => {
                self.sc.expect_literal(b"false")?;
                Ok(self.node(CstKind::Bool, start))
            }
            Token::Null => {
                self.sc.expect_literal(b"null")?;
                Ok(self.node(CstKind::Null, start))
            }
            Token::At => {
                let kind = match temporal::scan(&mut self.sc)? {
                    temporal::Temporal::DateTime(_) => CstKind::DateTime,
                    temporal::Temporal::TimeOnly(_) => CstKind::TimeOnly,
                    temporal::Temporal::Duration(_) => CstKind::Duration,
                };
                Ok(self.node(kind, start))
            }
            Token::Slash => {
                regex::scan(&mut self.sc)?;
                Ok(self.node(CstKind::Regex, start))
            }
            Token::Base64 => {
                binary::scan(&mut self.sc, binary::BinaryEncoding::Base64, self.options)?;
                Ok(self.node(CstKind::Binary, start))
            }
            Token::Hex => {
                binary::scan(&mut self.sc, binary::BinaryEncoding::Hex, self.options)?;
                Ok(self.node(CstKind::Binary, start))
            }
            Token::Infinity => {
                self.sc.expect_literal(b"Infinity")?;
                Ok(self.node(CstKind::Number, start))
            }
            Token::Nan => {
                self.sc.expect_literal(b"NaN")?;
                Ok(self.node(CstKind::Number, start))
            }
            Token::Map => {
                self.sc.expect_literal(b"Map{")?;
                self.enter()?;
                self.sc.skip_ws();
                let entries = if self.sc.peek() == Some(b'}') {
                    self.sc.bump();
                    Vec::new()
                } else {
                    let key = self.parse_node()?;
                    self.sc.skip_ws();
                    self.sc.expect_literal(b"=>")?;
                    self.parse_map_tail(key)?
                };
                self.leave();
                Ok(self.node(CstKind::Map(entries), start))
            }
            Token::Set => {
                self.sc.expect_literal(b"Set{")?;
                self.enter()?;
                self.sc.skip_ws();
                let items = if self.sc.peek() == Some(b'}') {
                    self.sc.bump();
                    Vec::new()
                } else {
                    let first = self.parse_node()?;
                    self.parse_set_tail(first)?
                };
                self.leave();
                Ok(self.node(CstKind::Set(items), start))
            }
            Token::Ws | Token::Invalid => Err(Error::syntax(start, "unexpected character")),
        }
    }

    fn parse_sequence(&mut self, open: u8, close: u8) -> Result<Vec<CstNode>> {
        self.sc.expect(open)?;
        self.enter()?;
        let mut items = Vec::new();

        self.sc.skip_ws();
        if self.sc.peek() == Some(close) {
            self.sc.bump();
            self.leave();
            return Ok(items);
        }

        loop {
            items.push(self.parse_node()?);
            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b) if b == close => {
                    self.sc.bump();
                    break;
                }
                Some(b',') => self.sc.bump(),
                _ => {
                    return Err(Error::syntax(
                        self.sc.pos(),
                        format!("expected ',' or '{}'", close as char),
                    ));
                }
            }
        }
        self.leave();
        Ok(items)
    }

    fn parse_brace(&mut self, start: usize) -> Result<CstNode> {
        self.sc.expect(b'{')?;
        self.enter()?;

        self.sc.skip_ws();
        if self.sc.peek() == Some(b'}') {
            self.sc.bump();
            self.leave();
            return Ok(self.node(CstKind::Object(Vec::new()), start));
        }

        let first_at = self.sc.pos();
        let first = self.parse_node()?;
        self.sc.skip_ws();

        let kind = match self.sc.peek() {
            Some(b':') => {
                self.sc.bump();
                if first.kind != CstKind::String {
                    return Err(Error::syntax(first_at, "object key must be a string"));
                }
                CstKind::Object(self.parse_object_tail(first)?)
            }
            Some(b'=') => {
                self.sc.bump();
                self.sc.expect(b'>')?;
                CstKind::Map(self.parse_map_tail(first)?)
            }
            Some(b',') => CstKind::Set(self.parse_set_tail(first)?),
            Some(b'}') => {
                self.sc.bump();
                CstKind::Set(vec![first])
            }
            _ => {
                return Err(Error::syntax(
                    self.sc.pos(),
                    "expected ':', '=>', ',', or '}'",
                ));
            }
        };
        self.leave();
        Ok(self.node(kind, start))
    }

    fn parse_object_tail(&mut self, first_key: CstNode) -> Result<Vec<CstEntry>> {
        let mut entries = Vec::new();
        let mut key = first_key;

        loop {
            let value = self.parse_node()?;
            entries.push(CstEntry { key, value });

            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => {
                    self.sc.bump();
                    self.sc.skip_ws();
                    let key_at = self.sc.pos();
                    let next = self.parse_node()?;
                    if next.kind != CstKind::String {
                        return Err(Error::syntax(key_at, "object key must be a string"));
                    }
                    key = next;
                    self.sc.skip_ws();
                    self.sc.expect(b':')?;
                }
                Some(b'}') => {
                    self.sc.bump();
                    return Ok(entries);
                }
                _ => return Err(Error::syntax(self.sc.pos(), "expected ',' or '}'")),
            }
        }
    }

    fn parse_map_tail(&mut self, first_key: CstNode) -> Result<Vec<(CstNode, CstNode)>> {
        let mut entries = Vec::new();
        let mut key = first_key;

        loop {
            let value = self.parse_node()?;
            entries.push((key, value));

            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => {
                    self.sc.bump();
                    key = self.parse_node()?;
                    self.sc.skip_ws();
                    self.sc.expect_literal(b"=>")?;
                }
                Some(b'}') => {
                    self.sc.bump();
                    return Ok(entries);
                }
                _ => return Err(Error::syntax(self.sc.pos(), "expected ',' or '}'")),
            }
        }
    }

    fn parse_set_tail(&mut self, first: CstNode) -> Result<Vec<CstNode>> {
        let mut items = vec![first];

        loop {
            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => {
                    self.sc.bump();
                    items.push(self.parse_node()?);
                }
                Some(b'}') => {
                    self.sc.bump();
                    return Ok(items);
                }
                _ => return Err(Error::syntax(self.sc.pos(), "expected ',' or '}'")),
            }
        }
    }
}
