//! Recursive-descent parser producing [`Value`] trees.
//!
//! The parser owns a [`Scanner`], a depth budget, and the parse options.
//! Dispatch is a single table lookup on the first byte of each value; the
//! only place that needs more than one byte of lookahead is the brace
//! form, where the separator after the first value decides between
//! object, map, and set.

pub(crate) mod binary;
pub(crate) mod number;
pub(crate) mod regex;
pub(crate) mod string;
pub(crate) mod temporal;

use indexmap::IndexMap;

use crate::dispatch::{classify, Token};
use crate::error::{Error, Result};
use crate::options::{DuplicateKeys, EntryKey, ParseOptions};
use crate::scanner::Scanner;
use crate::value::Value;

use binary::BinaryEncoding;
use temporal::Temporal;

/// Parse one document: a single value with nothing but whitespace around it.
pub(crate) fn parse_document(text: &str, options: &ParseOptions) -> Result<Value> {
    let mut parser = Parser::new(text.as_bytes(), options);
    let value = parser.parse_value()?;
    parser.sc.skip_ws();
    if !parser.sc.eof() {
        return Err(Error::syntax(
            parser.sc.pos(),
            "unexpected trailing data after value",
        ));
    }
    Ok(value)
}

pub(crate) struct Parser<'a, 'o> {
    sc: Scanner<'a>,
    /// Remaining depth budget; entering a container spends one level.
    depth: usize,
    options: &'o ParseOptions,
}

impl<'a, 'o> Parser<'a, 'o> {
    fn new(src: &'a [u8], options: &'o ParseOptions) -> Self {
        Self {
            sc: Scanner::new(src),
            depth: options.max_depth,
            options,
        }
    }

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

    fn parse_value(&mut self) -> Result<Value> {
        self.sc.skip_ws();
        let Some(byte) = self.sc.peek() else {
            return Err(Error::syntax(self.sc.pos(), "unexpected end of input"));
        };

        match classify(byte) {
            Token::Str => {
                let scanned = string::scan(&mut self.sc)?;
                Ok(Value::String(string::decode(self.sc.src(), &scanned)?))
            }
            Token::Digit | Token::Minus => {
                let scanned = number::scan(&mut self.sc)?;
                number::decode(self.sc.src(), &scanned)
            }
            Token::Brace => self.parse_brace(),
            Token::Bracket => self.parse_array(),
            Token::Paren => self.parse_tuple(),
            Token::True => {
                self.sc.expect_literal(b"true")?;
                Ok(Value::Bool(true))
            }
            Token::False => {
                self.sc.expect_literal(b"false")?;
                Ok(Value::Bool(false))
            }
            Token::Null => {
                self.sc.expect_literal(b"null")?;
                Ok(Value::Null)
            }
            Token::At => Ok(match temporal::scan(&mut self.sc)? {
                Temporal::DateTime(dt) => Value::DateTime(dt),
                Temporal::TimeOnly(t) => Value::TimeOnly(t),
                Temporal::Duration(body) => Value::Duration(body),
            }),
            Token::Slash => {
                let scanned = regex::scan(&mut self.sc)?;
                Ok(Value::RegExp {
                    source: scanned.source,
                    flags: scanned.flags,
                })
            }
            Token::Base64 => self.parse_binary(BinaryEncoding::Base64),
            Token::Hex => self.parse_binary(BinaryEncoding::Hex),
            Token::Infinity => {
                self.sc.expect_literal(b"Infinity")?;
                Ok(Value::Number(f64::INFINITY))
            }
            Token::Nan => {
                self.sc.expect_literal(b"NaN")?;
                Ok(Value::Number(f64::NAN))
            }
            Token::Map => {
                self.sc.expect_literal(b"Map{")?;
                self.enter()?;
                self.sc.skip_ws();
                let entries = if self.sc.peek() == Some(b'}') {
                    self.sc.bump();
                    Vec::new()
                } else {
                    let key = self.parse_value()?;
                    self.sc.skip_ws();
                    self.sc.expect_literal(b"=>")?;
                    self.parse_map_tail(key)?
                };
                self.leave();
                Ok(Value::Map(entries))
            }
            Token::Set => {
                self.sc.expect_literal(b"Set{")?;
                self.enter()?;
                self.sc.skip_ws();
                let items = if self.sc.peek() == Some(b'}') {
                    self.sc.bump();
                    Vec::new()
                } else {
                    let first = self.parse_value()?;
                    self.parse_set_tail(first)?
                };
                self.leave();
                Ok(Value::Set(items))
            }
            Token::Ws | Token::Invalid => {
                Err(Error::syntax(self.sc.pos(), "unexpected character"))
            }
        }
    }

    fn parse_binary(&mut self, encoding: BinaryEncoding) -> Result<Value> {
        let scanned = binary::scan(&mut self.sc, encoding, self.options)?;
        Ok(Value::Binary(binary::decode(self.sc.src(), &scanned)?))
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.sc.expect(b'[')?;
        self.enter()?;
        let mut items = Vec::new();

        self.sc.skip_ws();
        if self.sc.peek() == Some(b']') {
            self.sc.bump();
            self.leave();
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_value()?);
            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => self.sc.bump(),
                Some(b']') => {
                    self.sc.bump();
                    break;
                }
                _ => return Err(Error::syntax(self.sc.pos(), "expected ',' or ']'")),
            }
        }
        self.leave();
        Ok(Value::Array(items))
    }

    fn parse_tuple(&mut self) -> Result<Value> {
        self.sc.expect(b'(')?;
        self.enter()?;
        let mut items = Vec::new();

        self.sc.skip_ws();
        if self.sc.peek() == Some(b')') {
            self.sc.bump();
            self.leave();
            return Ok(Value::Tuple(items));
        }

        loop {
            items.push(self.parse_value()?);
            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => self.sc.bump(),
                Some(b')') => {
                    self.sc.bump();
                    break;
                }
                _ => return Err(Error::syntax(self.sc.pos(), "expected ',' or ')'")),
            }
        }
        self.leave();
        Ok(Value::Tuple(items))
    }

    /// `{` opens an object, an implicit map, or an implicit set. An empty
    /// body is an object. Otherwise one value is parsed and the separator
    /// after it decides: `:` object (the value must have been a string
    /// key), `=>` map, `,` set, `}` single-element set.
    fn parse_brace(&mut self) -> Result<Value> {
        self.sc.expect(b'{')?;
        self.enter()?;

        self.sc.skip_ws();
        if self.sc.peek() == Some(b'}') {
            self.sc.bump();
            self.leave();
            return Ok(Value::Object(IndexMap::new()));
        }

        let first_at = self.sc.pos();
        let first = self.parse_value()?;
        self.sc.skip_ws();

        let value = match self.sc.peek() {
            Some(b':') => {
                self.sc.bump();
                let Value::String(key) = first else {
                    return Err(Error::syntax(first_at, "object key must be a string"));
                };
                self.parse_object_tail(key, first_at)?
            }
            Some(b'=') => {
                self.sc.bump();
                self.sc.expect(b'>')?;
                Value::Map(self.parse_map_tail(first)?)
            }
            Some(b',') => Value::Set(self.parse_set_tail(first)?),
            Some(b'}') => {
                self.sc.bump();
                Value::Set(vec![first])
            }
            _ => {
                return Err(Error::syntax(
                    self.sc.pos(),
                    "expected ':', '=>', ',', or '}'",
                ));
            }
        };
        self.leave();
        Ok(value)
    }

    /// Members after the first key and its `:` have been consumed.
    fn parse_object_tail(&mut self, first_key: String, first_key_at: usize) -> Result<Value> {
        let mut members = IndexMap::new();
        let mut key = first_key;
        let mut key_at = first_key_at;

        loop {
            let value = self.parse_value()?;
            if self.options.duplicate_keys == DuplicateKeys::Reject && members.contains_key(&key) {
                return Err(Error::value(key_at, format!("duplicate key \"{key}\"")));
            }
            members.insert(key, value);

            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => {
                    self.sc.bump();
                    self.sc.skip_ws();
                    key_at = self.sc.pos();
                    let next = self.parse_value()?;
                    let Value::String(next_key) = next else {
                        return Err(Error::syntax(key_at, "object key must be a string"));
                    };
                    key = next_key;
                    self.sc.skip_ws();
                    self.sc.expect(b':')?;
                }
                Some(b'}') => {
                    self.sc.bump();
                    return Ok(Value::Object(members));
                }
                _ => return Err(Error::syntax(self.sc.pos(), "expected ',' or '}'")),
            }
        }
    }

    /// Entries after the first key and its `=>` have been consumed.
    fn parse_map_tail(&mut self, first_key: Value) -> Result<Vec<(Value, Value)>> {
        let mut entries = Vec::new();
        let mut key = first_key;

        loop {
            let value = self.parse_value()?;
            entries.push((key, value));

            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => {
                    self.sc.bump();
                    key = self.parse_value()?;
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

    /// Elements after the first one has been parsed.
    fn parse_set_tail(&mut self, first: Value) -> Result<Vec<Value>> {
        let mut items = vec![first];

        loop {
            self.sc.skip_ws();
            match self.sc.peek() {
                Some(b',') => {
                    self.sc.bump();
                    items.push(self.parse_value()?);
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

/// Apply a reviver to a parsed tree, bottom-up. Children are revived
/// before their parent sees them; returning `None` deletes the entry. The
/// root itself is revived last, and a deleted root yields `None`.
pub(crate) fn apply_reviver<F>(root: Value, reviver: &mut F) -> Option<Value>
where
    F: FnMut(&EntryKey, Value) -> Option<Value>,
{
    let root = revive_children(root, reviver);
    reviver(&EntryKey::Root, root)
}

fn revive_children<F>(value: Value, reviver: &mut F) -> Value
where
    F: FnMut(&EntryKey, Value) -> Option<Value>,
{
    match value {
        Value::Array(items) => Value::Array(revive_items(items, reviver)),
        Value::Tuple(items) => Value::Tuple(revive_items(items, reviver)),
        Value::Set(items) => Value::Set(revive_items(items, reviver)),
        Value::Object(members) => {
            let mut out = IndexMap::with_capacity(members.len());
            for (key, value) in members {
                let value = revive_children(value, reviver);
                if let Some(value) = reviver(&EntryKey::Name(key.as_str()), value) {
                    out.insert(key, value);
                }
            }
            Value::Object(out)
        }
        Value::Map(entries) => {
            let mut out = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                let value = revive_children(value, reviver);
                if let Some(value) = reviver(&EntryKey::Key(&key), value) {
                    out.push((key, value));
                }
            }
            Value::Map(out)
        }
        other => other,
    }
}

fn revive_items<F>(items: Vec<Value>, reviver: &mut F) -> Vec<Value>
where
    F: FnMut(&EntryKey, Value) -> Option<Value>,
{
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let item = revive_children(item, reviver);
        if let Some(item) = reviver(&EntryKey::Index(index), item) {
            out.push(item);
        }
    }
    out
}
