//! Parse and stringify configuration, plus the callback position type
//! shared by reviver and replacer.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Default maximum container nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Default maximum decoded size of a single binary literal (100 MiB).
pub const DEFAULT_MAX_BINARY_BYTES: usize = 100 * 1024 * 1024;

/// What to do when an object literal repeats a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DuplicateKeys {
    /// The later value replaces the earlier one; the key keeps its
    /// first-seen position.
    #[default]
    LastWins,
    /// Fail the parse with a value error.
    Reject,
}

/// Configuration for [`parse`](crate::parse) and the CST parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Maximum container nesting depth. Exceeding it is fatal.
    pub max_depth: usize,
    /// Maximum decoded size of a single binary literal, in bytes.
    pub max_binary_bytes: usize,
    /// Duplicate-key policy for object literals.
    pub duplicate_keys: DuplicateKeys,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_binary_bytes: DEFAULT_MAX_BINARY_BYTES,
            duplicate_keys: DuplicateKeys::default(),
        }
    }
}

/// Surface form used when emitting tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TupleOutput {
    /// `(1,2,3)`, which round-trips back to a Tuple.
    #[default]
    Parens,
    /// `[1,2,3]`, lossy, for JSON interop.
    Array,
}

/// Encoding used when emitting binary payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BinaryOutput {
    /// `b"SGVsbG8="`
    #[default]
    Base64,
    /// `x"48656c6c6f"`
    Hex,
}

/// Configuration for [`stringify`](crate::stringify).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StringifyOptions {
    pub tuple_output: TupleOutput,
    pub binary_output: BinaryOutput,
}

/// Position of a value within its parent, as seen by reviver and replacer
/// callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EntryKey<'a> {
    /// The root value of the document.
    Root,
    /// An object member, by property name.
    Name(&'a str),
    /// An array, tuple, or set slot, by index.
    Index(usize),
    /// A map entry, by its key value.
    Key(&'a Value),
}

/// Outcome of a replacer callback for one value position.
#[derive(Debug)]
pub enum Replace {
    /// Emit the value unchanged.
    Keep,
    /// Emit this value instead; its children go through the replacer too.
    With(Value),
    /// Omit the value. Object members and map entries are dropped; an
    /// omitted array, tuple, or set slot renders as `null`; an omitted
    /// root produces no output at all.
    Omit,
}
