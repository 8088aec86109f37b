//! The RDN value model.
//!
//! Every parsed document is a tree of [`Value`] nodes. All container
//! variants preserve insertion order; the library never reorders anything.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

/// A wall-clock time of day with millisecond precision, detached from any
/// date or zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeOnly {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millisecond: u16,
}

impl TimeOnly {
    /// Build a time of day, validating field ranges (23/59/59/999).
    #[must_use]
    pub fn new(hour: u8, minute: u8, second: u8, millisecond: u16) -> Option<Self> {
        if hour > 23 || minute > 59 || second > 59 || millisecond > 999 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            second,
            millisecond,
        })
    }
}

/// A single RDN value.
///
/// `Number` carries an IEEE 754 double and includes `NaN` and `±Infinity`;
/// `BigInt` is a distinct variant and a value parsed as `42n` never equals
/// one parsed as `42`. `Object` keys keep their first-seen position; under
/// the default duplicate-key policy a later duplicate replaces the value in
/// place. `Map` keys may be any RDN value and entries stay in input order,
/// duplicates included. The `Binary` payload does not remember whether it
/// was written as base64 or hex.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    BigInt(BigInt),
    String(String),
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Object(IndexMap<String, Value>),
    Map(Vec<(Value, Value)>),
    Set(Vec<Value>),
    DateTime(DateTime<Utc>),
    TimeOnly(TimeOnly),
    /// The ISO 8601 duration body without the leading `@`, verbatim
    /// (e.g. `P1Y2M3DT4H5M6S`). Kept as text to avoid a lossy
    /// decomposition into calendar components.
    Duration(String),
    /// Source and flags of a regex literal. The source is the raw text
    /// between the slashes, escapes preserved; the core never compiles it.
    RegExp { source: String, flags: String },
    Binary(Vec<u8>),
}

impl Value {
    /// Returns the variant name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Tuple(_) => "tuple",
            Self::Object(_) => "object",
            Self::Map(_) => "map",
            Self::Set(_) => "set",
            Self::DateTime(_) => "datetime",
            Self::TimeOnly(_) => "time",
            Self::Duration(_) => "duration",
            Self::RegExp { .. } => "regexp",
            Self::Binary(_) => "binary",
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bigint(&self) -> Option<&BigInt> {
        match self {
            Self::BigInt(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Self::Tuple(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Object(members) => Some(members),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Self::Set(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<TimeOnly> {
        match self {
            Self::TimeOnly(t) => Some(*t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_duration(&self) -> Option<&str> {
        match self {
            Self::Duration(body) => Some(body),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Structural equality. Unlike IEEE comparison, `Number(NaN)` equals
/// `Number(NaN)`, so round-trip properties can be stated with `assert_eq!`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::TimeOnly(a), Self::TimeOnly(b)) => a == b,
            (Self::Duration(a), Self::Duration(b)) => a == b,
            (
                Self::RegExp {
                    source: sa,
                    flags: fa,
                },
                Self::RegExp {
                    source: sb,
                    flags: fb,
                },
            ) => sa == sb && fa == fb,
            (Self::Binary(a), Self::Binary(b)) => a == b,
            _ => false,
        }
    }
}
