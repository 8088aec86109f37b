//! RDN Core
//!
//! Parser and serializer for RDN (Rich Data Notation), a strict superset
//! of JSON with native syntax for dates, times of day, durations, bigints,
//! regular expressions, binary blobs, ordered maps, sets, tuples, and the
//! numeric specials `NaN` and `±Infinity`.
//!
//! ```
//! use rdn_core::{parse, stringify};
//!
//! let value = parse(r#"{"id": 42n, "tags": Set{"a", "b"}}"#)?;
//! assert_eq!(stringify(&value), r#"{"id":42n,"tags":Set{"a","b"}}"#);
//! # Ok::<(), rdn_core::Error>(())
//! ```
//!
//! Every valid JSON document parses, and every parsed tree round-trips:
//! `parse(&stringify(&v))` reproduces `v` for all variants except the
//! documented lossy ones (the textual form of a DateTime, leading zeros
//! inside a Duration, and the hex/base64 choice of a Binary literal).

pub mod cst;
mod dispatch;
mod error;
mod options;
mod parser;
mod scanner;
mod serializer;
mod value;

pub use error::{Error, ErrorKind, Result};
pub use options::{
    BinaryOutput, DuplicateKeys, EntryKey, ParseOptions, Replace, StringifyOptions, TupleOutput,
    DEFAULT_MAX_BINARY_BYTES, DEFAULT_MAX_DEPTH,
};
pub use value::{TimeOnly, Value};

/// Parse an RDN text into a value tree with default options.
pub fn parse(text: &str) -> Result<Value> {
    parse_with(text, &ParseOptions::default())
}

/// Parse an RDN text into a value tree.
pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Value> {
    tracing::trace!(len = text.len(), max_depth = options.max_depth, "parse");
    parser::parse_document(text, options)
}

/// Parse an RDN text, then run a reviver over the tree bottom-up.
///
/// The reviver sees each value together with its position in the parent
/// (`EntryKey::Name` for object members, `EntryKey::Index` for array,
/// tuple, and set slots, `EntryKey::Key` for map entries). Returning
/// `None` deletes that entry; the root is visited last with
/// [`EntryKey::Root`], and a deleted root yields `Ok(None)`.
pub fn parse_with_reviver<F>(
    text: &str,
    options: &ParseOptions,
    mut reviver: F,
) -> Result<Option<Value>>
where
    F: FnMut(&EntryKey, Value) -> Option<Value>,
{
    let value = parse_with(text, options)?;
    Ok(parser::apply_reviver(value, &mut reviver))
}

/// Parse a raw `.rdn` file body.
///
/// Input must be UTF-8 (with or without BOM) or UTF-16 (either endianness;
/// detected by BOM or by the zero-byte pattern of an ASCII-leading
/// document). Anything else is a type error.
pub fn parse_bytes(bytes: &[u8], options: &ParseOptions) -> Result<Value> {
    let text = decode_input(bytes)?;
    parse_with(&text, options)
}

/// Serialize a value tree to canonical RDN text with default options.
#[must_use]
pub fn stringify(value: &Value) -> String {
    stringify_with(value, &StringifyOptions::default())
}

/// Serialize a value tree to canonical RDN text.
#[must_use]
pub fn stringify_with(value: &Value, options: &StringifyOptions) -> String {
    tracing::trace!(variant = value.type_name(), "stringify");
    serializer::stringify_document(value, options)
}

/// Serialize with a replacer callback, invoked top-down at every value
/// position (root first, with [`EntryKey::Root`]).
///
/// [`Replace::Omit`] drops object members and map entries. An omitted
/// array, tuple, or set slot renders as `null`, and an omitted root
/// produces no output at all (`None`).
pub fn stringify_with_replacer<F>(
    value: &Value,
    options: &StringifyOptions,
    mut replacer: F,
) -> Option<String>
where
    F: FnMut(&EntryKey, &Value) -> Replace,
{
    serializer::stringify_with_replacer(value, options, &mut replacer)
}

/// Decode raw input bytes to text, per the supported encodings.
fn decode_input(bytes: &[u8]) -> Result<String> {
    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return utf8(rest);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return utf16(rest, u16::from_be_bytes);
    }
    // No BOM: an RDN document starts with ASCII, so UTF-16 shows up as a
    // zero byte in the first pair.
    match bytes {
        [0, ..] => utf16(bytes, u16::from_be_bytes),
        [_, 0, ..] => utf16(bytes, u16::from_le_bytes),
        _ => utf8(bytes),
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| Error::type_error(e.valid_up_to(), "input is not valid UTF-8"))
}

fn utf16(bytes: &[u8], read: fn([u8; 2]) -> u16) -> Result<String> {
    if !bytes.len().is_multiple_of(2) {
        return Err(Error::type_error(
            bytes.len() - 1,
            "odd byte length in UTF-16 input",
        ));
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| read([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units).map_err(|_| Error::type_error(0, "input is not valid UTF-16"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_stringify_roundtrip() {
        let value = parse(r#"{"a":1,"b":[true,null]}"#).unwrap();
        assert_eq!(stringify(&value), r#"{"a":1,"b":[true,null]}"#);
    }

    #[test]
    fn test_parse_bytes_utf8() {
        assert_eq!(
            parse_bytes(b"[1]", &ParseOptions::default()).unwrap(),
            Value::Array(vec![Value::Number(1.0)])
        );
        // With a BOM.
        let mut input = vec![0xEF, 0xBB, 0xBF];
        input.extend_from_slice(b"true");
        assert_eq!(
            parse_bytes(&input, &ParseOptions::default()).unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_parse_bytes_utf16() {
        // "42" in UTF-16LE with BOM, then bare UTF-16BE.
        let le = [0xFF, 0xFE, b'4', 0x00, b'2', 0x00];
        assert_eq!(
            parse_bytes(&le, &ParseOptions::default()).unwrap(),
            Value::Number(42.0)
        );
        let be = [0x00, b'4', 0x00, b'2'];
        assert_eq!(
            parse_bytes(&be, &ParseOptions::default()).unwrap(),
            Value::Number(42.0)
        );
    }

    #[test]
    fn test_parse_bytes_bad_encoding_is_a_type_error() {
        let err = parse_bytes(&[0xC3, 0x28], &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);

        let err = parse_bytes(&[0xFF, 0xFE, b'4'], &ParseOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Type);
    }

    #[test]
    fn test_reviver_entry_point() {
        let revived = parse_with_reviver(
            r#"{"a":1,"b":2}"#,
            &ParseOptions::default(),
            |key, value| match key {
                EntryKey::Name("a") => None,
                _ => Some(value),
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(stringify(&revived), r#"{"b":2}"#);
    }

    #[test]
    fn test_replacer_entry_point() {
        let value = parse(r#"{"password":"hunter2","user":"ada"}"#).unwrap();
        let rendered =
            stringify_with_replacer(&value, &StringifyOptions::default(), |key, _| match key {
                EntryKey::Name("password") => Replace::Omit,
                _ => Replace::Keep,
            });
        assert_eq!(rendered.as_deref(), Some(r#"{"user":"ada"}"#));
    }
}
