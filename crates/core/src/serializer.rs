//! Canonical RDN emission.
//!
//! Emission is variant-driven: a match on the value tag picks the
//! per-variant emitter, recursing through containers. Output is canonical:
//! no whitespace, shortest round-trip decimals, the 24-character ISO form
//! for instants, base64 for binary unless configured otherwise.
//!
//! The value tree is owned, so cycles cannot be constructed and emission
//! is infallible; the only way to get no output at all is a replacer that
//! omits the root.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::options::{BinaryOutput, EntryKey, Replace, StringifyOptions, TupleOutput};
use crate::value::Value;

/// Replacer callback as seen by the emitter.
type Replacer<'f> = &'f mut dyn FnMut(&EntryKey, &Value) -> Replace;

pub(crate) fn stringify_document(value: &Value, options: &StringifyOptions) -> String {
    let mut emitter = Emitter {
        out: String::new(),
        options,
        replacer: None,
    };
    emitter.write_value(value);
    emitter.out
}

/// The replacer sees the root first; omitting it produces no output.
pub(crate) fn stringify_with_replacer(
    value: &Value,
    options: &StringifyOptions,
    replacer: Replacer<'_>,
) -> Option<String> {
    let mut emitter = Emitter {
        out: String::new(),
        options,
        replacer: None,
    };
    let root = match replacer(&EntryKey::Root, value) {
        Replace::Keep => None,
        Replace::With(new) => Some(new),
        Replace::Omit => return None,
    };
    emitter.replacer = Some(replacer);
    match &root {
        Some(new) => emitter.write_value(new),
        None => emitter.write_value(value),
    }
    Some(emitter.out)
}

struct Emitter<'o, 'f> {
    out: String,
    options: &'o StringifyOptions,
    replacer: Option<Replacer<'f>>,
}

impl Emitter<'_, '_> {
    fn write_value(&mut self, value: &Value) {
        match value {
            Value::Null => self.out.push_str("null"),
            Value::Bool(true) => self.out.push_str("true"),
            Value::Bool(false) => self.out.push_str("false"),
            Value::Number(n) => self.write_number(*n),
            Value::BigInt(n) => {
                self.out.push_str(&n.to_string());
                self.out.push('n');
            }
            Value::String(s) => self.write_string(s),
            Value::Array(items) => self.write_sequence(items, '[', ']'),
            Value::Tuple(items) => match self.options.tuple_output {
                TupleOutput::Parens => self.write_sequence(items, '(', ')'),
                TupleOutput::Array => self.write_sequence(items, '[', ']'),
            },
            Value::Object(members) => self.write_object(members),
            Value::Map(entries) => self.write_map(entries),
            Value::Set(items) => {
                self.out.push_str("Set");
                self.write_sequence(items, '{', '}');
            }
            Value::DateTime(dt) => {
                self.out.push('@');
                self.out
                    .push_str(&dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string());
            }
            Value::TimeOnly(t) => {
                // Milliseconds are always written, zero or not.
                self.out.push_str(&format!(
                    "@{:02}:{:02}:{:02}.{:03}",
                    t.hour, t.minute, t.second, t.millisecond
                ));
            }
            Value::Duration(body) => {
                self.out.push('@');
                self.out.push_str(body);
            }
            Value::RegExp { source, flags } => {
                self.out.push('/');
                self.out.push_str(source);
                self.out.push('/');
                self.out.push_str(flags);
            }
            Value::Binary(bytes) => match self.options.binary_output {
                BinaryOutput::Base64 => {
                    self.out.push_str("b\"");
                    self.out.push_str(&STANDARD.encode(bytes));
                    self.out.push('"');
                }
                BinaryOutput::Hex => {
                    self.out.push_str("x\"");
                    for b in bytes {
                        self.out.push_str(&format!("{b:02x}"));
                    }
                    self.out.push('"');
                }
            },
        }
    }

    /// Finite doubles print as the shortest decimal that round-trips;
    /// the specials use their literal spellings.
    fn write_number(&mut self, n: f64) {
        if n.is_nan() {
            self.out.push_str("NaN");
        } else if n == f64::INFINITY {
            self.out.push_str("Infinity");
        } else if n == f64::NEG_INFINITY {
            self.out.push_str("-Infinity");
        } else {
            self.out.push_str(&n.to_string());
        }
    }

    fn write_sequence(&mut self, items: &[Value], open: char, close: char) {
        self.out.push(open);
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.out.push(',');
            }
            // An omitted slot still occupies its position.
            match self.replace(&EntryKey::Index(index), item) {
                Some(kept) => self.write_value(&kept),
                None => self.out.push_str("null"),
            }
        }
        self.out.push(close);
    }

    fn write_object(&mut self, members: &indexmap::IndexMap<String, Value>) {
        self.out.push('{');
        let mut first = true;
        for (key, value) in members {
            let Some(kept) = self.replace(&EntryKey::Name(key.as_str()), value) else {
                continue;
            };
            if !first {
                self.out.push(',');
            }
            first = false;
            self.write_string(key);
            self.out.push(':');
            self.write_value(&kept);
        }
        self.out.push('}');
    }

    fn write_map(&mut self, entries: &[(Value, Value)]) {
        self.out.push_str("Map{");
        let mut first = true;
        for (key, value) in entries {
            let Some(kept) = self.replace(&EntryKey::Key(key), value) else {
                continue;
            };
            if !first {
                self.out.push(',');
            }
            first = false;
            self.write_value(key);
            self.out.push_str("=>");
            self.write_value(&kept);
        }
        self.out.push('}');
    }

    /// Run the replacer for one child position. `None` means omit.
    fn replace<'v>(&mut self, key: &EntryKey, value: &'v Value) -> Option<std::borrow::Cow<'v, Value>> {
        match &mut self.replacer {
            None => Some(std::borrow::Cow::Borrowed(value)),
            Some(replacer) => match replacer(key, value) {
                Replace::Keep => Some(std::borrow::Cow::Borrowed(value)),
                Replace::With(new) => Some(std::borrow::Cow::Owned(new)),
                Replace::Omit => None,
            },
        }
    }

    /// Emit a string with minimal escaping: the JSON-mandated set plus any
    /// control byte. Clean chunks are detected eight bytes at a time with
    /// a word-parallel test and copied verbatim.
    fn write_string(&mut self, s: &str) {
        self.out.push('"');
        let bytes = s.as_bytes();
        let mut start = 0;
        let mut i = 0;

        while i < bytes.len() {
            if let Some(chunk) = bytes.get(i..i + 8) {
                let word = u64::from_le_bytes(chunk.try_into().unwrap_or_default());
                if !word_needs_escape(word) {
                    i += 8;
                    continue;
                }
            }
            let b = bytes[i];
            if b < 0x20 || b == b'"' || b == b'\\' {
                // Any escape-triggering byte is ASCII, so slicing here
                // lands on a char boundary.
                self.out.push_str(&s[start..i]);
                self.write_escape(b);
                i += 1;
                start = i;
            } else {
                i += 1;
            }
        }
        self.out.push_str(&s[start..]);
        self.out.push('"');
    }

    fn write_escape(&mut self, b: u8) {
        match b {
            b'"' => self.out.push_str("\\\""),
            b'\\' => self.out.push_str("\\\\"),
            0x08 => self.out.push_str("\\b"),
            0x0C => self.out.push_str("\\f"),
            b'\n' => self.out.push_str("\\n"),
            b'\r' => self.out.push_str("\\r"),
            b'\t' => self.out.push_str("\\t"),
            _ => self.out.push_str(&format!("\\u{b:04x}")),
        }
    }
}

const ONES: u64 = 0x0101_0101_0101_0101;
const HIGHS: u64 = 0x8080_8080_8080_8080;

/// True if any byte in the word is a control byte, a quote, or a
/// backslash. Standard SWAR predicates: a zero byte in `x ^ SPLAT(c)`
/// marks an occurrence of `c`, and the borrow trick finds bytes < 0x20.
#[inline]
fn word_needs_escape(word: u64) -> bool {
    let below_space = word.wrapping_sub(ONES * 0x20) & !word & HIGHS;
    let quote = has_zero_byte(word ^ (ONES * u64::from(b'"')));
    let backslash = has_zero_byte(word ^ (ONES * u64::from(b'\\')));
    below_space != 0 || quote || backslash
}

#[inline]
fn has_zero_byte(word: u64) -> bool {
    word.wrapping_sub(ONES) & !word & HIGHS != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::TimeOnly;
    use chrono::NaiveDate;
    use indexmap::IndexMap;
    use num_bigint::BigInt;
    use pretty_assertions::assert_eq;

    fn render(value: &Value) -> String {
        stringify_document(value, &StringifyOptions::default())
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render(&Value::Null), "null");
        assert_eq!(render(&Value::Bool(true)), "true");
        assert_eq!(render(&Value::Number(1.0)), "1");
        assert_eq!(render(&Value::Number(-0.5)), "-0.5");
        assert_eq!(render(&Value::Number(f64::NAN)), "NaN");
        assert_eq!(render(&Value::Number(f64::INFINITY)), "Infinity");
        assert_eq!(render(&Value::Number(f64::NEG_INFINITY)), "-Infinity");
        assert_eq!(render(&Value::BigInt(BigInt::from(-42))), "-42n");
    }

    #[test]
    fn test_string_escaping_is_minimal() {
        assert_eq!(render(&Value::String("héllo 世界".to_string())), "\"héllo 世界\"");
        assert_eq!(
            render(&Value::String("a\"b\\c\nd\u{1}".to_string())),
            r#""a\"b\\c\nd""#
        );
        // Long clean strings take the word-at-a-time path.
        let long = "x".repeat(100);
        assert_eq!(render(&Value::String(long.clone())), format!("\"{long}\""));
        // Escape beyond the first aligned chunk.
        let tail = format!("{}\"", "y".repeat(20));
        assert_eq!(
            render(&Value::String(tail)),
            format!("\"{}\\\"\"", "y".repeat(20))
        );
    }

    #[test]
    fn test_containers() {
        let mut members = IndexMap::new();
        members.insert("a".to_string(), Value::Number(1.0));
        members.insert(
            "b".to_string(),
            Value::Array(vec![Value::Bool(true), Value::Null]),
        );
        assert_eq!(
            render(&Value::Object(members)),
            r#"{"a":1,"b":[true,null]}"#
        );

        assert_eq!(
            render(&Value::Tuple(vec![Value::Number(1.0), Value::Number(2.0)])),
            "(1,2)"
        );
        assert_eq!(render(&Value::Map(vec![])), "Map{}");
        assert_eq!(render(&Value::Set(vec![])), "Set{}");
        assert_eq!(
            render(&Value::Map(vec![(
                Value::String("k".to_string()),
                Value::Number(1.0)
            )])),
            r#"Map{"k"=>1}"#
        );
        assert_eq!(
            render(&Value::Set(vec![Value::Number(1.0), Value::Number(2.0)])),
            "Set{1,2}"
        );
    }

    #[test]
    fn test_tuple_as_array_option() {
        let options = StringifyOptions {
            tuple_output: TupleOutput::Array,
            ..StringifyOptions::default()
        };
        let tuple = Value::Tuple(vec![Value::Number(1.0)]);
        assert_eq!(stringify_document(&tuple, &options), "[1]");
    }

    #[test]
    fn test_datetime_is_always_the_24_char_iso_form() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_milli_opt(10, 30, 0, 123)
            .unwrap()
            .and_utc();
        assert_eq!(render(&Value::DateTime(dt)), "@2024-01-15T10:30:00.123Z");

        let midnight = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc();
        assert_eq!(
            render(&Value::DateTime(midnight)),
            "@2024-01-15T00:00:00.000Z"
        );
    }

    #[test]
    fn test_time_only_always_carries_millis() {
        let t = TimeOnly::new(14, 30, 0, 0).unwrap();
        assert_eq!(render(&Value::TimeOnly(t)), "@14:30:00.000");
    }

    #[test]
    fn test_duration_body_verbatim() {
        assert_eq!(
            render(&Value::Duration("P1Y2M3DT4H5M6S".to_string())),
            "@P1Y2M3DT4H5M6S"
        );
    }

    #[test]
    fn test_regexp() {
        assert_eq!(
            render(&Value::RegExp {
                source: "ab+".to_string(),
                flags: "gi".to_string(),
            }),
            "/ab+/gi"
        );
    }

    #[test]
    fn test_binary_output_options() {
        let binary = Value::Binary(b"Hello".to_vec());
        assert_eq!(render(&binary), r#"b"SGVsbG8=""#);

        let options = StringifyOptions {
            binary_output: BinaryOutput::Hex,
            ..StringifyOptions::default()
        };
        assert_eq!(stringify_document(&binary, &options), r#"x"48656c6c6f""#);
    }

    #[test]
    fn test_replacer_omits_member_and_nulls_slot() {
        let mut members = IndexMap::new();
        members.insert("keep".to_string(), Value::Number(1.0));
        members.insert("drop".to_string(), Value::Number(2.0));
        members.insert(
            "list".to_string(),
            Value::Array(vec![Value::Number(3.0), Value::Number(4.0)]),
        );
        let value = Value::Object(members);

        let rendered = stringify_with_replacer(
            &value,
            &StringifyOptions::default(),
            &mut |key, _| match key {
                EntryKey::Name("drop") => Replace::Omit,
                EntryKey::Index(0) => Replace::Omit,
                _ => Replace::Keep,
            },
        );
        assert_eq!(
            rendered.as_deref(),
            Some(r#"{"keep":1,"list":[null,4]}"#)
        );
    }

    #[test]
    fn test_replacer_omits_map_entry() {
        let value = Value::Map(vec![
            (Value::String("a".to_string()), Value::Number(1.0)),
            (Value::String("b".to_string()), Value::Number(2.0)),
        ]);
        let rendered = stringify_with_replacer(
            &value,
            &StringifyOptions::default(),
            &mut |key, _| match key {
                EntryKey::Key(Value::String(s)) if s == "a" => Replace::Omit,
                _ => Replace::Keep,
            },
        );
        assert_eq!(rendered.as_deref(), Some(r#"Map{"b"=>2}"#));
    }

    #[test]
    fn test_replacer_sees_root_first_and_may_omit_it() {
        assert_eq!(
            stringify_with_replacer(
                &Value::Number(1.0),
                &StringifyOptions::default(),
                &mut |_, _| Replace::Omit,
            ),
            None
        );

        let rendered = stringify_with_replacer(
            &Value::Number(1.0),
            &StringifyOptions::default(),
            &mut |key, _| match key {
                EntryKey::Root => Replace::With(Value::String("swapped".to_string())),
                _ => Replace::Keep,
            },
        );
        assert_eq!(rendered.as_deref(), Some(r#""swapped""#));
    }

    #[test]
    fn test_replaced_values_recurse_through_replacer() {
        let value = Value::Array(vec![Value::Number(1.0)]);
        let rendered = stringify_with_replacer(
            &value,
            &StringifyOptions::default(),
            &mut |key, _| match key {
                EntryKey::Index(0) => Replace::With(Value::Array(vec![
                    Value::Number(7.0),
                    Value::Number(8.0),
                ])),
                EntryKey::Index(1) => Replace::Omit,
                _ => Replace::Keep,
            },
        );
        // The substituted inner array goes through the replacer too, so
        // its second slot is omitted and renders as null.
        assert_eq!(rendered.as_deref(), Some("[[7,null]]"));
    }
}
