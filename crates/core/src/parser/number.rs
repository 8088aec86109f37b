//! Numeric literal scanning and decoding.
//!
//! The grammar is JSON's number grammar plus a `n` suffix for bigints. No
//! leading zeros; a fraction requires at least one digit; an exponent
//! requires at least one digit. A `n` suffix after a fraction or exponent
//! is fatal.

use num_bigint::BigInt;

use crate::error::{Error, Result};
use crate::scanner::Scanner;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberClass {
    /// Digits only (with optional sign).
    Integer,
    /// A fraction or exponent appeared, or the literal is `-Infinity`.
    Float,
    /// Digits with a trailing `n`.
    BigInt,
}

/// Span and shape of a scanned numeric literal. For bigints the span
/// includes the trailing `n`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScannedNumber {
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) class: NumberClass,
}

/// Scan a number starting at `-` or a digit.
pub(crate) fn scan(sc: &mut Scanner) -> Result<ScannedNumber> {
    let start = sc.pos();

    if sc.peek() == Some(b'-') {
        sc.bump();
        // `-Infinity` is a single value; the minus path branches here.
        if sc.peek() == Some(b'I') {
            sc.expect_literal(b"Infinity")?;
            return Ok(ScannedNumber {
                start,
                end: sc.pos(),
                class: NumberClass::Float,
            });
        }
    }

    match sc.peek() {
        Some(b'0') => {
            sc.bump();
            if matches!(sc.peek(), Some(b) if b.is_ascii_digit()) {
                return Err(Error::syntax(sc.pos(), "leading zeros are not allowed"));
            }
        }
        Some(b'1'..=b'9') => {
            sc.bump();
            while matches!(sc.peek(), Some(b) if b.is_ascii_digit()) {
                sc.bump();
            }
        }
        _ => return Err(Error::syntax(sc.pos(), "expected digit")),
    }

    let mut class = NumberClass::Integer;

    if sc.peek() == Some(b'.') {
        class = NumberClass::Float;
        sc.bump();
        if !matches!(sc.peek(), Some(b) if b.is_ascii_digit()) {
            return Err(Error::syntax(sc.pos(), "expected digit after '.'"));
        }
        while matches!(sc.peek(), Some(b) if b.is_ascii_digit()) {
            sc.bump();
        }
    }

    if matches!(sc.peek(), Some(b'e' | b'E')) {
        class = NumberClass::Float;
        sc.bump();
        if matches!(sc.peek(), Some(b'+' | b'-')) {
            sc.bump();
        }
        if !matches!(sc.peek(), Some(b) if b.is_ascii_digit()) {
            return Err(Error::syntax(sc.pos(), "expected digit in exponent"));
        }
        while matches!(sc.peek(), Some(b) if b.is_ascii_digit()) {
            sc.bump();
        }
    }

    if sc.peek() == Some(b'n') {
        if class == NumberClass::Float {
            return Err(Error::syntax(
                sc.pos(),
                "bigint suffix is not allowed after a fraction or exponent",
            ));
        }
        sc.bump();
        class = NumberClass::BigInt;
    }

    Ok(ScannedNumber {
        start,
        end: sc.pos(),
        class,
    })
}

/// Decode a scanned numeric literal into a value.
pub(crate) fn decode(src: &[u8], scanned: &ScannedNumber) -> Result<Value> {
    let text = &src[scanned.start..scanned.end];
    match scanned.class {
        NumberClass::BigInt => {
            let digits = &text[..text.len() - 1];
            let big = BigInt::parse_bytes(digits, 10)
                .ok_or_else(|| Error::syntax(scanned.start, "invalid bigint literal"))?;
            Ok(Value::BigInt(big))
        }
        NumberClass::Integer => Ok(Value::Number(decode_integer(text))),
        NumberClass::Float => {
            let text = std::str::from_utf8(text)
                .map_err(|_| Error::syntax(scanned.start, "invalid number"))?;
            let n: f64 = text
                .parse()
                .map_err(|_| Error::syntax(scanned.start, "invalid number"))?;
            Ok(Value::Number(n))
        }
    }
}

/// Integer fast path: up to 9 digits accumulate in an i32 register, up to
/// 18 in an i64; anything longer takes the general decimal route.
fn decode_integer(text: &[u8]) -> f64 {
    let (negative, digits) = match text.split_first() {
        Some((b'-', rest)) => (true, rest),
        _ => (false, text),
    };

    let magnitude = if digits.len() <= 9 {
        let mut acc: i32 = 0;
        for &b in digits {
            acc = acc * 10 + i32::from(b - b'0');
        }
        f64::from(acc)
    } else if digits.len() <= 18 {
        let mut acc: i64 = 0;
        for &b in digits {
            acc = acc * 10 + i64::from(b - b'0');
        }
        acc as f64
    } else {
        // Longer runs can exceed every register; defer to the standard
        // decimal-to-double conversion for correct rounding.
        std::str::from_utf8(digits)
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(f64::INFINITY)
    };

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_num(input: &str) -> Result<Value> {
        let mut sc = Scanner::new(input.as_bytes());
        let scanned = scan(&mut sc)?;
        decode(sc.src(), &scanned)
    }

    #[test]
    fn test_small_integers() {
        assert_eq!(parse_num("0").unwrap(), Value::Number(0.0));
        assert_eq!(parse_num("42").unwrap(), Value::Number(42.0));
        assert_eq!(parse_num("-7").unwrap(), Value::Number(-7.0));
        assert_eq!(parse_num("999999999").unwrap(), Value::Number(999_999_999.0));
    }

    #[test]
    fn test_wide_integers() {
        // 10 digits leaves the i32 register, 19 leaves the i64 register.
        assert_eq!(
            parse_num("9999999999").unwrap(),
            Value::Number(9_999_999_999.0)
        );
        let expected: f64 = "1234567890123456789012".parse().unwrap();
        assert_eq!(
            parse_num("1234567890123456789012").unwrap(),
            Value::Number(expected)
        );
    }

    #[test]
    fn test_floats() {
        assert_eq!(parse_num("3.14").unwrap(), Value::Number(3.14));
        assert_eq!(parse_num("-0.5").unwrap(), Value::Number(-0.5));
        assert_eq!(parse_num("1e3").unwrap(), Value::Number(1000.0));
        assert_eq!(parse_num("2.5E-2").unwrap(), Value::Number(0.025));
        assert_eq!(parse_num("1e+2").unwrap(), Value::Number(100.0));
    }

    #[test]
    fn test_negative_infinity() {
        assert_eq!(
            parse_num("-Infinity").unwrap(),
            Value::Number(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_bigint() {
        assert_eq!(
            parse_num("42n").unwrap(),
            Value::BigInt(BigInt::from(42))
        );
        assert_eq!(
            parse_num("-123456789012345678901234567890n").unwrap(),
            Value::BigInt(
                BigInt::parse_bytes(b"-123456789012345678901234567890", 10).unwrap()
            )
        );
    }

    #[test]
    fn test_leading_zeros_rejected() {
        assert!(parse_num("01").is_err());
        assert!(parse_num("-01").is_err());
    }

    #[test]
    fn test_bigint_suffix_after_float_rejected() {
        assert!(parse_num("1.0n").is_err());
        assert!(parse_num("1e1n").is_err());
    }

    #[test]
    fn test_missing_digits() {
        assert!(parse_num("1.").is_err());
        assert!(parse_num("1e").is_err());
        assert!(parse_num("-").is_err());
    }
}
