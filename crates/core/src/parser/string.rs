//! String scanning and deferred materialization.
//!
//! Strings are handled in two phases. The scan pass walks the body once,
//! recording the content span and whether any backslash occurred, and
//! rejects unescaped control bytes. Escape-free strings materialize as a
//! plain copy of the span; only strings that actually contain escapes pay
//! for the decoding pass.

use crate::error::{Error, Result};
use crate::scanner::Scanner;

/// Result of the scan pass over a string body.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScannedString {
    /// Offset of the first content byte, after the opening quote.
    pub(crate) start: usize,
    /// Offset of the closing quote.
    pub(crate) end: usize,
    pub(crate) has_escape: bool,
}

/// Scan a string starting at the opening quote.
pub(crate) fn scan(sc: &mut Scanner) -> Result<ScannedString> {
    sc.expect(b'"')?;
    let start = sc.pos();
    let mut has_escape = false;

    loop {
        match sc.peek() {
            None => return Err(Error::syntax(sc.pos(), "unterminated string")),
            Some(b'"') => {
                let end = sc.pos();
                sc.bump();
                return Ok(ScannedString {
                    start,
                    end,
                    has_escape,
                });
            }
            Some(b'\\') => {
                has_escape = true;
                sc.bump();
                if sc.eof() {
                    return Err(Error::syntax(sc.pos(), "unterminated string"));
                }
                // The escaped byte is skipped blindly here; the decode pass
                // validates the full escape sequence.
                sc.bump();
            }
            Some(b) if b < 0x20 => {
                return Err(Error::syntax(
                    sc.pos(),
                    "control character in string must be escaped",
                ));
            }
            Some(_) => sc.bump(),
        }
    }
}

/// Materialize the value of a scanned string.
pub(crate) fn decode(src: &[u8], scanned: &ScannedString) -> Result<String> {
    let bytes = &src[scanned.start..scanned.end];
    if !scanned.has_escape {
        return std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| Error::syntax(scanned.start, "invalid UTF-8 in string"));
    }

    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let at = scanned.start + i;
        i += 1;
        let Some(&esc) = bytes.get(i) else {
            return Err(Error::syntax(at, "unterminated escape sequence"));
        };
        i += 1;
        match esc {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
                let code = hex4(bytes, &mut i, scanned.start)?;
                let scalar = match code {
                    0xD800..=0xDBFF => {
                        // High surrogate: a low surrogate escape must
                        // follow, and the pair combines into one
                        // supplementary code point.
                        if bytes.get(i) != Some(&b'\\') || bytes.get(i + 1) != Some(&b'u') {
                            return Err(Error::syntax(at, "unpaired surrogate in string"));
                        }
                        i += 2;
                        let low = hex4(bytes, &mut i, scanned.start)?;
                        if !(0xDC00..=0xDFFF).contains(&low) {
                            return Err(Error::syntax(at, "unpaired surrogate in string"));
                        }
                        0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00)
                    }
                    0xDC00..=0xDFFF => {
                        return Err(Error::syntax(at, "unpaired surrogate in string"));
                    }
                    _ => code,
                };
                let ch = char::from_u32(scalar)
                    .ok_or_else(|| Error::syntax(at, "invalid unicode escape"))?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
            }
            _ => {
                return Err(Error::syntax(
                    at,
                    format!("invalid escape sequence '\\{}'", esc as char),
                ));
            }
        }
    }

    String::from_utf8(out).map_err(|_| Error::syntax(scanned.start, "invalid UTF-8 in string"))
}

/// Read exactly four hex digits at `*i`, advancing past them.
fn hex4(bytes: &[u8], i: &mut usize, base: usize) -> Result<u32> {
    let mut code: u32 = 0;
    for _ in 0..4 {
        let Some(&b) = bytes.get(*i) else {
            return Err(Error::syntax(base + *i, "expected four hex digits in unicode escape"));
        };
        let digit = match b {
            b'0'..=b'9' => u32::from(b - b'0'),
            b'a'..=b'f' => u32::from(b - b'a' + 10),
            b'A'..=b'F' => u32::from(b - b'A' + 10),
            _ => {
                return Err(Error::syntax(
                    base + *i,
                    "expected four hex digits in unicode escape",
                ));
            }
        };
        code = (code << 4) | digit;
        *i += 1;
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(input: &str) -> Result<String> {
        let mut sc = Scanner::new(input.as_bytes());
        let scanned = scan(&mut sc)?;
        decode(sc.src(), &scanned)
    }

    #[test]
    fn test_escape_free_string_spans_the_source() {
        let mut sc = Scanner::new(br#""hello" rest"#);
        let scanned = scan(&mut sc).unwrap();
        assert!(!scanned.has_escape);
        assert_eq!((scanned.start, scanned.end), (1, 6));
        assert_eq!(sc.pos(), 7);
    }

    #[test]
    fn test_all_simple_escapes() {
        assert_eq!(
            parse_str(r#""\" \\ \/ \b \f \n \r \t""#).unwrap(),
            "\" \\ / \u{8} \u{c} \n \r \t"
        );
    }

    #[test]
    fn test_unicode_escape() {
        assert_eq!(parse_str(r#""\u00e9""#).unwrap(), "é");
        assert_eq!(parse_str(r#""\u0041""#).unwrap(), "A");
    }

    #[test]
    fn test_surrogate_pair_combines() {
        // U+1F600
        assert_eq!(parse_str(r#""\ud83d\ude00""#).unwrap(), "😀");
    }

    #[test]
    fn test_unpaired_surrogate_is_rejected() {
        assert!(parse_str(r#""\ud83d""#).is_err());
        assert!(parse_str(r#""\ude00""#).is_err());
        assert!(parse_str(r#""\ud83dA""#).is_err());
    }

    #[test]
    fn test_raw_control_byte_is_rejected() {
        for b in 0u8..0x20 {
            let input = [b'"', b, b'"'];
            let mut sc = Scanner::new(&input);
            assert!(scan(&mut sc).is_err(), "byte {b:#x} must be rejected");
        }
    }

    #[test]
    fn test_invalid_escape_is_rejected() {
        assert!(parse_str(r#""\q""#).is_err());
        assert!(parse_str(r#""\u12""#).is_err());
    }

    #[test]
    fn test_unterminated_string() {
        let mut sc = Scanner::new(br#""abc"#);
        assert!(scan(&mut sc).is_err());
    }

    #[test]
    fn test_multibyte_passthrough() {
        assert_eq!(parse_str(r#""héllo 世界""#).unwrap(), "héllo 世界");
    }
}
