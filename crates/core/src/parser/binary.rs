//! Binary literals: `b"…"` (base64) and `x"…"` (hex).
//!
//! The scan pass validates the character set, the padding/length shape, and
//! the decoded-size bound, so the CST parser performs the same validation
//! without ever allocating the payload. Decoding happens separately.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result};
use crate::options::ParseOptions;
use crate::scanner::Scanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryEncoding {
    Base64,
    Hex,
}

/// Shape of a scanned binary literal.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScannedBinary {
    /// Content span between the quotes.
    pub(crate) content_start: usize,
    pub(crate) content_end: usize,
    pub(crate) encoding: BinaryEncoding,
}

pub(crate) fn scan(
    sc: &mut Scanner,
    encoding: BinaryEncoding,
    options: &ParseOptions,
) -> Result<ScannedBinary> {
    let start = sc.pos();
    match encoding {
        BinaryEncoding::Base64 => sc.expect_literal(b"b\"")?,
        BinaryEncoding::Hex => sc.expect_literal(b"x\"")?,
    }
    let content_start = sc.pos();

    loop {
        match sc.peek() {
            None => return Err(Error::syntax(sc.pos(), "unterminated binary literal")),
            Some(b'"') => break,
            Some(b) => {
                let valid = match encoding {
                    BinaryEncoding::Base64 => {
                        b.is_ascii_alphanumeric() || b == b'+' || b == b'/' || b == b'='
                    }
                    BinaryEncoding::Hex => b.is_ascii_hexdigit(),
                };
                if !valid {
                    return Err(Error::syntax(
                        sc.pos(),
                        match encoding {
                            BinaryEncoding::Base64 => "invalid base64 character",
                            BinaryEncoding::Hex => "invalid hex character",
                        },
                    ));
                }
                sc.bump();
            }
        }
    }

    let content_end = sc.pos();
    sc.bump(); // closing quote

    let content = sc.slice(content_start, content_end);
    let decoded_len = match encoding {
        BinaryEncoding::Base64 => {
            // Padding must align the content to whole 4-byte groups, with
            // at most two trailing `=`.
            if !content.len().is_multiple_of(4) {
                return Err(Error::syntax(content_start, "malformed base64 padding"));
            }
            let pad = content.iter().rev().take_while(|&&b| b == b'=').count();
            if pad > 2 || content.iter().take(content.len() - pad).any(|&b| b == b'=') {
                return Err(Error::syntax(content_start, "malformed base64 padding"));
            }
            content.len() / 4 * 3 - pad
        }
        BinaryEncoding::Hex => {
            if !content.len().is_multiple_of(2) {
                return Err(Error::syntax(
                    content_start,
                    "hex literal must have an even number of digits",
                ));
            }
            content.len() / 2
        }
    };

    if decoded_len > options.max_binary_bytes {
        return Err(Error::range(
            start,
            "binary literal exceeds the configured size limit",
        ));
    }

    Ok(ScannedBinary {
        content_start,
        content_end,
        encoding,
    })
}

/// Decode the payload of a scanned binary literal.
pub(crate) fn decode(src: &[u8], scanned: &ScannedBinary) -> Result<Vec<u8>> {
    let content = &src[scanned.content_start..scanned.content_end];
    match scanned.encoding {
        BinaryEncoding::Base64 => STANDARD
            .decode(content)
            .map_err(|_| Error::syntax(scanned.content_start, "invalid base64")),
        BinaryEncoding::Hex => {
            let mut bytes = Vec::with_capacity(content.len() / 2);
            for pair in content.chunks_exact(2) {
                bytes.push((nibble(pair[0]) << 4) | nibble(pair[1]));
            }
            Ok(bytes)
        }
    }
}

/// Hex digit to its value; the scan pass already validated the charset.
fn nibble(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        _ => b - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_binary(input: &str) -> Result<Vec<u8>> {
        parse_binary_with(input, &ParseOptions::default())
    }

    fn parse_binary_with(input: &str, options: &ParseOptions) -> Result<Vec<u8>> {
        let encoding = if input.starts_with('b') {
            BinaryEncoding::Base64
        } else {
            BinaryEncoding::Hex
        };
        let mut sc = Scanner::new(input.as_bytes());
        let scanned = scan(&mut sc, encoding, options)?;
        decode(sc.src(), &scanned)
    }

    #[test]
    fn test_base64_roundtrip() {
        assert_eq!(parse_binary(r#"b"SGVsbG8=""#).unwrap(), b"Hello");
        assert_eq!(parse_binary(r#"b"aR4BuA==""#).unwrap(), [0x69, 0x1E, 0x01, 0xB8]);
        assert_eq!(parse_binary(r#"b"""#).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_hex_roundtrip() {
        assert_eq!(parse_binary(r#"x"48656C6C6F""#).unwrap(), b"Hello");
        assert_eq!(parse_binary(r#"x"48656c6c6f""#).unwrap(), b"Hello");
        assert_eq!(parse_binary(r#"x"""#).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_base64_shape_errors() {
        // Length not a multiple of four, interior padding, excess padding.
        assert!(parse_binary(r#"b"SGVsbG8""#).is_err());
        assert!(parse_binary(r#"b"SG=sbG8=""#).is_err());
        assert!(parse_binary(r#"b"S===""#).is_err());
        assert!(parse_binary(r#"b"SGVs bG8=""#).is_err());
    }

    #[test]
    fn test_hex_odd_length_rejected() {
        assert!(parse_binary(r#"x"48656""#).is_err());
        assert!(parse_binary(r#"x"4g""#).is_err());
    }

    #[test]
    fn test_size_limit() {
        let options = ParseOptions {
            max_binary_bytes: 4,
            ..ParseOptions::default()
        };
        assert!(parse_binary_with(r#"x"48656c6c""#, &options).is_ok());
        let err = parse_binary_with(r#"x"48656c6c6f""#, &options).unwrap_err();
        assert!(matches!(err, Error::Range { .. }));
    }

    #[test]
    fn test_unterminated() {
        assert!(parse_binary(r#"b"SGVs"#).is_err());
    }
}
