//! Regex literals.
//!
//! Slash-delimited, with backslash escaping the next byte (including `/`).
//! The source text between the slashes is stored verbatim, escapes and
//! all; the core never compiles the pattern.

use crate::error::{Error, Result};
use crate::scanner::Scanner;

const FLAGS: &[u8] = b"dgimsuvy";

/// Source and flags of a scanned regex literal.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScannedRegex {
    pub(crate) source: String,
    pub(crate) flags: String,
}

pub(crate) fn scan(sc: &mut Scanner) -> Result<ScannedRegex> {
    sc.expect(b'/')?;
    let source_start = sc.pos();

    loop {
        match sc.peek() {
            None => {
                return Err(Error::syntax(sc.pos(), "unterminated regular expression"));
            }
            Some(b'/') => break,
            Some(b'\\') => {
                sc.bump();
                if sc.eof() {
                    return Err(Error::syntax(sc.pos(), "unterminated regular expression"));
                }
                sc.bump();
            }
            Some(_) => sc.bump(),
        }
    }

    let source = std::str::from_utf8(sc.slice(source_start, sc.pos()))
        .map_err(|_| Error::syntax(source_start, "invalid UTF-8 in regular expression"))?
        .to_string();
    sc.bump(); // closing slash

    let mut flags = String::new();
    let mut seen = [false; 8];
    while let Some(b) = sc.peek() {
        let Some(index) = FLAGS.iter().position(|&f| f == b) else {
            break;
        };
        if seen[index] {
            return Err(Error::syntax(
                sc.pos(),
                format!("duplicate regular expression flag '{}'", b as char),
            ));
        }
        seen[index] = true;
        flags.push(b as char);
        sc.bump();
    }

    Ok(ScannedRegex { source, flags })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_regex(input: &str) -> Result<(String, String)> {
        let mut sc = Scanner::new(input.as_bytes());
        scan(&mut sc).map(|r| (r.source, r.flags))
    }

    #[test]
    fn test_basic_regex() {
        assert_eq!(
            parse_regex("/ab+/gi").unwrap(),
            ("ab+".to_string(), "gi".to_string())
        );
    }

    #[test]
    fn test_escaped_slash_stays_in_source() {
        assert_eq!(
            parse_regex(r"/a\/b/").unwrap(),
            (r"a\/b".to_string(), String::new())
        );
    }

    #[test]
    fn test_all_flags() {
        assert_eq!(parse_regex("/x/dgimsuvy").unwrap().1, "dgimsuvy");
    }

    #[test]
    fn test_duplicate_flag_rejected() {
        assert!(parse_regex("/x/gg").is_err());
    }

    #[test]
    fn test_unterminated() {
        assert!(parse_regex("/abc").is_err());
        assert!(parse_regex(r"/abc\/").is_err());
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse_regex("//").unwrap(), (String::new(), String::new()));
    }
}
