//! Structured errors for the parser and serializer.
//!
//! Every error carries the zero-based byte offset at which the problem was
//! detected, so editors and CLIs can point at the exact input position.

use serde::{Deserialize, Serialize};

/// Broad classification of a core error, mirroring the four error families
/// of the notation: syntax, resource/range, input-type, and value policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed surface syntax.
    Syntax,
    /// A resource bound or a numeric field range was exceeded.
    Range,
    /// The input bytes are not a decodable RDN text.
    Type,
    /// A value-level policy rejection (duplicate object keys).
    Value,
}

/// Error raised by `parse`, `parse_bytes`, or the CST parser.
///
/// The parser is fail-fast: it stops at the first error and does not
/// attempt recovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum Error {
    /// Unexpected byte, unterminated literal, invalid escape, bad shape.
    #[error("syntax error at offset {position}: {message}")]
    Syntax { position: usize, message: String },

    /// Depth limit, binary size limit, or a date/time field out of range.
    #[error("range error at offset {position}: {message}")]
    Range { position: usize, message: String },

    /// Input bytes that are neither valid UTF-8 nor valid UTF-16.
    #[error("type error at offset {position}: {message}")]
    Type { position: usize, message: String },

    /// Duplicate object key under the rejecting duplicate-key policy.
    #[error("value error at offset {position}: {message}")]
    Value { position: usize, message: String },
}

impl Error {
    pub(crate) fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn range(position: usize, message: impl Into<String>) -> Self {
        Self::Range {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn type_error(position: usize, message: impl Into<String>) -> Self {
        Self::Type {
            position,
            message: message.into(),
        }
    }

    pub(crate) fn value(position: usize, message: impl Into<String>) -> Self {
        Self::Value {
            position,
            message: message.into(),
        }
    }

    /// The error family this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Range { .. } => ErrorKind::Range,
            Self::Type { .. } => ErrorKind::Type,
            Self::Value { .. } => ErrorKind::Value,
        }
    }

    /// Zero-based byte offset at which the problem was detected.
    #[must_use]
    pub fn position(&self) -> usize {
        match self {
            Self::Syntax { position, .. }
            | Self::Range { position, .. }
            | Self::Type { position, .. }
            | Self::Value { position, .. } => *position,
        }
    }

    /// Human-readable description, without the offset prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Syntax { message, .. }
            | Self::Range { message, .. }
            | Self::Type { message, .. }
            | Self::Value { message, .. } => message,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_position() {
        let err = Error::syntax(17, "unexpected character");
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.position(), 17);
        assert_eq!(err.message(), "unexpected character");
    }

    #[test]
    fn test_display_includes_offset() {
        let err = Error::range(3, "maximum nesting depth exceeded");
        assert_eq!(
            err.to_string(),
            "range error at offset 3: maximum nesting depth exceeded"
        );
    }
}
