//! Error types for Marshal decoding.

use std::fmt;

/// A single tag byte, rendered as printable ASCII when possible and as a
/// `\xNN` escape otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagByte(pub u8);

impl fmt::Display for TagByte {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_ascii_graphic() {
            write!(f, "'{}'", self.0 as char)
        } else {
            write!(f, "\\x{:02x}", self.0)
        }
    }
}

/// Errors that can occur while decoding a Marshal stream.
///
/// Every variant carries the byte offset at which the problem was detected.
/// All errors are fatal to the decode call; there is no partial-result
/// recovery.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    #[error("truncated input at offset {offset}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("unknown tag {tag} at offset {offset}")]
    UnknownTag { offset: usize, tag: TagByte },

    #[error("unsupported tag {tag} ({construct}) at offset {offset}")]
    UnsupportedTag {
        offset: usize,
        tag: TagByte,
        construct: &'static str,
    },

    #[error("array length {len} is negative at offset {offset}")]
    ArrayDecode { offset: usize, len: i64 },

    #[error("symbol decode failed at offset {offset}: {reason}")]
    SymbolDecode { offset: usize, reason: String },

    #[error("symbol link {index} is invalid at offset {offset}")]
    SymlinkDecode { offset: usize, index: i64 },

    #[error("object link {index} is invalid at offset {offset}")]
    ObjlinkDecode { offset: usize, index: i64 },

    #[error("no decoder registered for class {class_name} at offset {offset}")]
    UnknownRegisteredClass { offset: usize, class_name: String },

    #[error("unsupported string encoding indicator {indicator} at offset {offset}")]
    UnsupportedEncoding { offset: usize, indicator: String },

    #[error("{construct} declares negative length {len} at offset {offset}")]
    NegativeLength {
        offset: usize,
        construct: &'static str,
        len: i64,
    },

    #[error("nesting depth limit {limit} exceeded at offset {offset}")]
    DepthLimit { offset: usize, limit: usize },

    #[error("decode error at offset {offset}: {message}")]
    Decode { offset: usize, message: String },

    #[error("custom decoder error: {0}")]
    Custom(String),
}

impl MarshalError {
    /// Wraps any displayable error as a custom-decoder error. Intended for
    /// decoders registered against the [`Registry`](crate::Registry).
    pub fn custom(e: impl fmt::Display) -> Self {
        Self::Custom(e.to_string())
    }
}
