//! Error types for grommet-json operations.

use thiserror::Error;

/// The error type for decoding JSON text.
///
/// Every variant carries the byte offset at which the problem was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended while a value was still expected.
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEnd {
        /// Byte offset of the end of input.
        offset: usize,
    },

    /// A token appeared where the grammar does not allow it.
    #[error("unexpected {found} at byte {offset}, expected {expected}")]
    UnexpectedToken {
        /// Description of the token that was found.
        found: String,
        /// Description of what the decoder was looking for.
        expected: &'static str,
        /// Byte offset of the token.
        offset: usize,
    },

    /// A bare word that is neither a number nor `true`/`false`/`null`.
    #[error("invalid literal '{literal}' at byte {offset}")]
    InvalidLiteral {
        /// The offending text.
        literal: String,
        /// Byte offset of the literal.
        offset: usize,
    },

    /// A backslash escape that JSON does not define.
    #[error("invalid escape sequence at byte {offset}")]
    InvalidEscape {
        /// Byte offset of the backslash.
        offset: usize,
    },

    /// A string literal without its closing quote.
    #[error("unterminated string starting at byte {offset}")]
    UnterminatedString {
        /// Byte offset of the opening quote.
        offset: usize,
    },

    /// Containers nested deeper than [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[error("nesting deeper than {limit} levels at byte {offset}")]
    TooDeep {
        /// The configured nesting limit.
        limit: usize,
        /// Byte offset of the container that crossed the limit.
        offset: usize,
    },

    /// Non-whitespace text after the top-level value.
    #[error("trailing characters at byte {offset}")]
    TrailingCharacters {
        /// Byte offset of the first trailing character.
        offset: usize,
    },
}

impl DecodeError {
    /// Byte offset at which the error was detected.
    #[must_use]
    pub fn offset(&self) -> usize {
        match self {
            Self::UnexpectedEnd { offset }
            | Self::UnexpectedToken { offset, .. }
            | Self::InvalidLiteral { offset, .. }
            | Self::InvalidEscape { offset }
            | Self::UnterminatedString { offset }
            | Self::TooDeep { offset, .. }
            | Self::TrailingCharacters { offset } => *offset,
        }
    }
}

/// A specialized Result type for grommet-json operations.
pub type Result<T> = std::result::Result<T, DecodeError>;
