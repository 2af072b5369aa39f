//! Error types for the WifiBee protocol.

use thiserror::Error;

/// Errors raised while encoding commands or decoding device output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// A hex read-back ended after an odd number of digits.
    #[error("odd hex digit count in read-back: {digits} digits")]
    OddHexLength {
        /// Number of digits received before the closing prompt.
        digits: usize,
    },

    /// A read-back contained a character that is not a hex digit.
    #[error("invalid hex digit {digit:?} at index {index}")]
    InvalidHexDigit {
        /// The offending character.
        digit: char,
        /// Position of the character in the read-back.
        index: usize,
    },

    /// The station status character was outside `'0'..='5'`.
    #[error("invalid station status character: 0x{0:02X}")]
    InvalidStatus(u8),

    /// No non-zero HTTP status code follows the first space of the response.
    #[error("missing HTTP status code")]
    MissingHttpCode,

    /// The response has no blank line separating headers from the body.
    #[error("missing header terminator, body cannot be located")]
    MissingBody,

    /// A string literal ended in the middle of an escape sequence.
    #[error("unterminated escape sequence")]
    UnterminatedEscape,

    /// A decimal escape does not fit in one byte.
    #[error("decimal escape out of range: \\{0}")]
    EscapeOutOfRange(u32),
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
