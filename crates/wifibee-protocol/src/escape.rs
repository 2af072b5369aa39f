//! Lua string-literal escaping.
//!
//! Outbound payloads are carried inside double-quoted Lua string literals.
//! Text mode uses the two-character escapes of the Lua lexer for control
//! characters and metacharacters and a zero-padded decimal escape (`\ddd`) for
//! any other byte outside printable ASCII. Binary mode escapes every byte as
//! `\<decimal>`; the next character is always another backslash, so padding is
//! not needed there.

use crate::error::{ProtocolError, ProtocolResult};

/// How one raw byte is written inside a string literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escaped {
    /// Printable byte written as-is.
    Literal(u8),
    /// Backslash followed by this character.
    Pair(u8),
    /// Backslash followed by exactly three decimal digits.
    PaddedDecimal(u8),
    /// Backslash followed by the shortest decimal representation.
    Decimal(u8),
}

impl Escaped {
    /// Escape a byte of text.
    pub fn text(byte: u8) -> Self {
        match byte {
            0x07 => Escaped::Pair(b'a'),
            0x08 => Escaped::Pair(b'b'),
            0x0C => Escaped::Pair(b'f'),
            b'\n' => Escaped::Pair(b'n'),
            b'\r' => Escaped::Pair(b'r'),
            b'\t' => Escaped::Pair(b't'),
            0x0B => Escaped::Pair(b'v'),
            b'\\' | b'"' | b'\'' | b'[' | b']' => Escaped::Pair(byte),
            0x20..=0x7E => Escaped::Literal(byte),
            _ => Escaped::PaddedDecimal(byte),
        }
    }

    /// Escape a byte of binary data.
    pub fn binary(byte: u8) -> Self {
        Escaped::Decimal(byte)
    }

    /// Number of characters this escape occupies on the command line.
    pub fn len(&self) -> usize {
        match self {
            Escaped::Literal(_) => 1,
            Escaped::Pair(_) => 2,
            Escaped::PaddedDecimal(_) => 4,
            Escaped::Decimal(b) if *b >= 100 => 4,
            Escaped::Decimal(b) if *b >= 10 => 3,
            Escaped::Decimal(_) => 2,
        }
    }

    /// Append the escaped form to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        match *self {
            Escaped::Literal(b) => out.push(b),
            Escaped::Pair(c) => out.extend_from_slice(&[b'\\', c]),
            Escaped::PaddedDecimal(b) => out.extend_from_slice(format!("\\{:03}", b).as_bytes()),
            Escaped::Decimal(b) => out.extend_from_slice(format!("\\{}", b).as_bytes()),
        }
    }
}

/// Escape text for a Lua string literal.
pub fn escape_text(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &b in data {
        Escaped::text(b).write_to(&mut out);
    }
    out
}

/// Escape every byte numerically.
pub fn escape_binary(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * 4);
    for &b in data {
        Escaped::binary(b).write_to(&mut out);
    }
    out
}

/// Decode the body of a Lua string literal the way the firmware's lexer does.
///
/// Decimal escapes take up to three digits. Any other escaped character stands
/// for itself, except the named control escapes.
pub fn unescape(literal: &[u8]) -> ProtocolResult<Vec<u8>> {
    let mut out = Vec::with_capacity(literal.len());
    let mut iter = literal.iter().copied().peekable();

    while let Some(b) = iter.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }

        let c = iter.next().ok_or(ProtocolError::UnterminatedEscape)?;
        let decoded = match c {
            b'a' => 0x07,
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0B,
            b'0'..=b'9' => {
                let mut value = u32::from(c - b'0');
                for _ in 0..2 {
                    match iter.peek() {
                        Some(d) if d.is_ascii_digit() => {
                            value = value * 10 + u32::from(d - b'0');
                            iter.next();
                        }
                        _ => break,
                    }
                }
                u8::try_from(value).map_err(|_| ProtocolError::EscapeOutOfRange(value))?
            }
            other => other,
        };
        out.push(decoded);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_escapes() {
        assert_eq!(escape_text(b"a\"b"), b"a\\\"b".to_vec());
        assert_eq!(escape_text(b"\r\n\t"), b"\\r\\n\\t".to_vec());
        assert_eq!(escape_text(b"[x]"), b"\\[x\\]".to_vec());
        assert_eq!(escape_text(b"\\"), b"\\\\".to_vec());
        assert_eq!(escape_text(b"it's"), b"it\\'s".to_vec());
    }

    #[test]
    fn test_unprintable_text_uses_padded_decimal() {
        assert_eq!(escape_text(&[0x01, b'2']), b"\\0012".to_vec());
        assert_eq!(escape_text(&[0xC3, 0xA9]), b"\\195\\169".to_vec());
        assert_eq!(unescape(b"\\0012").unwrap(), vec![0x01, b'2']);
    }

    #[test]
    fn test_binary_escapes() {
        assert_eq!(escape_binary(&[0, 10, 255]), b"\\0\\10\\255".to_vec());
        for b in [0u8, 9, 10, 99, 100, 255] {
            let mut out = Vec::new();
            Escaped::binary(b).write_to(&mut out);
            assert_eq!(out.len(), Escaped::binary(b).len());
        }
    }

    #[test]
    fn test_text_round_trip() {
        let data: Vec<u8> = (0..=255).collect();
        assert_eq!(unescape(&escape_text(&data)).unwrap(), data);
        assert_eq!(unescape(&escape_binary(&data)).unwrap(), data);
    }

    #[test]
    fn test_unescape_errors() {
        assert_eq!(unescape(b"abc\\"), Err(ProtocolError::UnterminatedEscape));
        assert_eq!(unescape(b"\\256"), Err(ProtocolError::EscapeOutOfRange(256)));
    }
}
