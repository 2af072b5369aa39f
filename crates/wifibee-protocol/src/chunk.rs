//! Splitting payloads into append statements.
//!
//! A payload longer than the console line limit is uploaded as a series of
//! `sb=sb.."<chunk>"` statements. Chunk boundaries never fall inside an escape
//! sequence, so every chunk is a valid string literal on its own.

use crate::constants::{APPEND_OVERHEAD, LUA_COMMAND_MAX, MIN_COMMAND_MAX};
use crate::escape::Escaped;

/// Characters a pre-escaped chunk may grow by to finish an escape (`\ddd`).
const ESCAPE_SLACK: usize = 3;

/// Splits payloads to fit a maximum command line length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    budget: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Chunker::new(LUA_COMMAND_MAX)
    }
}

impl Chunker {
    /// Create a chunker for a console accepting `max_line` characters.
    ///
    /// Limits below [`MIN_COMMAND_MAX`] are raised to it.
    pub fn new(max_line: usize) -> Self {
        Chunker {
            budget: max_line.max(MIN_COMMAND_MAX) - APPEND_OVERHEAD,
        }
    }

    /// Characters of string-literal content one chunk may carry.
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Escape `data` as text and split it.
    ///
    /// The length of each escape is counted, so no chunk exceeds the budget.
    pub fn text(&self, data: &[u8]) -> Vec<Vec<u8>> {
        self.split_escaped(data.iter().map(|&b| Escaped::text(b)))
    }

    /// Escape every byte of `data` numerically and split it.
    pub fn binary(&self, data: &[u8]) -> Vec<Vec<u8>> {
        self.split_escaped(data.iter().map(|&b| Escaped::binary(b)))
    }

    fn split_escaped(&self, escapes: impl Iterator<Item = Escaped>) -> Vec<Vec<u8>> {
        let mut chunks = Vec::new();
        let mut current = Vec::with_capacity(self.budget);

        for escaped in escapes {
            if !current.is_empty() && current.len() + escaped.len() > self.budget {
                chunks.push(std::mem::replace(
                    &mut current,
                    Vec::with_capacity(self.budget),
                ));
            }
            escaped.write_to(&mut current);
        }

        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Split text that already contains Lua escapes.
    ///
    /// A raw boundary is chosen first. If it is preceded by an odd run of
    /// backslashes the escape character is pulled into the chunk; if it falls
    /// among the digits of a decimal escape the remaining digits are. Chunks may
    /// therefore exceed the raw cut by up to three characters, which the raw cut
    /// leaves room for.
    pub fn escaped(&self, text: &[u8]) -> Vec<Vec<u8>> {
        let raw = self.budget.saturating_sub(ESCAPE_SLACK).max(1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let mut end = (start + raw).min(text.len());

            let window = &text[start..end];
            let digits = window
                .iter()
                .rev()
                .take_while(|b| b.is_ascii_digit())
                .take(3)
                .count();
            let slashes = window[..window.len() - digits]
                .iter()
                .rev()
                .take_while(|&&b| b == b'\\')
                .count();

            if slashes % 2 == 1 && end < text.len() {
                end = finish_escape(text, end, digits);
            }

            chunks.push(text[start..end].to_vec());
            start = end;
        }

        chunks
    }
}

/// Extend `end` past the escape left open before it.
///
/// `digits` is the number of decimal digits already inside the chunk.
fn finish_escape(text: &[u8], mut end: usize, mut digits: usize) -> usize {
    if digits == 0 {
        end += 1;
        if !text[end - 1].is_ascii_digit() {
            return end;
        }
        digits = 1;
    }
    while digits < 3 && end < text.len() && text[end].is_ascii_digit() {
        end += 1;
        digits += 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escape::{escape_text, unescape};

    fn decode_chunks(chunks: &[Vec<u8>]) -> Vec<u8> {
        chunks
            .iter()
            .flat_map(|c| unescape(c).expect("chunk must be a complete literal"))
            .collect()
    }

    fn awkward_payload() -> Vec<u8> {
        let mut data = Vec::new();
        for i in 0..700u32 {
            data.push(match i % 7 {
                0 => b'\\',
                1 => b'"',
                2 => b'\n',
                3 => (i % 256) as u8,
                4 => b'1',
                _ => b'x',
            });
        }
        data
    }

    #[test]
    fn test_text_chunks_reassemble() {
        let payload = awkward_payload();
        for max_line in [MIN_COMMAND_MAX, 14, 16, 64, LUA_COMMAND_MAX] {
            let chunker = Chunker::new(max_line);
            let chunks = chunker.text(&payload);
            assert!(chunks.iter().all(|c| c.len() <= chunker.budget()));
            assert_eq!(decode_chunks(&chunks), payload, "max_line {}", max_line);
        }
    }

    #[test]
    fn test_binary_chunks_reassemble() {
        let payload: Vec<u8> = (0..=255).cycle().take(1000).collect();
        for max_line in [MIN_COMMAND_MAX, 20, LUA_COMMAND_MAX] {
            let chunker = Chunker::new(max_line);
            let chunks = chunker.binary(&payload);
            assert!(chunks.iter().all(|c| c.len() <= chunker.budget()));
            assert_eq!(decode_chunks(&chunks), payload);
        }
    }

    #[test]
    fn test_escaped_chunks_never_split_escapes() {
        let payload = awkward_payload();
        let escaped = escape_text(&payload);
        for max_line in [MIN_COMMAND_MAX, 15, 17, 100, LUA_COMMAND_MAX] {
            let chunker = Chunker::new(max_line);
            let chunks = chunker.escaped(&escaped);
            assert!(chunks.iter().all(|c| c.len() <= chunker.budget()));
            assert_eq!(chunks.concat(), escaped);
            assert_eq!(decode_chunks(&chunks), payload, "max_line {}", max_line);
        }
    }

    #[test]
    fn test_escaped_boundary_extends_past_backslash() {
        // Budget 4, raw cut 1: the lone backslash drags its escape character.
        let chunker = Chunker::new(MIN_COMMAND_MAX);
        let chunks = chunker.escaped(b"\\r\\n");
        assert_eq!(chunks, vec![b"\\r".to_vec(), b"\\n".to_vec()]);

        let chunks = chunker.escaped(b"\\123x");
        assert_eq!(chunks, vec![b"\\123".to_vec(), b"x".to_vec()]);
    }

    #[test]
    fn test_escaped_boundary_inside_decimal_escape() {
        // Budget 6, raw cut 3 lands between the digits of `\123`.
        let chunker = Chunker::new(15);
        let chunks = chunker.escaped(b"a\\123b");
        assert_eq!(chunks, vec![b"a\\123".to_vec(), b"b".to_vec()]);

        // An escaped backslash followed by digits is not a decimal escape.
        let chunks = chunker.escaped(b"\\\\12345");
        assert_eq!(chunks[0], b"\\\\1".to_vec());
    }

    #[test]
    fn test_default_sizes() {
        let chunker = Chunker::default();
        assert_eq!(chunker.budget(), LUA_COMMAND_MAX - APPEND_OVERHEAD);

        let chunks = chunker.binary(&[0xAB; 200]);
        // Every byte expands to four characters.
        assert_eq!(chunks[0].len(), (chunker.budget() / 4) * 4);
        assert_eq!(chunks.len(), 4);
    }

    #[test]
    fn test_empty_payload_has_no_chunks() {
        let chunker = Chunker::default();
        assert!(chunker.text(b"").is_empty());
        assert!(chunker.escaped(b"").is_empty());
    }
}
