//! Bounded response storage.
//!
//! Bytes read while waiting for a prompt are kept in a [`ResponseBuffer`]
//! whose capacity is fixed when it is created. Anything beyond the capacity is
//! still consumed from the stream and still counts towards prompt matching,
//! but it is not stored.

use bytes::BytesMut;

use crate::scanner::{PromptScanner, ScanState};

/// Fixed-capacity byte store with a drop-on-overflow policy.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    data: BytesMut,
    capacity: usize,
    dropped: usize,
}

impl ResponseBuffer {
    /// Create an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        ResponseBuffer {
            data: BytesMut::with_capacity(capacity),
            capacity,
            dropped: 0,
        }
    }

    /// Maximum number of bytes that can be stored.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently stored. Never exceeds the capacity.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether no bytes are stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether further pushes will be dropped.
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    /// Bytes discarded because the buffer was full, since the last clear.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// The stored bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Store one byte. Returns `false` if it was dropped.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.is_full() {
            self.dropped += 1;
            return false;
        }
        self.data.extend_from_slice(&[byte]);
        true
    }

    /// Replace the contents with `data`, dropping whatever does not fit.
    pub fn fill_from(&mut self, data: &[u8]) -> usize {
        self.clear();
        let stored = data.len().min(self.capacity);
        self.data.extend_from_slice(&data[..stored]);
        self.dropped = data.len() - stored;
        stored
    }

    /// Shorten the stored contents to `len` bytes.
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }

    /// Record bytes discarded outside of [`push`](ResponseBuffer::push).
    pub fn add_dropped(&mut self, count: usize) {
        self.dropped += count;
    }

    /// Forget the stored contents.
    pub fn clear(&mut self) {
        self.data.clear();
        self.dropped = 0;
    }
}

/// One read-until-prompt pass over a [`ResponseBuffer`].
///
/// Every byte is stored (capacity permitting) and fed to the scanner. When the
/// prompt completes, the stored length is rewound so that the prompt's own
/// bytes are excluded: `min(seen - prompt_len, capacity)`. Prompt bytes are
/// never counted as dropped.
#[derive(Debug)]
pub struct Capture<'b, 'p> {
    buffer: &'b mut ResponseBuffer,
    scanner: PromptScanner<'p>,
    seen: usize,
}

impl<'b, 'p> Capture<'b, 'p> {
    /// Start a capture. The buffer is cleared.
    pub fn new(buffer: &'b mut ResponseBuffer, prompt: &'p str) -> Self {
        buffer.clear();
        Capture {
            buffer,
            scanner: PromptScanner::new(prompt),
            seen: 0,
        }
    }

    /// Consume one byte from the stream.
    pub fn push(&mut self, byte: u8) -> ScanState {
        self.seen += 1;
        self.buffer.push(byte);

        let state = self.scanner.feed(byte);
        if state == ScanState::Matched {
            let payload = self.payload_len();
            let capacity = self.buffer.capacity();
            self.buffer.truncate(payload.min(capacity));
            self.buffer.dropped = payload.saturating_sub(capacity);
        }
        state
    }

    /// Total bytes consumed, including dropped ones.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Bytes consumed before the prompt (all of them while unmatched).
    pub fn payload_len(&self) -> usize {
        if self.scanner.is_matched() {
            self.seen - self.scanner.prompt().len()
        } else {
            self.seen
        }
    }

    /// Bytes currently stored.
    pub fn stored(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the prompt was seen.
    pub fn is_matched(&self) -> bool {
        self.scanner.is_matched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::EOF_PROMPT;

    fn capture_all(buffer: &mut ResponseBuffer, prompt: &str, data: &[u8]) -> (bool, usize) {
        let mut capture = Capture::new(buffer, prompt);
        for &b in data {
            if capture.push(b) == ScanState::Matched {
                break;
            }
        }
        (capture.is_matched(), capture.payload_len())
    }

    #[test]
    fn test_push_drops_beyond_capacity() {
        let mut buffer = ResponseBuffer::new(3);
        assert!(buffer.push(b'a'));
        assert!(buffer.push(b'b'));
        assert!(buffer.push(b'c'));
        assert!(!buffer.push(b'd'));

        assert_eq!(buffer.as_slice(), b"abc");
        assert_eq!(buffer.dropped(), 1);
        assert!(buffer.is_full());
    }

    #[test]
    fn test_capture_excludes_prompt() {
        let mut buffer = ResponseBuffer::new(64);
        let (matched, payload) = capture_all(&mut buffer, EOF_PROMPT, b"00FF0A|EOF|trailing");

        assert!(matched);
        assert_eq!(payload, 6);
        assert_eq!(buffer.as_slice(), b"00FF0A");
    }

    #[test]
    fn test_capture_truncates_to_capacity() {
        let mut buffer = ResponseBuffer::new(4);
        let (matched, payload) = capture_all(&mut buffer, "|DR|", b"0123456789|DR|");

        assert!(matched);
        assert_eq!(payload, 10);
        assert_eq!(buffer.as_slice(), b"0123");
        assert!(buffer.len() <= buffer.capacity());
        assert_eq!(buffer.dropped(), 6);
    }

    #[test]
    fn test_capture_prompt_split_across_capacity_not_dropped() {
        let mut buffer = ResponseBuffer::new(4);
        let (matched, payload) = capture_all(&mut buffer, "|DR|", b"012|DR|");

        assert!(matched);
        assert_eq!(payload, 3);
        assert_eq!(buffer.as_slice(), b"012");
        assert_eq!(buffer.dropped(), 0);
    }

    #[test]
    fn test_capture_partial_prompt_fits_capacity() {
        // Prompt bytes stored while the buffer still had room are rewound.
        let mut buffer = ResponseBuffer::new(6);
        let (matched, _) = capture_all(&mut buffer, "|DR|", b"ab|DR|");

        assert!(matched);
        assert_eq!(buffer.as_slice(), b"ab");
    }

    #[test]
    fn test_capture_unmatched_keeps_partial_data() {
        let mut buffer = ResponseBuffer::new(16);
        let (matched, payload) = capture_all(&mut buffer, EOF_PROMPT, b"ABCD|EO");

        assert!(!matched);
        assert_eq!(payload, 7);
        assert_eq!(buffer.as_slice(), b"ABCD|EO");
    }

    #[test]
    fn test_capture_clears_previous_contents() {
        let mut buffer = ResponseBuffer::new(16);
        buffer.fill_from(b"stale");

        let (matched, _) = capture_all(&mut buffer, "|C|", b"|C|");
        assert!(matched);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fill_from_counts_dropped() {
        let mut buffer = ResponseBuffer::new(2);
        assert_eq!(buffer.fill_from(&[1, 2, 3, 4]), 2);
        assert_eq!(buffer.as_slice(), &[1, 2]);
        assert_eq!(buffer.dropped(), 2);

        buffer.clear();
        assert_eq!(buffer.dropped(), 0);
    }
}
