//! Incremental prompt matching.
//!
//! The device gives no framing besides the prompt strings it prints, so every
//! response is delimited by scanning the byte stream for a known substring.
//!
//! The scanner is deliberately naive: on a mismatch the match index drops back
//! to zero and the mismatching byte is *not* re-tested against the start of the
//! prompt. A prompt whose prefix overlaps the preceding noise can therefore be
//! missed (`"aab"` inside `"aaab"`). The firmware prompts are anchored strings
//! that never overlap the surrounding output, and the device side has always
//! been driven this way, so the behavior is kept.

/// Result of feeding one byte into a [`PromptScanner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// The prompt has not been seen yet.
    Matching,
    /// The last byte completed the prompt.
    Matched,
}

/// Single-pass substring matcher, fed one byte at a time.
#[derive(Debug, Clone)]
pub struct PromptScanner<'a> {
    prompt: &'a [u8],
    index: usize,
}

impl<'a> PromptScanner<'a> {
    /// Create a scanner looking for `prompt`.
    pub fn new(prompt: &'a str) -> Self {
        PromptScanner {
            prompt: prompt.as_bytes(),
            index: 0,
        }
    }

    /// The prompt being searched for.
    pub fn prompt(&self) -> &'a [u8] {
        self.prompt
    }

    /// Number of prompt bytes matched so far.
    pub fn progress(&self) -> usize {
        self.index
    }

    /// Consume one byte.
    ///
    /// Once `Matched` is returned the scanner stays matched until [`reset`]
    /// is called.
    ///
    /// [`reset`]: PromptScanner::reset
    pub fn feed(&mut self, byte: u8) -> ScanState {
        if self.index < self.prompt.len() {
            if byte == self.prompt[self.index] {
                self.index += 1;
            } else {
                self.index = 0;
            }
        }

        if self.is_matched() {
            ScanState::Matched
        } else {
            ScanState::Matching
        }
    }

    /// Whether the full prompt has been seen.
    pub fn is_matched(&self) -> bool {
        self.index == self.prompt.len()
    }

    /// Restart the search from scratch.
    pub fn reset(&mut self) {
        self.index = 0;
    }
}
