//! Millisecond tick source.
//!
//! Ticks are a wrapping `u32`, like a microcontroller's millisecond counter,
//! so every elapsed-time comparison has to survive the counter overflowing.

use std::thread;
use std::time::{Duration, Instant};

/// A millisecond clock with a cooperative delay.
pub trait Clock {
    /// Current tick count. Wraps at `u32::MAX`.
    fn now_ms(&self) -> u32;

    /// Yield for `ms` milliseconds.
    fn delay_ms(&self, ms: u32);
}

/// Milliseconds from `start` to `now`, allowing for one wrap of the counter.
pub fn elapsed_ms(start: u32, now: u32) -> u32 {
    if now >= start {
        now - start
    } else {
        now + (u32::MAX - start)
    }
}

/// Whether more than `ms` milliseconds separate `start` and `now`.
pub fn timed_out(start: u32, now: u32, ms: u32) -> bool {
    elapsed_ms(start, now) > ms
}

/// Wall clock backed by [`Instant`] and [`thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock counting from now.
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u32 {
        // Truncation is the wrap.
        self.origin.elapsed().as_millis() as u32
    }

    fn delay_ms(&self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_without_wrap() {
        assert_eq!(elapsed_ms(100, 350), 250);
        assert!(!timed_out(100, 350, 250));
        assert!(timed_out(100, 351, 250));
    }

    #[test]
    fn test_elapsed_across_wrap() {
        let start = u32::MAX - 10;
        assert_eq!(elapsed_ms(start, 5), 15);
        assert!(!timed_out(start, 5, 20));
        assert!(timed_out(start, 30, 20));
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock::new();
        let start = clock.now_ms();
        clock.delay_ms(5);
        assert!(elapsed_ms(start, clock.now_ms()) >= 5);
    }
}
