//! Prompt-driven I/O over the byte transport.
//!
//! Every wait is a poll loop: consume bytes while they are available, yield
//! for the poll interval while none are, and give up once the window has
//! elapsed. The window is measured on the wrapping tick counter.

use tracing::trace;
use wifibee_protocol::{Capture, Command, PromptScanner, ResponseBuffer, ScanState};

use crate::clock::{timed_out, Clock};
use crate::error::{DriverError, DriverResult};
use crate::transport::ByteTransport;

/// Label used in timeouts of [`Channel::read_char`].
const ANY_BYTE: &str = "any byte";

/// What a capture pass consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Captured {
    /// Bytes left in the buffer.
    pub stored: usize,
    /// Bytes consumed before the prompt, stored or not.
    pub payload: usize,
}

pub(crate) struct Channel<T, C> {
    transport: Option<T>,
    clock: C,
    poll_ms: u32,
}

impl<T: ByteTransport, C: Clock> Channel<T, C> {
    pub fn new(clock: C, poll_ms: u32) -> Self {
        Channel {
            transport: None,
            clock,
            poll_ms,
        }
    }

    pub fn attach(&mut self, transport: T) -> Option<T> {
        self.transport.replace(transport)
    }

    pub fn detach(&mut self) -> Option<T> {
        self.transport.take()
    }

    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    pub fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn stream(&mut self) -> DriverResult<&mut T> {
        self.transport.as_mut().ok_or(DriverError::TransportAbsent)
    }

    /// Feed incoming bytes to `on_byte` until it returns `true` or
    /// `timeout_ms` elapses. With `restart_on_data` the window restarts on
    /// every byte. Returns whether `on_byte` finished.
    fn poll<F>(&mut self, timeout_ms: u32, restart_on_data: bool, mut on_byte: F) -> DriverResult<bool>
    where
        F: FnMut(u8) -> bool,
    {
        let poll_ms = self.poll_ms;
        let transport = self.transport.as_mut().ok_or(DriverError::TransportAbsent)?;
        let clock = &self.clock;

        let mut start = clock.now_ms();
        while !timed_out(start, clock.now_ms(), timeout_ms) {
            let byte = if transport.available() > 0 {
                transport.read()
            } else {
                None
            };

            match byte {
                Some(byte) => {
                    if restart_on_data {
                        start = clock.now_ms();
                    }
                    if on_byte(byte) {
                        return Ok(true);
                    }
                }
                None => clock.delay_ms(poll_ms),
            }
        }
        Ok(false)
    }

    /// Write one command line.
    pub fn send(&mut self, command: &Command) -> DriverResult<()> {
        let stream = self.stream()?;
        trace!("Channel: >> {}", command.to_command_string());
        stream.write_all(&command.encode())?;
        stream.flush()?;
        Ok(())
    }

    /// Discard everything already received.
    pub fn flush_input(&mut self) -> DriverResult<usize> {
        let stream = self.stream()?;
        let mut count = 0;
        while stream.available() > 0 {
            if stream.read().is_none() {
                break;
            }
            count += 1;
        }
        if count > 0 {
            trace!("Channel: flushed {} bytes", count);
        }
        Ok(count)
    }

    /// Discard input for the whole window.
    pub fn skip_for_time(&mut self, ms: u32) -> DriverResult<usize> {
        let mut count = 0;
        self.poll(ms, false, |_| {
            count += 1;
            false
        })?;
        Ok(count)
    }

    /// Discard input up to and including `prompt`.
    pub fn skip_till_prompt(&mut self, prompt: &'static str, timeout_ms: u32) -> DriverResult<()> {
        let mut scanner = PromptScanner::new(prompt);
        let matched = self.poll(timeout_ms, false, |byte| {
            scanner.feed(byte) == ScanState::Matched
        })?;

        if matched {
            trace!("Channel: << {:?}", prompt);
            Ok(())
        } else {
            Err(DriverError::Timeout { prompt, timeout_ms })
        }
    }

    /// Read a single byte.
    pub fn read_char(&mut self, timeout_ms: u32) -> DriverResult<u8> {
        let mut received = None;
        self.poll(timeout_ms, false, |byte| {
            received = Some(byte);
            true
        })?;

        received.ok_or(DriverError::Timeout {
            prompt: ANY_BYTE,
            timeout_ms,
        })
    }

    /// Store input in `buffer` up to `prompt`, which is left out.
    ///
    /// On timeout the buffer holds whatever arrived, which callers should
    /// treat as unusable.
    pub fn read_till_prompt(
        &mut self,
        buffer: &mut ResponseBuffer,
        prompt: &'static str,
        timeout_ms: u32,
        restart_on_data: bool,
    ) -> DriverResult<Captured> {
        let mut capture = Capture::new(buffer, prompt);
        let matched = self.poll(timeout_ms, restart_on_data, |byte| {
            capture.push(byte) == ScanState::Matched
        })?;

        if matched {
            Ok(Captured {
                stored: capture.stored(),
                payload: capture.payload_len(),
            })
        } else {
            Err(DriverError::Timeout { prompt, timeout_ms })
        }
    }
}
