//! Deterministic collaborators for tests.
//!
//! [`ScriptedTransport`] hands every complete command line to a responder
//! closure and queues whatever it returns as input, which is enough to
//! emulate the Lua console. [`FakeClock`] only moves when the driver yields,
//! so timeouts are exact. [`MockPower`] records power switching.

use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use crate::clock::Clock;
use crate::power::PowerControl;
use crate::transport::ByteTransport;

/// Produces the console's reaction to one command line (without CRLF).
pub type Responder = Box<dyn FnMut(&str) -> Vec<u8>>;

/// In-memory transport driven by a responder.
pub struct ScriptedTransport {
    rx: VecDeque<u8>,
    line: Vec<u8>,
    lines: Vec<String>,
    unread: Vec<usize>,
    responder: Option<Responder>,
}

impl ScriptedTransport {
    /// A transport that never answers on its own.
    pub fn new() -> Self {
        ScriptedTransport {
            rx: VecDeque::new(),
            line: Vec::new(),
            lines: Vec::new(),
            unread: Vec::new(),
            responder: None,
        }
    }

    /// A transport that answers each written line through `responder`.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&str) -> Vec<u8> + 'static,
    {
        ScriptedTransport {
            responder: Some(Box::new(responder)),
            ..Self::new()
        }
    }

    /// Queue bytes as if the device had sent them.
    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend(data);
    }

    /// Bytes queued but not yet read.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Every complete line written so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Bytes still queued when each line was written, one entry per line.
    pub fn unread_at_write(&self) -> &[usize] {
        &self.unread
    }

    fn complete_line(&mut self) {
        self.line.truncate(self.line.len() - 2);
        let line = String::from_utf8_lossy(&self.line).into_owned();
        self.line.clear();
        self.unread.push(self.rx.len());

        if let Some(responder) = self.responder.as_mut() {
            let reply = responder(&line);
            self.rx.extend(reply);
        }
        self.lines.push(line);
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteTransport for ScriptedTransport {
    fn available(&mut self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        for &byte in data {
            self.line.push(byte);
            if self.line.ends_with(b"\r\n") {
                self.complete_line();
            }
        }
        Ok(())
    }
}

/// Clock that advances only through [`Clock::delay_ms`] or by hand.
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<u32>>,
}

impl FakeClock {
    /// Create a clock reading `start`.
    pub fn new(start: u32) -> Self {
        FakeClock {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Current reading.
    pub fn now(&self) -> u32 {
        self.now.get()
    }

    /// Move the clock forward, wrapping like a tick counter.
    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u32 {
        self.now()
    }

    fn delay_ms(&self, ms: u32) {
        self.advance(ms);
    }
}

#[derive(Debug, Default)]
struct PowerLog {
    on: Cell<bool>,
    on_calls: Cell<usize>,
    off_calls: Cell<usize>,
}

/// Power controller that records calls. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct MockPower {
    log: Rc<PowerLog>,
}

impl MockPower {
    /// Create a controller whose module starts on or off.
    pub fn new(initially_on: bool) -> Self {
        let power = MockPower::default();
        power.log.on.set(initially_on);
        power
    }

    /// Number of `on()` calls.
    pub fn on_calls(&self) -> usize {
        self.log.on_calls.get()
    }

    /// Number of `off()` calls.
    pub fn off_calls(&self) -> usize {
        self.log.off_calls.get()
    }
}

impl PowerControl for MockPower {
    fn on(&mut self) {
        self.log.on.set(true);
        self.log.on_calls.set(self.log.on_calls.get() + 1);
    }

    fn off(&mut self) {
        self.log.on.set(false);
        self.log.off_calls.set(self.log.off_calls.get() + 1);
    }

    fn is_on(&self) -> bool {
        self.log.on.get()
    }
}
