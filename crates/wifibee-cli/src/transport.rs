//! Byte transports backed by a serial port or a TCP socket.
//!
//! Both read whatever the OS has buffered into a local queue so that
//! `available()` never blocks for longer than a millisecond.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

use serialport::SerialPort;
use tracing::{debug, trace, warn};

use crate::config::TransportConfig;
use crate::error::CliResult;

const READ_CHUNK: usize = 256;

/// Open the transport described by `config`.
pub fn open(config: &TransportConfig) -> CliResult<Box<dyn wifibee_driver::ByteTransport>> {
    match config {
        TransportConfig::Serial { path, baud } => {
            Ok(Box::new(SerialTransport::open(path, *baud)?))
        }
        TransportConfig::Tcp { address } => Ok(Box::new(TcpTransport::connect(address)?)),
    }
}

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    pending: VecDeque<u8>,
}

impl SerialTransport {
    pub fn open(path: &str, baud: u32) -> CliResult<Self> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_millis(10))
            .open()?;
        debug!("Serial: opened {} at {} baud", path, baud);
        Ok(SerialTransport {
            port,
            pending: VecDeque::new(),
        })
    }

    fn fill(&mut self) {
        let waiting = match self.port.bytes_to_read() {
            Ok(n) => n as usize,
            Err(err) => {
                warn!("Serial: bytes_to_read failed: {}", err);
                return;
            }
        };
        if waiting == 0 {
            return;
        }

        let mut buf = [0u8; READ_CHUNK];
        let len = waiting.min(READ_CHUNK);
        match self.port.read(&mut buf[..len]) {
            Ok(n) => self.pending.extend(&buf[..n]),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {}
            Err(err) => warn!("Serial: read failed: {}", err),
        }
    }
}

impl wifibee_driver::ByteTransport for SerialTransport {
    fn available(&mut self) -> usize {
        if self.pending.is_empty() {
            self.fill();
        }
        self.pending.len()
    }

    fn read(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            self.fill();
        }
        self.pending.pop_front()
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.port.flush()
    }
}

pub struct TcpTransport {
    stream: TcpStream,
    pending: VecDeque<u8>,
    closed: bool,
}

impl TcpTransport {
    pub fn connect(address: &str) -> CliResult<Self> {
        let stream = TcpStream::connect(address)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(Duration::from_millis(1)))?;
        debug!("Tcp: connected to {}", address);
        Ok(TcpTransport {
            stream,
            pending: VecDeque::new(),
            closed: false,
        })
    }

    fn fill(&mut self) {
        if self.closed {
            return;
        }

        let mut buf = [0u8; READ_CHUNK];
        match self.stream.read(&mut buf) {
            Ok(0) => {
                warn!("Tcp: bridge closed the connection");
                self.closed = true;
            }
            Ok(n) => {
                trace!("Tcp: received {} bytes", n);
                self.pending.extend(&buf[..n]);
            }
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                ) => {}
            Err(err) => {
                warn!("Tcp: read failed: {}", err);
                self.closed = true;
            }
        }
    }
}

impl wifibee_driver::ByteTransport for TcpTransport {
    fn available(&mut self) -> usize {
        if self.pending.is_empty() {
            self.fill();
        }
        self.pending.len()
    }

    fn read(&mut self) -> Option<u8> {
        if self.pending.is_empty() {
            self.fill();
        }
        self.pending.pop_front()
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
