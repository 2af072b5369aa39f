//! A scripted NodeMCU console.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use wifibee_driver::mock::{FakeClock, MockPower, ScriptedTransport};
use wifibee_driver::{Credentials, DriverConfig, Session};
use wifibee_protocol::{
    encode_hex, unescape, Command, ALIVE_COMMAND, READ_BACK_COMMAND, STATUS_COMMAND,
};

/// Turns a transmitted payload into reply packets.
pub type Peer = Box<dyn FnMut(&[u8]) -> Vec<Vec<u8>>>;

pub struct NodeMcu {
    /// Status digits reported in order; the last one repeats.
    pub statuses: VecDeque<u8>,
    /// Never answer status queries.
    pub mute_status: bool,
    /// Drop the last hex digit of every read-back.
    pub odd_readback: bool,
    /// Payloads handed to `wifiConn:send`.
    pub sent: Vec<Vec<u8>>,
    /// Peer the connection object talks to.
    pub peer: Option<Peer>,
    send_buffer: Vec<u8>,
    last_data: Option<Vec<u8>>,
}

impl NodeMcu {
    pub fn new() -> Self {
        NodeMcu {
            statuses: VecDeque::from(vec![b'1', b'5']),
            mute_status: false,
            odd_readback: false,
            sent: Vec::new(),
            peer: None,
            send_buffer: Vec::new(),
            last_data: None,
        }
    }

    /// Reply to every payload with `reply`.
    pub fn answering(reply: &[u8]) -> Self {
        let reply = reply.to_vec();
        let mut mcu = NodeMcu::new();
        mcu.peer = Some(Box::new(move |_| vec![reply.clone()]));
        mcu
    }

    fn next_status(&mut self) -> u8 {
        if self.statuses.len() > 1 {
            self.statuses.pop_front().unwrap_or(b'1')
        } else {
            self.statuses.front().copied().unwrap_or(b'1')
        }
    }

    pub fn respond(&mut self, line: &str) -> Vec<u8> {
        let mut out = line.as_bytes().to_vec();
        out.extend_from_slice(b"\r\n");

        let transmit = Command::TransmitSendBuffer.to_command_string();

        if line == ALIVE_COMMAND {
            out.extend_from_slice(b"OK\r\n> ");
        } else if line == STATUS_COMMAND {
            if !self.mute_status {
                let digit = self.next_status();
                out.extend_from_slice(b"|STS|");
                out.push(digit);
                out.extend_from_slice(b"|\r\n> ");
            }
        } else if line.starts_with("wifiConn:connect(") {
            out.extend_from_slice(b"> |C|");
        } else if line == "wifiConn:close()" {
            out.extend_from_slice(b"> |DC|");
        } else if line == "sb=\"\"" {
            self.send_buffer.clear();
            out.extend_from_slice(b"> ");
        } else if let Some(literal) = line
            .strip_prefix("sb=sb..\"")
            .and_then(|rest| rest.strip_suffix('"'))
        {
            let chunk = unescape(literal.as_bytes()).unwrap();
            self.send_buffer.extend_from_slice(&chunk);
            out.extend_from_slice(b"> ");
        } else if line == transmit {
            let payload = std::mem::take(&mut self.send_buffer);
            out.extend_from_slice(b"> |DS|");
            let packets = match self.peer.as_mut() {
                Some(peer) => peer(&payload),
                None => Vec::new(),
            };
            self.sent.push(payload);
            for packet in packets {
                out.extend_from_slice(format!("{}|DR|\r\n", packet.len()).as_bytes());
                if self.last_data.is_none() {
                    self.last_data = Some(packet);
                }
            }
        } else if line == READ_BACK_COMMAND {
            let mut digits = encode_hex(&self.last_data.take().unwrap_or_default());
            if self.odd_readback {
                digits.pop();
            }
            out.extend_from_slice(b"|SOF|");
            out.extend_from_slice(digits.as_bytes());
            out.extend_from_slice(b"|EOF|\r\n> ");
        } else {
            out.extend_from_slice(b"> ");
        }

        out
    }
}

pub struct Rig {
    pub session: Session<ScriptedTransport, FakeClock>,
    pub mcu: Rc<RefCell<NodeMcu>>,
    pub clock: FakeClock,
    pub power: MockPower,
}

pub fn config() -> DriverConfig {
    DriverConfig::with_credentials(Credentials::new("lab", "secret"))
}

pub fn rig_with(mcu: NodeMcu, config: DriverConfig, start: u32) -> Rig {
    let mcu = Rc::new(RefCell::new(mcu));
    let console = Rc::clone(&mcu);
    let transport =
        ScriptedTransport::with_responder(move |line| console.borrow_mut().respond(line));

    let clock = FakeClock::new(start);
    // Already on, so power-up goes through the aliveness probe.
    let power = MockPower::new(true);
    let session = Session::new(config, clock.clone(), Box::new(power.clone()))
        .unwrap()
        .with_transport(transport);

    Rig {
        session,
        mcu,
        clock,
        power,
    }
}

pub fn rig(mcu: NodeMcu) -> Rig {
    rig_with(mcu, config(), 0)
}
