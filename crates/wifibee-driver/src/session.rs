//! The session driver.
//!
//! A [`Session`] owns the transport, the response buffer and the connection
//! state. Every public operation is a blocking sequence of commands, each
//! gated on a prompt, and fails on the first prompt that does not arrive.

use tracing::{debug, trace, warn};
use wifibee_protocol::{
    decode_readback, Chunker, Command, ConnectionKind, ResponseBuffer, SocketEvent,
    StationStatus, DEVICE_TYPE, EOF_PROMPT, LUA_PROMPT, RECEIVED_PROMPT, SENT_PROMPT,
};

use crate::channel::Channel;
use crate::clock::{timed_out, Clock};
use crate::config::{Credentials, DriverConfig, Timeouts};
use crate::error::{DriverError, DriverResult};
use crate::power::PowerControl;
use crate::state::ConnectionState;
use crate::transport::ByteTransport;

/// Driver for one WifiBee.
pub struct Session<T, C> {
    pub(crate) channel: Channel<T, C>,
    power: Box<dyn PowerControl>,
    credentials: Credentials,
    pub(crate) timeouts: Timeouts,
    pub(crate) chunker: Chunker,
    pub(crate) buffer: ResponseBuffer,
    scratch: ResponseBuffer,
    state: ConnectionState,
}

impl<T: ByteTransport, C: Clock> Session<T, C> {
    /// Create a session with no transport attached.
    pub fn new(config: DriverConfig, clock: C, power: Box<dyn PowerControl>) -> DriverResult<Self> {
        config.validate()?;

        Ok(Session {
            channel: Channel::new(clock, config.timeouts.poll_interval),
            power,
            credentials: config.credentials,
            timeouts: config.timeouts,
            chunker: Chunker::default(),
            buffer: ResponseBuffer::new(config.buffer_capacity),
            // Room for two hex digits per stored byte.
            scratch: ResponseBuffer::new(config.buffer_capacity.saturating_mul(2)),
            state: ConnectionState::PoweredOff,
        })
    }

    /// Attach the transport, builder style.
    pub fn with_transport(mut self, transport: T) -> Self {
        self.channel.attach(transport);
        self
    }

    /// Attach a transport, returning the previous one.
    pub fn attach(&mut self, transport: T) -> Option<T> {
        self.channel.attach(transport)
    }

    /// Detach the transport.
    pub fn detach(&mut self) -> Option<T> {
        self.channel.detach()
    }

    /// The attached transport.
    pub fn transport(&self) -> Option<&T> {
        self.channel.transport()
    }

    /// The attached transport, mutably.
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.channel.transport_mut()
    }

    /// Replace the network credentials.
    pub fn connection_settings(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    /// The network credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Module name.
    pub fn device_type(&self) -> &'static str {
        DEVICE_TYPE
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// The last response read back.
    pub fn response(&self) -> &ResponseBuffer {
        &self.buffer
    }

    /// Whether the power controller reports the module as on.
    pub fn is_on(&self) -> bool {
        self.power.is_on()
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!("Session: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    fn require_transport(&self) -> DriverResult<()> {
        if self.channel.is_attached() {
            Ok(())
        } else {
            Err(DriverError::TransportAbsent)
        }
    }

    /// Send a command and wait for the prompt that completes it.
    pub(crate) fn command(&mut self, command: &Command, timeout_ms: u32) -> DriverResult<()> {
        self.channel.send(command)?;
        self.channel
            .skip_till_prompt(command.expected_prompt(), timeout_ms)
    }

    // ========== Stream helpers ==========

    /// Discard pending input. Returns the number of bytes discarded.
    pub fn flush_input(&mut self) -> DriverResult<usize> {
        self.channel.flush_input()
    }

    /// Discard input for `ms` milliseconds. Returns the number of bytes
    /// discarded.
    pub fn skip_for_time(&mut self, ms: u32) -> DriverResult<usize> {
        self.channel.skip_for_time(ms)
    }

    /// Read one byte, waiting at most `ms` milliseconds.
    pub fn read_char(&mut self, ms: u32) -> DriverResult<u8> {
        self.channel.read_char(ms)
    }

    // ========== Power ==========

    /// Switch the module on and wait for its console.
    ///
    /// A module that is already on does not print a boot prompt, so the
    /// aliveness probe is used instead. The probe also covers a missed boot
    /// prompt. If it fails too, the module is switched off again.
    pub fn on(&mut self) -> DriverResult<()> {
        self.require_transport()?;

        let mut booted = false;
        if !self.power.is_on() {
            debug!("Session: power on");
            self.power.on();
            self.set_state(ConnectionState::PoweringOn);
            booted = self
                .channel
                .skip_till_prompt(LUA_PROMPT, self.timeouts.wake)
                .is_ok();
        }

        if !booted {
            if let Err(err) = self.is_alive() {
                warn!("Session: module not responding: {}", err);
                self.off();
                return Err(err);
            }
        }

        if !self.state.is_ready() {
            self.set_state(ConnectionState::Idle);
        }
        Ok(())
    }

    /// Switch the module off, whatever it is doing.
    pub fn off(&mut self) {
        debug!("Session: power off");
        self.power.off();
        self.set_state(ConnectionState::PoweredOff);
    }

    /// Probe the console with a command whose reply is fixed.
    pub fn is_alive(&mut self) -> DriverResult<()> {
        self.command(&Command::AliveProbe, self.timeouts.response)
    }

    // ========== Station ==========

    /// Join the configured network.
    pub fn connect(&mut self) -> DriverResult<()> {
        self.require_transport()?;
        if !self.state.is_ready() {
            return Err(DriverError::InvalidState {
                operation: "join network",
                state: self.state,
            });
        }

        self.set_state(ConnectionState::Joining);
        let timeout = self.timeouts.wifi_connect;
        let status = match self.join() {
            Ok(()) => self.wait_for_ip(timeout),
            Err(err) => Err(err),
        };

        match status {
            Ok(StationStatus::GotIp) => {
                debug!("Session: joined {:?}", self.credentials.ssid);
                self.set_state(ConnectionState::Joined);
                Ok(())
            }
            Ok(status) => {
                warn!("Session: failed to connect: {}", status.failure_reason());
                self.set_state(ConnectionState::Idle);
                Err(DriverError::JoinFailed(status))
            }
            Err(err) => {
                self.set_state(ConnectionState::Idle);
                Err(err)
            }
        }
    }

    fn join(&mut self) -> DriverResult<()> {
        let timeout = self.timeouts.response;
        self.command(&Command::SetStationMode, timeout)?;
        self.command(
            &Command::ConfigureStation {
                ssid: self.credentials.ssid.clone(),
                password: self.credentials.password.clone(),
            },
            timeout,
        )?;
        self.command(&Command::JoinNetwork, timeout)
    }

    /// Leave the network.
    pub fn disconnect(&mut self) -> DriverResult<()> {
        self.command(&Command::LeaveNetwork, self.timeouts.response)?;
        if self.state.is_joined() {
            self.set_state(ConnectionState::Idle);
        }
        Ok(())
    }

    /// Query the station status.
    pub fn station_status(&mut self) -> DriverResult<StationStatus> {
        let timeout = self.timeouts.response;
        self.command(&Command::QueryStatus, timeout)?;
        let digit = self.channel.read_char(timeout)?;
        self.channel.skip_till_prompt(LUA_PROMPT, timeout)?;
        Ok(StationStatus::from_digit(digit)?)
    }

    /// Poll the station status until it leaves `Connecting` or `ms`
    /// milliseconds have passed. Returns the last status seen.
    ///
    /// Failed queries leave the last status in place; only transport write
    /// errors end the loop early.
    pub fn wait_for_ip(&mut self, ms: u32) -> DriverResult<StationStatus> {
        let mut status = StationStatus::Connecting;
        let start = self.channel.clock().now_ms();

        while status == StationStatus::Connecting
            && !timed_out(start, self.channel.clock().now_ms(), ms)
        {
            self.channel.skip_for_time(self.timeouts.status_poll)?;
            match self.station_status() {
                Ok(polled) => {
                    trace!("Session: station status {}", polled);
                    status = polled;
                }
                Err(err @ DriverError::Io(_)) | Err(err @ DriverError::TransportAbsent) => {
                    return Err(err)
                }
                Err(err) => debug!("Session: status query failed: {}", err),
            }
        }

        Ok(status)
    }

    // ========== Connection ==========

    /// Power on, join the network and connect to a peer.
    pub fn open(&mut self, server: &str, port: u16, kind: ConnectionKind) -> DriverResult<()> {
        self.on()?;
        self.connect()?;

        let timeout = self.timeouts.response;
        self.command(&Command::CreateConnection { kind }, timeout)?;
        for event in SocketEvent::ALL {
            self.command(&Command::RegisterCallback { event }, timeout)?;
        }
        self.command(
            &Command::ConnectPeer {
                server: server.to_string(),
                port,
            },
            self.timeouts.server_connect,
        )?;

        debug!("Session: connected to {}:{} over {}", server, port, kind.as_lua());
        self.set_state(ConnectionState::SocketOpen);
        Ok(())
    }

    /// Open a TCP connection.
    pub fn open_tcp(&mut self, server: &str, port: u16) -> DriverResult<()> {
        self.open(server, port, ConnectionKind::Tcp)
    }

    /// Open a UDP connection.
    pub fn open_udp(&mut self, server: &str, port: u16) -> DriverResult<()> {
        self.open(server, port, ConnectionKind::Udp)
    }

    /// Close the connection object and keep the network.
    ///
    /// The state returns to `Joined` even if the disconnect prompt never
    /// arrives, since the peer may already have closed the connection.
    pub fn close_socket(&mut self) -> DriverResult<()> {
        let result = self.command(&Command::CloseConnection, self.timeouts.server_disconnect);
        if self.state == ConnectionState::SocketOpen {
            self.set_state(ConnectionState::Joined);
        }
        result
    }

    /// Close the connection and switch the module off.
    pub fn close(&mut self) -> DriverResult<()> {
        let result = self.close_socket();
        self.off();
        result
    }

    // ========== Send ==========

    /// Send text over the open connection.
    ///
    /// With `wait_for_response` the first reply packet is read back into the
    /// response buffer; if none arrives the buffer is left empty.
    pub fn send_ascii(&mut self, data: &[u8], wait_for_response: bool) -> DriverResult<()> {
        self.require_socket("send")?;
        let chunks = self.chunker.text(data);
        self.transmit(chunks, wait_for_response)
    }

    /// Send arbitrary bytes over the open connection.
    pub fn send_binary(&mut self, data: &[u8], wait_for_response: bool) -> DriverResult<()> {
        self.require_socket("send")?;
        let chunks = self.chunker.binary(data);
        self.transmit(chunks, wait_for_response)
    }

    fn require_socket(&self, operation: &'static str) -> DriverResult<()> {
        self.require_transport()?;
        if self.state == ConnectionState::SocketOpen {
            Ok(())
        } else {
            Err(DriverError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    /// Fill the remote send buffer with escaped chunks and send it. Waits
    /// for the sent prompt.
    pub(crate) fn upload(&mut self, chunks: Vec<Vec<u8>>) -> DriverResult<()> {
        let timeout = self.timeouts.response;
        self.command(&Command::CreateSendBuffer, timeout)?;
        trace!("Session: uploading {} chunks", chunks.len());
        for chunk in chunks {
            self.command(&Command::AppendSendBuffer { chunk }, timeout)?;
        }
        self.command(&Command::TransmitSendBuffer, timeout)?;
        self.channel.skip_till_prompt(SENT_PROMPT, timeout)
    }

    /// Wait for the first reply packet. Returns `false` if none arrived.
    pub(crate) fn await_reply(&mut self) -> DriverResult<bool> {
        match self
            .channel
            .skip_till_prompt(RECEIVED_PROMPT, self.timeouts.server_response)
        {
            Ok(()) => Ok(true),
            Err(err) if err.is_timeout() => {
                debug!("Session: no reply from peer");
                self.buffer.clear();
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    fn transmit(&mut self, chunks: Vec<Vec<u8>>, wait_for_response: bool) -> DriverResult<()> {
        self.upload(chunks)?;
        if wait_for_response && self.await_reply()? {
            self.read_server_response()?;
        }
        Ok(())
    }

    // ========== Read-back ==========

    /// Fetch the stored reply packet into the response buffer.
    ///
    /// The packet arrives as hex pairs; the inactivity window restarts with
    /// every digit. The ready prompt that follows is consumed before
    /// returning. Returns the number of bytes stored.
    pub fn read_server_response(&mut self) -> DriverResult<usize> {
        // Rest of the receive notification line.
        self.channel.flush_input()?;
        self.command(&Command::ReadBack, self.timeouts.response)?;

        let captured = match self.channel.read_till_prompt(
            &mut self.scratch,
            EOF_PROMPT,
            self.timeouts.readback,
            true,
        ) {
            Ok(captured) => captured,
            Err(err) => {
                self.buffer.clear();
                return Err(err);
            }
        };

        // The console prints its ready prompt once the script has finished.
        if let Err(err) = self
            .channel
            .skip_till_prompt(LUA_PROMPT, self.timeouts.response)
        {
            self.buffer.clear();
            return Err(err);
        }

        let decoded = match decode_readback(self.scratch.as_slice(), captured.payload) {
            Ok(decoded) => decoded,
            Err(err) => {
                self.buffer.clear();
                return Err(err.into());
            }
        };

        self.buffer.fill_from(&decoded);
        self.buffer
            .add_dropped(captured.payload / 2 - decoded.len());
        if self.buffer.dropped() > 0 {
            debug!(
                "Session: reply truncated, {} bytes dropped",
                self.buffer.dropped()
            );
        }

        trace!(
            "Session: read back {} bytes from {} digits",
            self.buffer.len(),
            captured.stored
        );
        Ok(self.buffer.len())
    }

    /// Copy the response into `out`. Returns the number of bytes copied.
    pub fn read_response_binary(&self, out: &mut [u8]) -> DriverResult<usize> {
        if self.buffer.is_empty() {
            return Err(DriverError::NoResponse);
        }
        let count = out.len().min(self.buffer.len());
        out[..count].copy_from_slice(&self.buffer.as_slice()[..count]);
        Ok(count)
    }

    /// The response as text, at most `max_len` bytes of it.
    pub fn read_response_ascii(&self, max_len: usize) -> DriverResult<String> {
        if self.buffer.is_empty() {
            return Err(DriverError::NoResponse);
        }
        let count = max_len.min(self.buffer.len());
        Ok(String::from_utf8_lossy(&self.buffer.as_slice()[..count]).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FakeClock, MockPower, ScriptedTransport};

    fn session(power: MockPower) -> Session<ScriptedTransport, FakeClock> {
        Session::new(DriverConfig::default(), FakeClock::new(0), Box::new(power)).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        let config = DriverConfig::default().with_buffer_capacity(0);
        let result: DriverResult<Session<ScriptedTransport, FakeClock>> =
            Session::new(config, FakeClock::new(0), Box::new(MockPower::new(false)));
        assert!(matches!(result, Err(DriverError::Config(_))));
    }

    #[test]
    fn test_on_without_transport_leaves_power_alone() {
        let power = MockPower::new(false);
        let mut session = session(power.clone());
        assert!(matches!(session.on(), Err(DriverError::TransportAbsent)));
        assert_eq!(power.on_calls(), 0);
        assert_eq!(session.state(), ConnectionState::PoweredOff);
    }

    #[test]
    fn test_on_waits_for_boot_prompt() {
        let power = MockPower::new(false);
        let mut transport = ScriptedTransport::new();
        transport.push_rx(b"NodeMCU 0.9.6\r\n> ");
        let mut session = session(power.clone()).with_transport(transport);

        session.on().unwrap();
        assert_eq!(power.on_calls(), 1);
        assert_eq!(session.state(), ConnectionState::Idle);
        let transport = session.transport().unwrap();
        assert!(transport.lines().is_empty());
        assert_eq!(transport.pending(), 0);
    }

    #[test]
    fn test_on_probes_when_already_powered() {
        let transport = ScriptedTransport::with_responder(|line| {
            format!("{}\r\nOK\r\n> ", line).into_bytes()
        });
        let mut session = session(MockPower::new(true)).with_transport(transport);

        session.on().unwrap();
        assert_eq!(session.state(), ConnectionState::Idle);
        assert_eq!(session.transport().unwrap().lines().len(), 1);
    }

    #[test]
    fn test_on_recovers_from_missed_boot_prompt() {
        let power = MockPower::new(false);
        let transport = ScriptedTransport::with_responder(|line| {
            format!("{}\r\nOK\r\n> ", line).into_bytes()
        });
        let mut session = session(power.clone()).with_transport(transport);

        session.on().unwrap();
        assert_eq!(power.on_calls(), 1);
        assert_eq!(power.off_calls(), 0);
        assert!(session.is_on());
        assert_eq!(session.state(), ConnectionState::Idle);
        assert_eq!(session.transport().unwrap().lines().len(), 1);
    }

    #[test]
    fn test_on_silent_module_is_switched_off() {
        let power = MockPower::new(false);
        let mut session = session(power.clone()).with_transport(ScriptedTransport::new());

        let err = session.on().unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(power.on_calls(), 1);
        assert_eq!(power.off_calls(), 1);
        assert!(!session.is_on());
        assert_eq!(session.state(), ConnectionState::PoweredOff);
    }

    #[test]
    fn test_off_is_unconditional() {
        let power = MockPower::new(true);
        let mut session = session(power.clone());
        session.off();
        assert!(!session.is_on());
        assert_eq!(power.off_calls(), 1);
        assert_eq!(session.state(), ConnectionState::PoweredOff);
    }

    #[test]
    fn test_send_requires_open_socket() {
        let mut session = session(MockPower::new(true)).with_transport(ScriptedTransport::new());
        let err = session.send_ascii(b"hello", false).unwrap_err();
        assert_eq!(err.to_string(), "cannot send while powered off");
    }

    #[test]
    fn test_read_back_without_data() {
        let session = session(MockPower::new(true));
        let mut out = [0u8; 8];
        assert!(matches!(
            session.read_response_binary(&mut out),
            Err(DriverError::NoResponse)
        ));
        assert!(matches!(
            session.read_response_ascii(8),
            Err(DriverError::NoResponse)
        ));
    }

    #[test]
    fn test_device_type() {
        assert_eq!(session(MockPower::new(false)).device_type(), "WifiBee");
    }
}
