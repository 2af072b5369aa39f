//! Lua statements sent to the NodeMCU console.
//!
//! Every command is a single line terminated with CRLF. The console echoes
//! the line and prints [`LUA_PROMPT`] once it has run it; some commands are
//! instead (or additionally) answered by a tagged prompt.

use crate::constants::*;
use crate::escape::escape_text;

/// Transport protocol of a remote connection object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    /// `net.TCP`
    Tcp,
    /// `net.UDP`
    Udp,
}

impl ConnectionKind {
    /// The Lua constant naming this kind.
    pub fn as_lua(&self) -> &'static str {
        match self {
            ConnectionKind::Tcp => "net.TCP",
            ConnectionKind::Udp => "net.UDP",
        }
    }
}

/// Events a remote connection object reports through callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketEvent {
    /// Connected to the peer.
    Connection,
    /// Reconnected to the peer.
    Reconnection,
    /// Connection closed.
    Disconnection,
    /// Send buffer handed to the network stack.
    Sent,
    /// Data arrived from the peer.
    Received,
}

impl SocketEvent {
    /// All events, in registration order.
    pub const ALL: [SocketEvent; 5] = [
        SocketEvent::Connection,
        SocketEvent::Reconnection,
        SocketEvent::Disconnection,
        SocketEvent::Sent,
        SocketEvent::Received,
    ];

    /// Event name used by `conn:on()`.
    pub fn name(&self) -> &'static str {
        match self {
            SocketEvent::Connection => "connection",
            SocketEvent::Reconnection => "reconnection",
            SocketEvent::Disconnection => "disconnection",
            SocketEvent::Sent => "sent",
            SocketEvent::Received => "receive",
        }
    }

    /// Tag the callback prints when the event fires.
    pub fn prompt(&self) -> &'static str {
        match self {
            SocketEvent::Connection => CONNECT_PROMPT,
            SocketEvent::Reconnection => RECONNECT_PROMPT,
            SocketEvent::Disconnection => DISCONNECT_PROMPT,
            SocketEvent::Sent => SENT_PROMPT,
            SocketEvent::Received => RECEIVED_PROMPT,
        }
    }
}

/// Commands that can be sent to the console.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // ========== Device ==========
    /// Ask the console to print `OK`.
    AliveProbe,

    // ========== Station ==========
    /// Switch the radio to station mode.
    SetStationMode,

    /// Store the network credentials.
    ConfigureStation {
        /// Network SSID.
        ssid: String,
        /// Network passphrase.
        password: String,
    },

    /// Start joining the configured network.
    JoinNetwork,

    /// Leave the network.
    LeaveNetwork,

    /// Print the station status between tags.
    QueryStatus,

    // ========== Connection ==========
    /// Create the connection object.
    CreateConnection {
        /// TCP or UDP.
        kind: ConnectionKind,
    },

    /// Register the callback for one event.
    RegisterCallback {
        /// The event to report.
        event: SocketEvent,
    },

    /// Connect the connection object to a peer.
    ConnectPeer {
        /// Host name or IP address.
        server: String,
        /// Peer port.
        port: u16,
    },

    /// Close the connection object.
    CloseConnection,

    // ========== Send Buffer ==========
    /// Reset the remote send buffer.
    CreateSendBuffer,

    /// Append an escaped chunk to the remote send buffer.
    AppendSendBuffer {
        /// String-literal content, already escaped.
        chunk: Vec<u8>,
    },

    /// Send the buffer over the connection and reset it.
    TransmitSendBuffer,

    /// Print the last received packet as hex.
    ReadBack,
}

impl Command {
    /// The Lua statement, without line terminator.
    pub fn to_command_bytes(&self) -> Vec<u8> {
        match self {
            Command::AliveProbe => ALIVE_COMMAND.as_bytes().to_vec(),
            Command::SetStationMode => b"wifi.setmode(wifi.STATION)".to_vec(),
            Command::ConfigureStation { ssid, password } => {
                let mut line = b"wifi.sta.config(\"".to_vec();
                line.extend_from_slice(&escape_text(ssid.as_bytes()));
                line.extend_from_slice(b"\",\"");
                line.extend_from_slice(&escape_text(password.as_bytes()));
                line.extend_from_slice(b"\")");
                line
            }
            Command::JoinNetwork => b"wifi.sta.connect()".to_vec(),
            Command::LeaveNetwork => b"wifi.sta.disconnect()".to_vec(),
            Command::QueryStatus => STATUS_COMMAND.as_bytes().to_vec(),
            Command::CreateConnection { kind } => format!(
                "{}=net.createConnection({}, false)",
                CONNECTION_OBJECT,
                kind.as_lua()
            )
            .into_bytes(),
            Command::RegisterCallback { event } => {
                let callback = match event {
                    SocketEvent::Received => RECEIVED_CALLBACK.to_string(),
                    other => format!("function(s) print(\"{}\") end", other.prompt()),
                };
                format!(
                    "{}:on(\"{}\", {})",
                    CONNECTION_OBJECT,
                    event.name(),
                    callback
                )
                .into_bytes()
            }
            Command::ConnectPeer { server, port } => {
                let mut line = format!("{}:connect({},\"", CONNECTION_OBJECT, port).into_bytes();
                line.extend_from_slice(&escape_text(server.as_bytes()));
                line.extend_from_slice(b"\")");
                line
            }
            Command::CloseConnection => format!("{}:close()", CONNECTION_OBJECT).into_bytes(),
            Command::CreateSendBuffer => format!("{}=\"\"", SEND_BUFFER).into_bytes(),
            Command::AppendSendBuffer { chunk } => {
                let mut line = format!("{0}={0}..\"", SEND_BUFFER).into_bytes();
                line.extend_from_slice(chunk);
                line.push(b'"');
                line
            }
            Command::TransmitSendBuffer => {
                format!("{1}:send({0}) {0}=\"\"", SEND_BUFFER, CONNECTION_OBJECT).into_bytes()
            }
            Command::ReadBack => READ_BACK_COMMAND.as_bytes().to_vec(),
        }
    }

    /// Encode the command for transmission, including the CRLF terminator.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = self.to_command_bytes();
        buf.extend_from_slice(LINE_TERMINATOR);
        buf
    }

    /// The command as text, for logging.
    pub fn to_command_string(&self) -> String {
        String::from_utf8_lossy(&self.to_command_bytes()).into_owned()
    }

    /// The prompt that completes this command.
    pub fn expected_prompt(&self) -> &'static str {
        match self {
            Command::AliveProbe => OK_PROMPT,
            Command::QueryStatus => STATUS_PROMPT,
            Command::ConnectPeer { .. } => CONNECT_PROMPT,
            Command::CloseConnection => DISCONNECT_PROMPT,
            Command::ReadBack => SOF_PROMPT,
            _ => LUA_PROMPT,
        }
    }
}
