//! Connection state.

use std::fmt;

/// Where the session is in the power / join / socket sequence.
///
/// ```text
/// PoweredOff --on()--> PoweringOn --prompt--> Idle --connect()--> Joining
///     --GotIP--> Joined --open()--> SocketOpen --close_socket()--> Joined
/// ```
///
/// `off()` returns to `PoweredOff` from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Module switched off.
    PoweredOff,
    /// Switched on, console not yet answering.
    PoweringOn,
    /// Console answering, not joined.
    Idle,
    /// Join in progress.
    Joining,
    /// Joined with an IP address.
    Joined,
    /// Connection object connected to a peer.
    SocketOpen,
}

impl ConnectionState {
    /// Whether the console is known to be answering.
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            ConnectionState::Idle | ConnectionState::Joined | ConnectionState::SocketOpen
        )
    }

    /// Whether the station holds an IP address.
    pub fn is_joined(&self) -> bool {
        matches!(self, ConnectionState::Joined | ConnectionState::SocketOpen)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::PoweredOff => write!(f, "powered off"),
            ConnectionState::PoweringOn => write!(f, "powering on"),
            ConnectionState::Idle => write!(f, "idle"),
            ConnectionState::Joining => write!(f, "joining"),
            ConnectionState::Joined => write!(f, "joined"),
            ConnectionState::SocketOpen => write!(f, "socket open"),
        }
    }
}
