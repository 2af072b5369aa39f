//! Driver configuration.
//!
//! Credentials, buffer size and timeouts are fixed when a session is built.
//! All types deserialize with defaults, so partial YAML documents work.

use serde::{Deserialize, Serialize};

use crate::error::{DriverError, DriverResult};

/// Default response buffer size in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Network credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    /// Network SSID.
    pub ssid: String,
    /// Unused; kept so settings can be shared with cellular modules.
    pub username: String,
    /// Network passphrase.
    pub password: String,
}

impl Credentials {
    /// Create credentials for a network.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            ssid: ssid.into(),
            username: String::new(),
            password: password.into(),
        }
    }
}

/// Timeouts, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Generic command prompt.
    pub response: u32,
    /// Joining the network, measured across status polls.
    pub wifi_connect: u32,
    /// Connecting to a peer.
    pub server_connect: u32,
    /// First reply packet from a peer.
    pub server_response: u32,
    /// Closing a connection.
    pub server_disconnect: u32,
    /// Inactivity limit while reading back hex.
    pub readback: u32,
    /// Boot prompt after power-on.
    pub wake: u32,
    /// Pause between status polls.
    pub status_poll: u32,
    /// Further reply packets after the first.
    pub next_packet: u32,
    /// Yield while no input is pending.
    pub poll_interval: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            response: 2000,
            wifi_connect: 10000,
            server_connect: 5000,
            server_response: 5000,
            server_disconnect: 2000,
            readback: 2500,
            wake: 2000,
            status_poll: 1000,
            next_packet: 500,
            poll_interval: 10,
        }
    }
}

/// Everything a session needs besides its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Network credentials.
    pub credentials: Credentials,
    /// Response buffer size in bytes.
    pub buffer_capacity: usize,
    /// Timeouts.
    pub timeouts: Timeouts,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            credentials: Credentials::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            timeouts: Timeouts::default(),
        }
    }
}

impl DriverConfig {
    /// Create a config for a network with default sizes and timeouts.
    pub fn with_credentials(credentials: Credentials) -> Self {
        DriverConfig {
            credentials,
            ..Default::default()
        }
    }

    /// Set the response buffer size.
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Check the config can be used.
    pub fn validate(&self) -> DriverResult<()> {
        if self.buffer_capacity == 0 {
            return Err(DriverError::Config(
                "buffer_capacity must be at least 1".to_string(),
            ));
        }
        if self.timeouts.poll_interval == 0 {
            return Err(DriverError::Config(
                "poll_interval must be at least 1 ms".to_string(),
            ));
        }
        Ok(())
    }
}
