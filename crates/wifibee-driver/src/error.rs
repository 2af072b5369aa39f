//! Error types for the session driver.

use thiserror::Error;
use wifibee_protocol::{ProtocolError, StationStatus};

use crate::state::ConnectionState;

/// Errors reported by [`Session`](crate::Session) operations.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No byte stream is attached. Returned without blocking.
    #[error("no transport attached")]
    TransportAbsent,

    /// The expected prompt did not arrive in time.
    #[error("timed out after {timeout_ms} ms waiting for {prompt:?}")]
    Timeout {
        /// The prompt being waited for.
        prompt: &'static str,
        /// The window that elapsed.
        timeout_ms: u32,
    },

    /// Joining the network ended in a status other than `GotIp`.
    #[error("failed to join network: {}", .0.failure_reason())]
    JoinFailed(StationStatus),

    /// The device printed something the protocol does not allow.
    #[error("protocol mismatch: {0}")]
    Protocol(#[from] ProtocolError),

    /// A read-back was requested but nothing has been received.
    #[error("no response data available")]
    NoResponse,

    /// The operation is not valid in the current connection state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// What was attempted.
        operation: &'static str,
        /// The state at the time.
        state: ConnectionState,
    },

    /// The configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Writing to the transport failed.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Whether this is a prompt timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, DriverError::Timeout { .. })
    }
}

/// Result type alias for driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DriverError::JoinFailed(StationStatus::ApNotFound);
        assert_eq!(err.to_string(), "failed to join network: AP not found");

        let err = DriverError::Timeout {
            prompt: "|C|",
            timeout_ms: 5000,
        };
        assert!(err.is_timeout());
        assert!(err.to_string().contains("5000 ms"));

        let err = DriverError::InvalidState {
            operation: "send",
            state: ConnectionState::Idle,
        };
        assert_eq!(err.to_string(), "cannot send while idle");
    }

    #[test]
    fn test_protocol_error_conversion() {
        let err: DriverError = ProtocolError::MissingHttpCode.into();
        assert!(matches!(err, DriverError::Protocol(ProtocolError::MissingHttpCode)));
    }
}
