//! Station status codes reported by `wifi.sta.status()`.

use std::fmt;

use crate::error::{ProtocolError, ProtocolResult};

/// Join progress of the station interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationStatus {
    /// Not trying to join.
    Idle,
    /// Join in progress.
    Connecting,
    /// Passphrase rejected.
    WrongCredentials,
    /// SSID not found.
    ApNotFound,
    /// Join failed for another reason.
    ConnectFailed,
    /// Joined and addressed.
    GotIp,
}

impl StationStatus {
    /// Map the status digit printed by the firmware.
    pub fn from_digit(c: u8) -> ProtocolResult<StationStatus> {
        match c {
            b'0' => Ok(StationStatus::Idle),
            b'1' => Ok(StationStatus::Connecting),
            b'2' => Ok(StationStatus::WrongCredentials),
            b'3' => Ok(StationStatus::ApNotFound),
            b'4' => Ok(StationStatus::ConnectFailed),
            b'5' => Ok(StationStatus::GotIp),
            other => Err(ProtocolError::InvalidStatus(other)),
        }
    }

    /// Numeric code, `0..=5`.
    pub fn code(&self) -> u8 {
        match self {
            StationStatus::Idle => 0,
            StationStatus::Connecting => 1,
            StationStatus::WrongCredentials => 2,
            StationStatus::ApNotFound => 3,
            StationStatus::ConnectFailed => 4,
            StationStatus::GotIp => 5,
        }
    }

    /// Whether the join succeeded.
    pub fn is_connected(&self) -> bool {
        *self == StationStatus::GotIp
    }

    /// Whether polling can stop.
    pub fn is_terminal(&self) -> bool {
        *self != StationStatus::Connecting
    }

    /// Why a join ending in this status failed. A join still `Connecting`
    /// when polling stops has timed out.
    pub fn failure_reason(&self) -> &'static str {
        match self {
            StationStatus::Idle => "station idle",
            StationStatus::Connecting => "timeout",
            StationStatus::WrongCredentials => "wrong credentials",
            StationStatus::ApNotFound => "AP not found",
            StationStatus::ConnectFailed => "connection failed",
            StationStatus::GotIp => "IP received",
        }
    }
}

impl fmt::Display for StationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationStatus::Idle => write!(f, "idle"),
            StationStatus::Connecting => write!(f, "connecting"),
            StationStatus::WrongCredentials => write!(f, "wrong credentials"),
            StationStatus::ApNotFound => write!(f, "AP not found"),
            StationStatus::ConnectFailed => write!(f, "connect failed"),
            StationStatus::GotIp => write!(f, "got IP"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_mapping() {
        let expected = [
            StationStatus::Idle,
            StationStatus::Connecting,
            StationStatus::WrongCredentials,
            StationStatus::ApNotFound,
            StationStatus::ConnectFailed,
            StationStatus::GotIp,
        ];
        for (i, status) in expected.iter().enumerate() {
            let digit = b'0' + i as u8;
            assert_eq!(StationStatus::from_digit(digit), Ok(*status));
            assert_eq!(status.code(), i as u8);
        }
    }

    #[test]
    fn test_other_characters_rejected() {
        for c in [b'6', b'9', b'|', b' ', b'a', 0u8] {
            assert_eq!(
                StationStatus::from_digit(c),
                Err(ProtocolError::InvalidStatus(c))
            );
        }
    }

    #[test]
    fn test_only_got_ip_is_success() {
        assert!(StationStatus::GotIp.is_connected());
        assert!(!StationStatus::Connecting.is_terminal());
        assert!(!StationStatus::Idle.is_connected());
        assert_eq!(StationStatus::Connecting.failure_reason(), "timeout");
    }
}
