//! Config file for the command line tool.
//!
//! ```yaml
//! transport:
//!   kind: serial
//!   path: /dev/ttyUSB0
//!   baud: 9600
//! driver:
//!   credentials:
//!     ssid: lab
//!     password: secret
//!   timeouts:
//!     wifi_connect: 20000
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wifibee_driver::DriverConfig;

use crate::error::CliResult;

/// The WifiBee console runs at 9600 baud out of the box.
pub const DEFAULT_BAUD: u32 = 9600;

fn default_baud() -> u32 {
    DEFAULT_BAUD
}

/// How to reach the WifiBee's UART.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransportConfig {
    /// A local serial port.
    Serial {
        path: String,
        #[serde(default = "default_baud")]
        baud: u32,
    },
    /// A UART exposed over TCP, e.g. by a serial bridge or simulator.
    Tcp { address: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub transport: Option<TransportConfig>,
    pub driver: DriverConfig,
}

impl CliConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> CliResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config() {
        let yaml = r#"
transport:
  kind: serial
  path: /dev/ttyUSB0
driver:
  credentials:
    ssid: lab
    password: secret
  buffer_capacity: 2048
  timeouts:
    wifi_connect: 20000
"#;
        let config = CliConfig::from_yaml(yaml).unwrap();
        assert_eq!(
            config.transport,
            Some(TransportConfig::Serial {
                path: "/dev/ttyUSB0".to_string(),
                baud: DEFAULT_BAUD,
            })
        );
        assert_eq!(config.driver.credentials.ssid, "lab");
        assert_eq!(config.driver.buffer_capacity, 2048);
        assert_eq!(config.driver.timeouts.wifi_connect, 20000);
        assert_eq!(config.driver.timeouts.response, 2000);
    }

    #[test]
    fn test_tcp_transport() {
        let config = CliConfig::from_yaml("transport:\n  kind: tcp\n  address: 127.0.0.1:9000\n").unwrap();
        assert_eq!(
            config.transport,
            Some(TransportConfig::Tcp {
                address: "127.0.0.1:9000".to_string()
            })
        );
        assert_eq!(config.driver, DriverConfig::default());
    }

    #[test]
    fn test_unknown_transport_rejected() {
        assert!(CliConfig::from_yaml("transport:\n  kind: carrier_pigeon\n").is_err());
    }
}
