//! Error type for the command line tool.

use std::io;

use thiserror::Error;
use wifibee_driver::DriverError;
use wifibee_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Driver(#[from] DriverError),

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("invalid config file: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("no transport configured; pass --serial or --tcp, or set one in the config file")]
    MissingTransport,

    #[error("invalid hex payload: {0}")]
    Payload(#[source] ProtocolError),
}

pub type CliResult<T> = Result<T, CliError>;
