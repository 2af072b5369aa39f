//! Session driver for the SODAQ WifiBee.
//!
//! The WifiBee is an ESP8266 running the NodeMCU Lua firmware. It is driven
//! over a UART by typing Lua statements into its console and scanning the
//! echo for prompts. [`Session`] turns that into blocking operations: power
//! on, join a network, open a TCP or UDP connection, send data, read the
//! reply back and issue HTTP requests.
//!
//! The UART, the clock and the power switch are supplied by the caller
//! through [`ByteTransport`], [`Clock`] and [`PowerControl`].
//!
//! ```no_run
//! use wifibee_driver::{AlwaysOn, Credentials, DriverConfig, Session, SystemClock};
//! # fn demo<T: wifibee_driver::ByteTransport>(uart: T) -> wifibee_driver::DriverResult<()> {
//! let config = DriverConfig::with_credentials(Credentials::new("lab", "secret"));
//! let mut session = Session::new(config, SystemClock::new(), Box::new(AlwaysOn))?
//!     .with_transport(uart);
//!
//! if let Some(status) = session.http_get("example.com", 80, "/", "")? {
//!     let mut body = [0u8; 512];
//!     let (len, _) = session.read_http_response(&mut body)?;
//!     println!("{} {}", status, String::from_utf8_lossy(&body[..len]));
//! }
//! # Ok(())
//! # }
//! ```

mod channel;
mod clock;
mod config;
mod error;
mod http;
pub mod mock;
mod power;
mod session;
mod state;
mod transport;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use power::*;
pub use session::*;
pub use state::*;
pub use transport::*;

pub use wifibee_protocol::{ConnectionKind, HttpRequest, StationStatus};
