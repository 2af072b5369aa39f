//! WifiBee Lua Console Protocol
//!
//! This crate provides the wire-level pieces for driving a WifiBee (an ESP8266
//! running the NodeMCU Lua firmware) over its UART console. There is no binary
//! framing: the host types Lua statements and watches the echoed output for
//! known prompt strings.
//!
//! # Protocol Overview
//!
//! - **Commands** (host → firmware): one Lua statement per line, terminated
//!   with `\r\n`, at most [`LUA_COMMAND_MAX`] characters
//! - **Ready prompt** (firmware → host): `\r\n> ` after every statement
//! - **Tagged prompts** (firmware → host): short `|XX|` strings printed by
//!   callbacks registered on the remote connection object
//! - **Read-back** (firmware → host): received packets printed as uppercase hex
//!   between `|SOF|` and `|EOF|`
//!
//! Payloads are uploaded into a remote send buffer with `sb=sb.."..."`
//! statements, so they are escaped as Lua string literals and split into
//! chunks that respect the line limit.
//!
//! # Example
//!
//! ```rust,ignore
//! use wifibee_protocol::{Chunker, Command, HttpResult};
//!
//! // Upload a payload
//! for chunk in Chunker::default().text(b"hello\r\n") {
//!     let line = Command::AppendSendBuffer { chunk }.encode();
//! }
//!
//! // Parse a read-back
//! let result = HttpResult::parse(b"HTTP/1.1 200 OK\r\n\r\nbody")?;
//! ```

mod buffer;
mod chunk;
mod commands;
mod constants;
mod error;
mod escape;
mod hex_codec;
mod http;
mod scanner;
mod status;

pub use buffer::*;
pub use chunk::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use escape::*;
pub use hex_codec::*;
pub use http::*;
pub use scanner::*;
pub use status::*;
