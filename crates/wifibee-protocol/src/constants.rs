//! Wire constants
//!
//! Prompts, command limits and fixed Lua snippets understood by the NodeMCU
//! firmware running on the WifiBee.

// ============================================================================
// Command Limits
// ============================================================================

/// Longest command line the Lua console accepts.
pub const LUA_COMMAND_MAX: usize = 255;

/// Smallest line limit the chunker can still make progress with.
pub const MIN_COMMAND_MAX: usize = 13;

/// Characters added around each chunk by `sb=sb..""`.
pub const APPEND_OVERHEAD: usize = 9;

/// Terminator appended to every command.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

// ============================================================================
// Prompts (firmware → host)
// ============================================================================

/// Generic ready prompt printed after every accepted command.
pub const LUA_PROMPT: &str = "\r\n> ";
/// Answer to [`ALIVE_COMMAND`].
pub const OK_PROMPT: &str = "OK\r\n> ";
/// Printed by the `connection` callback.
pub const CONNECT_PROMPT: &str = "|C|";
/// Printed by the `reconnection` callback.
pub const RECONNECT_PROMPT: &str = "|RC|";
/// Printed by the `disconnection` callback.
pub const DISCONNECT_PROMPT: &str = "|DC|";
/// Printed by the `sent` callback.
pub const SENT_PROMPT: &str = "|DS|";
/// Printed by the `receive` callback, preceded by the packet length.
pub const RECEIVED_PROMPT: &str = "|DR|";
/// Precedes the station status digit.
pub const STATUS_PROMPT: &str = "|STS|";
/// Start of a hex read-back.
pub const SOF_PROMPT: &str = "|SOF|";
/// End of a hex read-back. Must not start with a hex digit.
pub const EOF_PROMPT: &str = "|EOF|";

// ============================================================================
// Lua Snippets
// ============================================================================

/// Aliveness probe, answered by [`OK_PROMPT`].
pub const ALIVE_COMMAND: &str = "uart.write(0, \"OK\\r\\n\")";

/// Receive callback. Keeps the first packet in `lastData`.
pub const RECEIVED_CALLBACK: &str =
    "function(s, d) if lastData==nil then lastData=d end print(d:len()..\"|DR|\") end";

/// Status query. The prompt is split so the console echo never matches it.
pub const STATUS_COMMAND: &str = "print(\"|\" .. \"STS|\" .. wifi.sta.status() .. \"|\")";

/// Dumps `lastData` as uppercase hex between [`SOF_PROMPT`] and [`EOF_PROMPT`].
pub const READ_BACK_COMMAND: &str = "uart.write(0, \"|\" .. \"SOF|\") for i=1, lastData:len(), 1 do uart.write(0, string.format(\"%02X\", lastData:byte(i))) tmr.wdclr() end lastData=nil uart.write(0, \"|EOF|\")";

/// Name of the remote send buffer variable.
pub const SEND_BUFFER: &str = "sb";

/// Name of the remote connection object.
pub const CONNECTION_OBJECT: &str = "wifiConn";

/// Identifies the module.
pub const DEVICE_TYPE: &str = "WifiBee";
