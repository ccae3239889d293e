//! WebSocket protocol constants (RFC 6455)

/// GUID appended to `Sec-WebSocket-Key` before hashing
pub const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// The only protocol version we speak
pub const WS_VERSION: &str = "13";

/// Decoded length of a valid `Sec-WebSocket-Key`
pub const WS_KEY_LEN: usize = 16;

/// Terminator of the HTTP request head
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Default limit for the HTTP request head
pub const DEFAULT_MAX_HEADER_SIZE: usize = 8 * 1024;

/// Default limit for a single message payload (16 MiB)
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Largest payload allowed in a control frame
pub const MAX_CONTROL_PAYLOAD: u64 = 125;

/// Default registry port
pub const DEFAULT_PORT: u16 = 10101;

// Close status codes (RFC 6455 section 7.4.1)
pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_GOING_AWAY: u16 = 1001;
pub const CLOSE_PROTOCOL_ERROR: u16 = 1002;
pub const CLOSE_UNSUPPORTED_DATA: u16 = 1003;
pub const CLOSE_INVALID_PAYLOAD: u16 = 1007;
pub const CLOSE_MESSAGE_TOO_BIG: u16 = 1009;
