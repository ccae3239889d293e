//! Error types
//!
//! Connection-level failures (`HandshakeError`, `FrameError`) end the
//! connection they occur on. Message-level failures are reported to the
//! client as a JSON response and live in the `dispatch` and `registry`
//! modules.

use std::io;

use crate::protocol::constants::{
    CLOSE_INVALID_PAYLOAD, CLOSE_MESSAGE_TOO_BIG, CLOSE_PROTOCOL_ERROR, CLOSE_UNSUPPORTED_DATA,
};
use crate::protocol::frame::OpCode;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for a connection
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("handshake failed: {0}")]
    Handshake(#[from] HandshakeError),

    #[error("frame protocol error: {0}")]
    Frame(#[from] FrameError),

    #[error("timed out")]
    Timeout,

    #[error("connection closed by peer")]
    ConnectionClosed,
}

/// Reasons an opening handshake is rejected with `400 Bad Request`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandshakeError {
    #[error("request head exceeds {0} bytes")]
    HeaderTooLarge(usize),

    #[error("malformed request: {0}")]
    MalformedRequest(&'static str),

    #[error("method must be GET, got {0}")]
    InvalidMethod(String),

    #[error("HTTP version must be HTTP/1.1, got {0}")]
    InvalidHttpVersion(String),

    #[error("missing or invalid Upgrade header")]
    MissingUpgrade,

    #[error("missing or invalid Connection header")]
    MissingConnection,

    #[error("missing Sec-WebSocket-Key header")]
    MissingKey,

    #[error("Sec-WebSocket-Key is not a base64-encoded 16 byte nonce")]
    InvalidKey,

    #[error("missing Sec-WebSocket-Version header")]
    MissingVersion,

    #[error("unsupported Sec-WebSocket-Version {0}")]
    UnsupportedVersion(String),
}

/// Violations of the framing rules on an upgraded connection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("client frame is not masked")]
    UnmaskedFrame,

    #[error("reserved bits set without a negotiated extension")]
    ReservedBits,

    #[error("reserved opcode {0:#x}")]
    ReservedOpcode(u8),

    #[error("control frame is fragmented")]
    FragmentedControl,

    #[error("control frame payload of {0} bytes exceeds 125")]
    ControlTooLarge(u64),

    #[error("message of {size} bytes exceeds the {max} byte limit")]
    MessageTooBig { size: u64, max: usize },

    #[error("unsupported {0:?} frame")]
    Unsupported(OpCode),

    #[error("fragmented messages are not supported")]
    Fragmented,

    #[error("text payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("close frame payload of 1 byte")]
    InvalidClosePayload,

    #[error("close code {0} may not be sent by a peer")]
    InvalidCloseCode(u16),
}

impl FrameError {
    /// Close status code to send before dropping the connection
    pub fn close_code(&self) -> u16 {
        match self {
            FrameError::UnmaskedFrame
            | FrameError::ReservedBits
            | FrameError::ReservedOpcode(_)
            | FrameError::FragmentedControl
            | FrameError::ControlTooLarge(_)
            | FrameError::InvalidClosePayload
            | FrameError::InvalidCloseCode(_) => CLOSE_PROTOCOL_ERROR,
            FrameError::MessageTooBig { .. } => CLOSE_MESSAGE_TOO_BIG,
            FrameError::Unsupported(_) | FrameError::Fragmented => CLOSE_UNSUPPORTED_DATA,
            FrameError::InvalidUtf8 => CLOSE_INVALID_PAYLOAD,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_codes() {
        assert_eq!(FrameError::UnmaskedFrame.close_code(), 1002);
        assert_eq!(FrameError::ReservedOpcode(0x3).close_code(), 1002);
        assert_eq!(
            FrameError::MessageTooBig { size: 10, max: 5 }.close_code(),
            1009
        );
        assert_eq!(FrameError::Unsupported(OpCode::Binary).close_code(), 1003);
        assert_eq!(FrameError::Fragmented.close_code(), 1003);
        assert_eq!(FrameError::InvalidUtf8.close_code(), 1007);
        assert_eq!(FrameError::InvalidClosePayload.close_code(), 1002);
        assert_eq!(FrameError::InvalidCloseCode(1005).close_code(), 1002);
    }

    #[test]
    fn test_error_conversions() {
        let err: Error = HandshakeError::MissingKey.into();
        assert!(matches!(err, Error::Handshake(HandshakeError::MissingKey)));

        let err: Error = FrameError::UnmaskedFrame.into();
        assert!(matches!(err, Error::Frame(FrameError::UnmaskedFrame)));

        let err: Error = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, Error::Io(_)));
    }
}
