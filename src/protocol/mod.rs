//! WebSocket protocol layer
//!
//! - `handshake`: HTTP/1.1 upgrade validation and accept-key derivation
//! - `frame`: frame decoding (masked client frames) and encoding
//! - `constants`: protocol constants and close status codes

pub mod constants;
pub mod frame;
pub mod handshake;

pub use frame::{Frame, FrameDecoder, OpCode};
pub use handshake::{derive_accept_key, Handshake, HandshakeOutcome};
