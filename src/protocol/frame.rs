//! WebSocket frame codec
//!
//! Wire layout of a frame (RFC 6455 Section 5.2):
//!
//! ```text
//!  0               1               2               3
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |     Masking-key (if MASK set)     |         Payload ...       |
//! +-----------------------------------+---------------------------+
//! ```
//!
//! Frames from a client are always masked; frames we send never are.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::FrameError;
use crate::protocol::constants::{DEFAULT_MAX_MESSAGE_SIZE, MAX_CONTROL_PAYLOAD};

/// Frame opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    Continuation,
    Text,
    Binary,
    Close,
    Ping,
    Pong,
}

impl OpCode {
    pub fn from_u8(value: u8) -> Result<Self, FrameError> {
        match value {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            other => Err(FrameError::ReservedOpcode(other)),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            OpCode::Continuation => 0x0,
            OpCode::Text => 0x1,
            OpCode::Binary => 0x2,
            OpCode::Close => 0x8,
            OpCode::Ping => 0x9,
            OpCode::Pong => 0xA,
        }
    }

    /// Close, Ping and Pong
    pub fn is_control(self) -> bool {
        matches!(self, OpCode::Close | OpCode::Ping | OpCode::Pong)
    }
}

/// A decoded (and unmasked) frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub fin: bool,
    pub opcode: OpCode,
    pub payload: Bytes,
}

impl Frame {
    /// Status code carried by a close frame, if any
    pub fn close_code(&self) -> Option<u16> {
        if self.opcode == OpCode::Close && self.payload.len() >= 2 {
            Some(u16::from_be_bytes([self.payload[0], self.payload[1]]))
        } else {
            None
        }
    }
}

/// Incremental decoder for client-to-server frames
#[derive(Debug)]
pub struct FrameDecoder {
    max_message_size: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_message_size(DEFAULT_MAX_MESSAGE_SIZE)
    }

    pub fn with_max_message_size(max: usize) -> Self {
        Self {
            max_message_size: max,
        }
    }

    /// Decode one frame from the front of `buf`
    ///
    /// Returns `Ok(None)` and leaves `buf` untouched if the frame is not
    /// complete yet.
    pub fn decode(&self, buf: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if buf.len() < 2 {
            return Ok(None);
        }

        let b0 = buf[0];
        let b1 = buf[1];

        let fin = b0 & 0x80 != 0;
        if b0 & 0x70 != 0 {
            return Err(FrameError::ReservedBits);
        }
        let opcode = OpCode::from_u8(b0 & 0x0F)?;

        if b1 & 0x80 == 0 {
            return Err(FrameError::UnmaskedFrame);
        }

        let (payload_len, mut header_len) = match b1 & 0x7F {
            126 => {
                if buf.len() < 4 {
                    return Ok(None);
                }
                (u16::from_be_bytes([buf[2], buf[3]]) as u64, 4)
            }
            127 => {
                if buf.len() < 10 {
                    return Ok(None);
                }
                let mut len = [0u8; 8];
                len.copy_from_slice(&buf[2..10]);
                (u64::from_be_bytes(len), 10)
            }
            n => (n as u64, 2),
        };

        if opcode.is_control() {
            if !fin {
                return Err(FrameError::FragmentedControl);
            }
            if payload_len > MAX_CONTROL_PAYLOAD {
                return Err(FrameError::ControlTooLarge(payload_len));
            }
            // A close payload is empty or starts with a 2 byte code
            if opcode == OpCode::Close && payload_len == 1 {
                return Err(FrameError::InvalidClosePayload);
            }
        }

        if payload_len > self.max_message_size as u64 {
            return Err(FrameError::MessageTooBig {
                size: payload_len,
                max: self.max_message_size,
            });
        }

        let mask_offset = header_len;
        header_len += 4;
        let frame_len = header_len + payload_len as usize;
        if buf.len() < frame_len {
            buf.reserve(frame_len - buf.len());
            return Ok(None);
        }

        let mut mask = [0u8; 4];
        mask.copy_from_slice(&buf[mask_offset..mask_offset + 4]);

        buf.advance(header_len);
        let mut payload = buf.split_to(payload_len as usize);
        apply_mask(&mut payload, mask);

        let frame = Frame {
            fin,
            opcode,
            payload: payload.freeze(),
        };
        if let Some(code) = frame.close_code() {
            if !is_valid_close_code(code) {
                return Err(FrameError::InvalidCloseCode(code));
            }
        }

        Ok(Some(frame))
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Close codes a peer may put on the wire (RFC 6455 section 7.4)
///
/// 1004, 1005, 1006 and 1015 are reserved, 1012..=2999 are unassigned.
pub fn is_valid_close_code(code: u16) -> bool {
    matches!(code, 1000..=1003 | 1007..=1011 | 3000..=4999)
}

/// XOR `data` with the repeating 4-byte mask
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= mask[i % 4];
    }
}

/// Append an unmasked, final frame to `out`
pub fn encode_frame(opcode: OpCode, payload: &[u8], out: &mut BytesMut) {
    out.reserve(10 + payload.len());
    out.put_u8(0x80 | opcode.as_u8());
    put_length(out, payload.len() as u64, 0);
    out.put_slice(payload);
}

/// Encode a text message as a single frame
pub fn text_frame(text: &str) -> Bytes {
    let mut out = BytesMut::new();
    encode_frame(OpCode::Text, text.as_bytes(), &mut out);
    out.freeze()
}

/// Encode a close frame, optionally carrying a status code
pub fn close_frame(code: Option<u16>) -> Bytes {
    let mut out = BytesMut::with_capacity(4);
    match code {
        Some(code) => encode_frame(OpCode::Close, &code.to_be_bytes(), &mut out),
        None => encode_frame(OpCode::Close, &[], &mut out),
    }
    out.freeze()
}

fn put_length(out: &mut BytesMut, len: u64, mask_bit: u8) {
    if len < 126 {
        out.put_u8(mask_bit | len as u8);
    } else if len <= u16::MAX as u64 {
        out.put_u8(mask_bit | 126);
        out.put_u16(len as u16);
    } else {
        out.put_u8(mask_bit | 127);
        out.put_u64(len);
    }
}

/// Client-side encoder, used to drive the server in tests
#[cfg(test)]
pub(crate) fn encode_masked(opcode: OpCode, fin: bool, payload: &[u8], mask: [u8; 4]) -> Bytes {
    let mut out = BytesMut::with_capacity(14 + payload.len());
    let fin_bit = if fin { 0x80 } else { 0 };
    out.put_u8(fin_bit | opcode.as_u8());
    put_length(&mut out, payload.len() as u64, 0x80);
    out.put_slice(&mask);
    let start = out.len();
    out.put_slice(payload);
    apply_mask(&mut out[start..], mask);
    out.freeze()
}

/// Decode a server frame (unmasked), used by tests acting as a client
#[cfg(test)]
pub(crate) fn decode_unmasked(buf: &mut BytesMut) -> Option<Frame> {
    if buf.len() < 2 {
        return None;
    }
    let fin = buf[0] & 0x80 != 0;
    let opcode = OpCode::from_u8(buf[0] & 0x0F).ok()?;
    let (len, header) = match buf[1] & 0x7F {
        126 if buf.len() >= 4 => (u16::from_be_bytes([buf[2], buf[3]]) as usize, 4),
        127 if buf.len() >= 10 => {
            let mut len = [0u8; 8];
            len.copy_from_slice(&buf[2..10]);
            (u64::from_be_bytes(len) as usize, 10)
        }
        126 | 127 => return None,
        n => (n as usize, 2),
    };
    if buf.len() < header + len {
        return None;
    }
    buf.advance(header);
    let payload = buf.split_to(len).freeze();
    Some(Frame {
        fin,
        opcode,
        payload,
    })
}
