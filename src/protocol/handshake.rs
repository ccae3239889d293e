//! WebSocket opening handshake
//!
//! The server side of the RFC 6455 upgrade:
//!
//! ```text
//! Client                                         Server
//!   |                                              |
//!   |-- GET / HTTP/1.1                        ---->|
//!   |   Upgrade: websocket                         |
//!   |   Connection: Upgrade                        |
//!   |   Sec-WebSocket-Key: <base64 16 bytes>       |
//!   |   Sec-WebSocket-Version: 13                  |
//!   |                                              |
//!   |<-- HTTP/1.1 101 Switching Protocols     -----|   (all headers valid)
//!   |    Sec-WebSocket-Accept: <derived key>       |
//!   |                                              |
//!   |<-- HTTP/1.1 400 Bad Request             -----|   (anything missing)
//! ```
//!
//! Every required condition is independently necessary, so a single missing
//! or malformed header is enough to reject the request.
//!
//! Reference: RFC 6455 Section 4.2

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bytes::{Bytes, BytesMut};
use sha1::{Digest, Sha1};

use crate::error::HandshakeError;
use crate::protocol::constants::{
    DEFAULT_MAX_HEADER_SIZE, HEADER_TERMINATOR, WS_GUID, WS_KEY_LEN, WS_VERSION,
};

/// Handshake state machine
#[derive(Debug)]
pub struct Handshake {
    state: HandshakeState,
    max_header_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    /// Accumulating the request head
    ReadingRequest,
    /// Upgrade accepted, connection is in frame mode
    Accepted,
    /// Upgrade rejected, connection must be closed
    Rejected,
}

/// Result of a completed handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// Switch protocols; carries the `Sec-WebSocket-Accept` value
    Accept { accept_key: String },
    /// Respond with 400 and close
    Reject(HandshakeError),
}

impl HandshakeOutcome {
    /// Raw HTTP response to write back to the client
    pub fn response(&self) -> Bytes {
        match self {
            HandshakeOutcome::Accept { accept_key } => Bytes::from(format!(
                "HTTP/1.1 101 Switching Protocols\r\n\
                 Upgrade: websocket\r\n\
                 Connection: Upgrade\r\n\
                 Sec-WebSocket-Accept: {}\r\n\
                 \r\n",
                accept_key
            )),
            HandshakeOutcome::Reject(_) => Bytes::from_static(
                b"HTTP/1.1 400 Bad Request\r\n\
                  Connection: close\r\n\
                  Content-Length: 0\r\n\
                  \r\n",
            ),
        }
    }

    pub fn is_accept(&self) -> bool {
        matches!(self, HandshakeOutcome::Accept { .. })
    }
}

impl Handshake {
    /// Create a handshake with the default request head limit
    pub fn new() -> Self {
        Self::with_max_header_size(DEFAULT_MAX_HEADER_SIZE)
    }

    /// Create a handshake that rejects request heads larger than `max`
    pub fn with_max_header_size(max: usize) -> Self {
        Self {
            state: HandshakeState::ReadingRequest,
            max_header_size: max,
        }
    }

    /// Check if the handshake has produced an outcome
    pub fn is_done(&self) -> bool {
        self.state != HandshakeState::ReadingRequest
    }

    /// Check if the connection was upgraded
    pub fn is_accepted(&self) -> bool {
        self.state == HandshakeState::Accepted
    }

    /// Process buffered bytes
    ///
    /// Returns `None` while the request head is incomplete. Once the head is
    /// complete it is consumed from `buf`; any bytes after it stay in `buf`
    /// for the frame decoder.
    pub fn process(&mut self, buf: &mut BytesMut) -> Option<HandshakeOutcome> {
        if self.state != HandshakeState::ReadingRequest {
            return None;
        }

        let head_len = match find_terminator(buf) {
            Some(pos) => pos + HEADER_TERMINATOR.len(),
            None => {
                if buf.len() > self.max_header_size {
                    return Some(self.finish(Err(HandshakeError::HeaderTooLarge(
                        self.max_header_size,
                    ))));
                }
                return None;
            }
        };

        if head_len > self.max_header_size {
            return Some(self.finish(Err(HandshakeError::HeaderTooLarge(
                self.max_header_size,
            ))));
        }

        let head = buf.split_to(head_len).freeze();
        let result = RequestHead::parse(&head).and_then(|req| validate_upgrade(&req));
        Some(self.finish(result))
    }

    fn finish(&mut self, result: Result<String, HandshakeError>) -> HandshakeOutcome {
        match result {
            Ok(accept_key) => {
                self.state = HandshakeState::Accepted;
                HandshakeOutcome::Accept { accept_key }
            }
            Err(e) => {
                self.state = HandshakeState::Rejected;
                HandshakeOutcome::Reject(e)
            }
        }
    }
}

impl Default for Handshake {
    fn default() -> Self {
        Self::new()
    }
}

/// Parsed HTTP request line and headers
#[derive(Debug)]
pub struct RequestHead {
    pub method: String,
    pub target: String,
    pub version: String,
    headers: Vec<(String, String)>,
}

impl RequestHead {
    /// Parse a complete request head (including the blank line)
    pub fn parse(raw: &[u8]) -> Result<Self, HandshakeError> {
        let text = std::str::from_utf8(raw)
            .map_err(|_| HandshakeError::MalformedRequest("head is not valid UTF-8"))?;

        let mut lines = text.split("\r\n");
        let request_line = lines
            .next()
            .filter(|l| !l.is_empty())
            .ok_or(HandshakeError::MalformedRequest("empty request line"))?;

        let mut parts = request_line.split_ascii_whitespace();
        let (method, target, version) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(t), Some(v)) if parts.next().is_none() => (m, t, v),
            _ => return Err(HandshakeError::MalformedRequest("bad request line")),
        };

        let mut headers = Vec::new();
        for line in lines {
            if line.is_empty() {
                continue;
            }
            let (name, value) = line
                .split_once(':')
                .ok_or(HandshakeError::MalformedRequest("header line without colon"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(HandshakeError::MalformedRequest("empty header name"));
            }
            headers.push((name.to_string(), value.trim().to_string()));
        }

        Ok(Self {
            method: method.to_string(),
            target: target.to_string(),
            version: version.to_string(),
            headers,
        })
    }

    /// First value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether any occurrence of a header lists `token` (comma-separated)
    pub fn header_has_token(&self, name: &str, token: &str) -> bool {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .flat_map(|(_, v)| v.split(','))
            .any(|t| t.trim().eq_ignore_ascii_case(token))
    }
}

/// Check every upgrade requirement and derive the accept key
fn validate_upgrade(req: &RequestHead) -> Result<String, HandshakeError> {
    if req.method != "GET" {
        return Err(HandshakeError::InvalidMethod(req.method.clone()));
    }
    if req.version != "HTTP/1.1" {
        return Err(HandshakeError::InvalidHttpVersion(req.version.clone()));
    }
    if !req.header_has_token("Upgrade", "websocket") {
        return Err(HandshakeError::MissingUpgrade);
    }
    if !req.header_has_token("Connection", "Upgrade") {
        return Err(HandshakeError::MissingConnection);
    }

    let key = req
        .header("Sec-WebSocket-Key")
        .ok_or(HandshakeError::MissingKey)?;
    match BASE64_STANDARD.decode(key) {
        Ok(nonce) if nonce.len() == WS_KEY_LEN => {}
        _ => return Err(HandshakeError::InvalidKey),
    }

    let version = req
        .header("Sec-WebSocket-Version")
        .ok_or(HandshakeError::MissingVersion)?;
    if version != WS_VERSION {
        return Err(HandshakeError::UnsupportedVersion(version.to_string()));
    }

    Ok(derive_accept_key(key))
}

/// Derive `Sec-WebSocket-Accept` from a client key
pub fn derive_accept_key(key: &str) -> String {
    let mut sha1 = Sha1::new();
    sha1.update(key.as_bytes());
    sha1.update(WS_GUID.as_bytes());
    BASE64_STANDARD.encode(sha1.finalize())
}

fn find_terminator(buf: &BytesMut) -> Option<usize> {
    buf.windows(HEADER_TERMINATOR.len())
        .position(|w| w == HEADER_TERMINATOR)
}
