//! Minimal client used by server tests

use bytes::BytesMut;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::protocol::frame::{decode_unmasked, encode_masked};
use crate::protocol::{Frame, OpCode};

pub(crate) const UPGRADE_REQUEST: &str = "GET /chat HTTP/1.1\r\n\
    Host: server.example.com\r\n\
    Upgrade: websocket\r\n\
    Connection: Upgrade\r\n\
    Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\
    Sec-WebSocket-Version: 13\r\n\
    \r\n";

pub(crate) const EXPECTED_ACCEPT: &str = "Sec-WebSocket-Accept: s3pPLMBiTxaQ9kYGzzhZRbK+xOo=";

const MASK: [u8; 4] = [0x12, 0x34, 0x56, 0x78];

pub(crate) struct WsClient<S> {
    io: S,
    buf: BytesMut,
}

impl<S: AsyncRead + AsyncWrite + Unpin> WsClient<S> {
    pub(crate) fn new(io: S) -> Self {
        Self {
            io,
            buf: BytesMut::with_capacity(4096),
        }
    }

    pub(crate) async fn write_raw(&mut self, bytes: &[u8]) {
        self.io.write_all(bytes).await.unwrap();
    }

    /// Read until the end of the HTTP response head
    pub(crate) async fn read_response_head(&mut self) -> String {
        loop {
            if let Some(pos) = self.buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = self.buf.split_to(pos + 4);
                return String::from_utf8(head.to_vec()).unwrap();
            }
            let n = self.io.read_buf(&mut self.buf).await.unwrap();
            assert!(n > 0, "connection closed before response head");
        }
    }

    /// Perform the canonical upgrade and return the response head
    pub(crate) async fn upgrade(&mut self) -> String {
        self.write_raw(UPGRADE_REQUEST.as_bytes()).await;
        let head = self.read_response_head().await;
        assert!(head.starts_with("HTTP/1.1 101 Switching Protocols"), "{}", head);
        head
    }

    pub(crate) async fn send(&mut self, opcode: OpCode, payload: &[u8]) {
        let bytes = encode_masked(opcode, true, payload, MASK);
        self.write_raw(&bytes).await;
    }

    pub(crate) async fn send_text(&mut self, text: &str) {
        self.send(OpCode::Text, text.as_bytes()).await;
    }

    pub(crate) async fn recv(&mut self) -> Frame {
        loop {
            if let Some(frame) = decode_unmasked(&mut self.buf) {
                return frame;
            }
            let n = self.io.read_buf(&mut self.buf).await.unwrap();
            assert!(n > 0, "connection closed before frame");
        }
    }

    /// Next text frame parsed as JSON
    pub(crate) async fn recv_json(&mut self) -> Value {
        let frame = self.recv().await;
        assert_eq!(frame.opcode, OpCode::Text, "unexpected frame {:?}", frame);
        serde_json::from_slice(&frame.payload).unwrap()
    }

    pub(crate) async fn request(&mut self, request: Value) -> Value {
        self.send_text(&request.to_string()).await;
        self.recv_json().await
    }

    /// True once the server has closed its side
    pub(crate) async fn is_closed(&mut self) -> bool {
        matches!(self.io.read_buf(&mut self.buf).await, Ok(0) | Err(_))
    }
}
