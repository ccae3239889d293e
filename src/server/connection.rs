//! Per-connection handler
//!
//! Drives one client from the opening handshake to close:
//!
//! ```text
//! read request head ─► 400 + close          (rejected)
//!        │
//!        └─► 101 ─► frame loop ─► Text  → dispatch → Text response
//!                        │         Ping  → Pong
//!                        │         Close → echo Close
//!                        │         other → Close with status code
//!                        ├─ change notifications (optional)
//!                        └─ idle timeout → Close 1001
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::timeout;

use crate::dispatch::{Dispatcher, Notification};
use crate::error::{Error, FrameError, Result};
use crate::protocol::constants::CLOSE_GOING_AWAY;
use crate::protocol::frame::{close_frame, encode_frame, text_frame};
use crate::protocol::{Frame, FrameDecoder, Handshake, HandshakeOutcome, OpCode};
use crate::server::config::ServerConfig;
use crate::session::SessionState;
use crate::stats::{ServerMetrics, SessionStats};

/// What woke the message loop
enum Wake {
    Read(std::io::Result<usize>),
    Notify(std::result::Result<Notification, RecvError>),
    Idle,
}

/// A single client connection
pub struct Connection<S> {
    stream: S,
    state: SessionState,
    config: ServerConfig,
    dispatcher: Dispatcher,
    metrics: Arc<ServerMetrics>,
    decoder: FrameDecoder,
    read_buf: BytesMut,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        session_id: u64,
        stream: S,
        peer_addr: SocketAddr,
        config: ServerConfig,
        dispatcher: Dispatcher,
        metrics: Arc<ServerMetrics>,
    ) -> Self {
        let decoder = FrameDecoder::with_max_message_size(config.max_message_size);
        let read_buf = BytesMut::with_capacity(config.read_buffer_size);

        Self {
            stream,
            state: SessionState::new(session_id, peer_addr),
            config,
            dispatcher,
            metrics,
            decoder,
            read_buf,
        }
    }

    /// Session ID
    pub fn id(&self) -> u64 {
        self.state.id
    }

    /// Run the connection to completion
    ///
    /// Returns `Ok(())` on an orderly close (Close handshake, EOF or idle
    /// timeout) and an error for rejected handshakes and protocol violations.
    pub async fn run(&mut self) -> Result<()> {
        self.metrics.connection_opened();
        let result = self.run_inner().await;
        self.metrics.connection_closed();

        self.state.finish();
        let stats = SessionStats::from(&self.state);
        tracing::debug!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            bytes_received = stats.bytes_received,
            bytes_sent = stats.bytes_sent,
            messages = stats.messages,
            duration_ms = stats.duration.as_millis() as u64,
            "Session ended"
        );

        result
    }

    async fn run_inner(&mut self) -> Result<()> {
        self.state.start_handshake();

        match timeout(self.config.handshake_timeout, self.handshake()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::debug!(session_id = self.state.id, "Handshake timed out");
                return Err(Error::Timeout);
            }
        }

        self.state.open();
        self.message_loop().await
    }

    async fn handshake(&mut self) -> Result<()> {
        let mut handshake = Handshake::with_max_header_size(self.config.max_header_size);

        loop {
            if let Some(outcome) = handshake.process(&mut self.read_buf) {
                self.write(&outcome.response()).await?;

                return match outcome {
                    HandshakeOutcome::Accept { .. } => {
                        tracing::debug!(
                            session_id = self.state.id,
                            peer = %self.state.peer_addr,
                            "Upgrade accepted"
                        );
                        Ok(())
                    }
                    HandshakeOutcome::Reject(e) => {
                        self.metrics.handshake_rejected();
                        tracing::warn!(
                            session_id = self.state.id,
                            peer = %self.state.peer_addr,
                            error = %e,
                            "Upgrade rejected"
                        );
                        let _ = self.stream.shutdown().await;
                        Err(e.into())
                    }
                };
            }

            if self.read().await? == 0 {
                return Err(Error::ConnectionClosed);
            }
        }
    }

    async fn message_loop(&mut self) -> Result<()> {
        let mut notifications = self.dispatcher.subscribe();

        loop {
            // Drain complete frames before waiting for more input
            match self.decoder.decode(&mut self.read_buf) {
                Ok(Some(frame)) => {
                    if !self.handle_frame(frame).await? {
                        return Ok(());
                    }
                    continue;
                }
                Ok(None) => {}
                Err(e) => return self.fail(e).await,
            }

            let idle_deadline = self
                .config
                .idle_timeout
                .map(|idle| self.state.last_activity + idle);

            self.read_buf.reserve(self.config.read_buffer_size);
            let wake = tokio::select! {
                n = self.stream.read_buf(&mut self.read_buf) => Wake::Read(n),
                note = next_notification(&mut notifications) => Wake::Notify(note),
                _ = idle(idle_deadline) => Wake::Idle,
            };

            match wake {
                Wake::Read(Ok(0)) => {
                    tracing::debug!(session_id = self.state.id, "Peer closed connection");
                    return Ok(());
                }
                Wake::Read(Ok(n)) => {
                    self.state.add_bytes_received(n);
                    self.state.touch();
                }
                Wake::Read(Err(e)) => return Err(e.into()),
                Wake::Notify(Ok(note)) => {
                    if note.origin != self.state.id {
                        self.write(&text_frame(&note.payload)).await?;
                    }
                }
                Wake::Notify(Err(RecvError::Lagged(skipped))) => {
                    tracing::warn!(
                        session_id = self.state.id,
                        skipped = skipped,
                        "Notification receiver lagged"
                    );
                }
                Wake::Notify(Err(RecvError::Closed)) => notifications = None,
                Wake::Idle => {
                    tracing::debug!(session_id = self.state.id, "Idle timeout");
                    self.state.close();
                    self.write(&close_frame(Some(CLOSE_GOING_AWAY))).await?;
                    let _ = self.stream.shutdown().await;
                    return Ok(());
                }
            }
        }
    }

    /// Handle one frame; returns false once the connection should end
    async fn handle_frame(&mut self, frame: Frame) -> Result<bool> {
        match frame.opcode {
            OpCode::Text if frame.fin => {
                let text = match std::str::from_utf8(&frame.payload) {
                    Ok(text) => text,
                    Err(_) => return self.fail(FrameError::InvalidUtf8).await.map(|_| false),
                };

                let response = self.dispatcher.handle_text(self.state.id, text).await;
                self.state.messages += 1;
                self.metrics.message_handled();

                self.write(&text_frame(&response.to_json())).await?;
                Ok(true)
            }
            OpCode::Text | OpCode::Continuation => {
                self.fail(FrameError::Fragmented).await.map(|_| false)
            }
            OpCode::Binary => self
                .fail(FrameError::Unsupported(OpCode::Binary))
                .await
                .map(|_| false),
            OpCode::Ping => {
                let mut pong = BytesMut::with_capacity(2 + frame.payload.len());
                encode_frame(OpCode::Pong, &frame.payload, &mut pong);
                self.write(&pong).await?;
                Ok(true)
            }
            OpCode::Pong => Ok(true),
            OpCode::Close => {
                let code = frame.close_code();
                tracing::debug!(session_id = self.state.id, code = ?code, "Close received");

                self.state.close();
                self.write(&close_frame(code)).await?;
                let _ = self.stream.shutdown().await;
                Ok(false)
            }
        }
    }

    /// Send a Close with the error's status code and end the connection
    async fn fail(&mut self, error: FrameError) -> Result<()> {
        tracing::warn!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            error = %error,
            "Protocol violation"
        );

        self.state.close();
        let _ = self.write(&close_frame(Some(error.close_code()))).await;
        let _ = self.stream.shutdown().await;
        Err(error.into())
    }

    async fn read(&mut self) -> Result<usize> {
        self.read_buf.reserve(self.config.read_buffer_size);
        let n = self.stream.read_buf(&mut self.read_buf).await?;
        self.state.add_bytes_received(n);
        Ok(n)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        self.stream.flush().await?;
        self.state.add_bytes_sent(bytes.len());
        Ok(())
    }
}

async fn next_notification(
    rx: &mut Option<broadcast::Receiver<Notification>>,
) -> std::result::Result<Notification, RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn idle(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}
