//! Session state machine
//!
//! Tracks a WebSocket session from TCP accept to close.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// TCP connected, no bytes read yet
    Connected,
    /// Reading the upgrade request
    Handshaking,
    /// Upgrade accepted, exchanging messages
    Open,
    /// Close frame sent or received
    Closing,
    /// Session closed
    Closed,
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Time when the upgrade was accepted
    pub opened_at: Option<Instant>,

    /// Time of the last received frame
    pub last_activity: Instant,

    /// Bytes received
    pub bytes_received: u64,

    /// Bytes sent
    pub bytes_sent: u64,

    /// Text messages handled
    pub messages: u64,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        let now = Instant::now();
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Connected,
            connected_at: now,
            opened_at: None,
            last_activity: now,
            bytes_received: 0,
            bytes_sent: 0,
            messages: 0,
        }
    }

    /// Transition to handshaking phase
    pub fn start_handshake(&mut self) {
        if self.phase == SessionPhase::Connected {
            self.phase = SessionPhase::Handshaking;
        }
    }

    /// Upgrade accepted
    pub fn open(&mut self) {
        if self.phase == SessionPhase::Handshaking {
            self.phase = SessionPhase::Open;
            self.opened_at = Some(Instant::now());
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn add_bytes_received(&mut self, bytes: usize) {
        self.bytes_received += bytes as u64;
    }

    pub fn add_bytes_sent(&mut self, bytes: usize) {
        self.bytes_sent += bytes as u64;
    }

    /// Get session duration
    pub fn duration(&self) -> Duration {
        self.connected_at.elapsed()
    }

    /// Check if messages may be exchanged
    pub fn is_open(&self) -> bool {
        self.phase == SessionPhase::Open
    }

    /// Start closing the session
    pub fn close(&mut self) {
        if self.phase != SessionPhase::Closed {
            self.phase = SessionPhase::Closing;
        }
    }

    pub fn finish(&mut self) {
        self.phase = SessionPhase::Closed;
    }
}
