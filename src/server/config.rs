//! Server configuration

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use crate::protocol::constants::*;
use crate::registry::RegistryConfig;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent connections (0 = unlimited)
    pub max_connections: usize,

    /// The opening handshake must complete within this time
    pub handshake_timeout: Duration,

    /// Close an open connection after this long without a frame (None = never)
    pub idle_timeout: Option<Duration>,

    /// Enable TCP_NODELAY (disable Nagle's algorithm)
    pub tcp_nodelay: bool,

    /// Application-level read buffer size
    pub read_buffer_size: usize,

    /// Largest accepted handshake request head
    pub max_header_size: usize,

    /// Largest accepted message payload
    pub max_message_size: usize,

    /// Broadcast registry changes to other connections
    pub notify_changes: bool,

    /// Retry single-quoted JSON with double quotes
    pub lenient_quotes: bool,

    /// Registry store options
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            max_connections: 0, // Unlimited
            handshake_timeout: Duration::from_secs(10),
            idle_timeout: None,
            tcp_nodelay: true,
            read_buffer_size: 8 * 1024,
            max_header_size: DEFAULT_MAX_HEADER_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            notify_changes: false,
            lenient_quotes: true,
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum connections
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set handshake timeout
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set the largest accepted message payload
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size.max(MAX_CONTROL_PAYLOAD as usize);
        self
    }

    /// Broadcast registry changes to other connections
    pub fn notify_changes(mut self, enabled: bool) -> Self {
        self.notify_changes = enabled;
        self
    }

    /// Enable or disable the single-quote JSON retry
    pub fn lenient_quotes(mut self, enabled: bool) -> Self {
        self.lenient_quotes = enabled;
        self
    }

    /// Set registry options
    pub fn registry(mut self, registry: RegistryConfig) -> Self {
        self.registry = registry;
        self
    }
}
