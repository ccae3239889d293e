//! Registry server listener
//!
//! Handles the TCP accept loop and spawns one task per connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::dispatch::Dispatcher;
use crate::error::Result;
use crate::registry::RegistryStore;
use crate::server::config::ServerConfig;
use crate::server::connection::Connection;
use crate::stats::{ServerMetrics, ServerStats};

/// WebSocket registry server
pub struct RegistryServer {
    config: ServerConfig,
    store: Arc<RegistryStore>,
    dispatcher: Dispatcher,
    metrics: Arc<ServerMetrics>,
    next_session_id: AtomicU64,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl RegistryServer {
    /// Create a new server with an empty registry
    pub fn new(config: ServerConfig) -> Self {
        let store = Arc::new(RegistryStore::with_config(config.registry.clone()));
        Self::with_store(config, store)
    }

    /// Create a new server over an existing store
    pub fn with_store(config: ServerConfig, store: Arc<RegistryStore>) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        let mut dispatcher =
            Dispatcher::new(Arc::clone(&store)).lenient_quotes(config.lenient_quotes);
        if config.notify_changes {
            dispatcher = dispatcher.with_notifications();
        }

        Self {
            config,
            store,
            dispatcher,
            metrics: Arc::new(ServerMetrics::new()),
            next_session_id: AtomicU64::new(1),
            connection_semaphore,
        }
    }

    /// Get a reference to the registry store
    pub fn store(&self) -> &Arc<RegistryStore> {
        &self.store
    }

    /// Current server statistics
    pub fn stats(&self) -> ServerStats {
        self.metrics.snapshot()
    }

    /// Run the server
    ///
    /// This method only returns if the listener cannot be bound.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run the server until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, shutdown).await
    }

    /// Accept connections on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Registry server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = match self.connection_semaphore {
            Some(ref sem) => match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.metrics.connection_refused();
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            },
            None => None,
        };

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::error!(error = %e, "Failed to configure socket");
                return;
            }
        }

        let config = self.config.clone();
        let dispatcher = self.dispatcher.clone();
        let metrics = Arc::clone(&self.metrics);

        tokio::spawn(async move {
            // Released when the connection ends
            let _permit = permit;

            let mut connection =
                Connection::new(session_id, socket, peer_addr, config, dispatcher, metrics);

            if let Err(e) = connection.run().await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Connection error"
                );
            }

            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
