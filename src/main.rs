use std::net::{IpAddr, SocketAddr};

use clap::Parser;
use tokio::signal;

use wsregistry::protocol::constants::DEFAULT_PORT;
use wsregistry::{RegistryServer, ServerConfig};

/// Service registry served over WebSocket
#[derive(Parser, Debug)]
#[command(name = "wsregistry")]
#[command(version)]
struct Cli {
    /// Port to listen on
    #[arg(short = 'P', long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Maximum concurrent connections (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_connections: usize,

    /// Broadcast registry changes to connected clients
    #[arg(long)]
    notify: bool,

    /// Reject single-quoted JSON instead of retrying it
    #[arg(long)]
    strict_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wsregistry=info".parse()?),
        )
        .init();

    let config = ServerConfig::with_addr(SocketAddr::new(cli.bind, cli.port))
        .max_connections(cli.max_connections)
        .notify_changes(cli.notify)
        .lenient_quotes(!cli.strict_json);

    let server = RegistryServer::new(config);
    server.run_until(shutdown_signal()).await?;

    let stats = server.stats();
    tracing::info!(
        connections = stats.total_connections,
        messages = stats.messages_handled,
        uptime_secs = stats.uptime.as_secs(),
        "Registry stopped"
    );

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Error handling Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        _ = terminate => tracing::info!("Received SIGTERM signal"),
    }
}
