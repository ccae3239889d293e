//! Registry server preloaded with a sample entry
//!
//! Run with: cargo run --example simple_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example simple_server                    # binds to 0.0.0.0:10101
//!   cargo run --example simple_server localhost          # binds to 127.0.0.1:10101
//!   cargo run --example simple_server 127.0.0.1:10110    # binds to 127.0.0.1:10110
//!
//! ## Talking to it
//!
//! With websocat:
//!   websocat ws://localhost:10101
//!   {"request": "list"}
//!   {"request": "register", "entry": {"id": "<uuid>", "name": "cam", "topic": "camera",
//!     "type": "streamer", "address": "127.0.0.1:10102"}}
//!
//! Change notifications are enabled, so a second websocat session sees
//! `registered` / `unregistered` / `address-updated` events.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;
use wsregistry::{Address, EntryType, RegistryEntry, RegistryServer, ServerConfig};

fn parse_bind_addr(s: &str) -> Result<SocketAddr, String> {
    if s == "localhost" {
        return Ok(SocketAddr::from(([127, 0, 0, 1], 10101)));
    }
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = s.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, 10101));
    }
    Err(format!("invalid bind address: {}", s))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = match std::env::args().nth(1) {
        Some(arg) => parse_bind_addr(&arg)?,
        None => SocketAddr::from(([0, 0, 0, 0], 10101)),
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("wsregistry=debug".parse()?)
                .add_directive("simple_server=debug".parse()?),
        )
        .init();

    let config = ServerConfig::with_addr(bind_addr).notify_changes(true);
    let server = Arc::new(RegistryServer::new(config));

    // The registry announces itself like any other endpoint
    let this = RegistryEntry::new(
        Uuid::new_v4(),
        "simple_server",
        "registry.demo",
        EntryType::Service,
        Address::new(bind_addr.ip().to_string(), bind_addr.port()).with_scheme("ws"),
    );
    server.store().register(this).await?;

    println!("Registry listening on ws://{}", bind_addr);

    // Periodic stats
    let stats_server = Arc::clone(&server);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(30));
        loop {
            interval.tick().await;
            let stats = stats_server.stats();
            let entries = stats_server.store().len().await;
            tracing::info!(
                active = stats.active_connections,
                total = stats.total_connections,
                messages = stats.messages_handled,
                entries = entries,
                "Registry stats"
            );
        }
    });

    server
        .run_until(async {
            let _ = tokio::signal::ctrl_c().await;
            println!("\nShutting down...");
        })
        .await?;

    Ok(())
}
