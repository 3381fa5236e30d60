//! steelblock - Steel Block Generator server

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use steelblock::{Config, Server};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Steel Block Generator server
#[derive(Parser, Debug)]
#[command(name = "steelblock", version, about = "Serve the Steel Block Generator")]
struct Args {
    /// Address to listen on (overrides config)
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Path to TOML config file (default: steelblock.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "steelblock=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    // Create and run server
    let server = Arc::new(Server::new(config)?);

    tokio::spawn({
        let server = server.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down");
                    server.shutdown();
                }
                Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
            }
        }
    });

    server.run().await?;

    Ok(())
}
