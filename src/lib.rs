//! steelblock - Steel Block Generator
//!
//! Collects housing parameters, turns them into prompts, and relays them to a
//! generative provider for a home description, a floor plan and a 3D render.

pub mod api;
pub mod config;
pub mod design;
pub mod error;
pub mod images;
pub mod openai;
pub mod orchestrator;
pub mod prompts;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

pub use config::Config;
use orchestrator::Orchestrator;

/// The steelblock server instance
pub struct Server {
    config: Config,
    orchestrator: Arc<Orchestrator>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Result<Self> {
        let orchestrator = Orchestrator::shared(&config.provider)?;
        if !orchestrator.is_configured() {
            warn!("No provider API key configured; generation requests will fail");
        }
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            orchestrator,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.orchestrator.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("steelblock listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("steelblock shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    ///
    /// In-flight requests finish before `run` returns.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}
