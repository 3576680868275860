//! Main application entry point for dnstally.

use crate::api;
use crate::core::{Config, Result};
use crate::metrics::{Rotator, Statistics};
use std::sync::Arc;

/// Wires the statistics engine, its rotation driver and the HTTP surface.
pub struct Application {
    /// Shared statistics engine
    stats: Arc<Statistics>,
    /// Application configuration
    config: Config,
}

impl Application {
    /// Create a new Application with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let stats = Arc::new(Statistics::new(&config.exporter)?);
        Ok(Self { stats, config })
    }

    /// Handle for producers recording filtering decisions.
    pub fn stats(&self) -> &Arc<Statistics> {
        &self.stats
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Rotate buckets and serve the API until ctrl-c.
    pub async fn run(self) -> Result<()> {
        tracing::info!("Starting dnstally");

        let rotator = Rotator::spawn(
            Arc::clone(self.stats.windows()),
            self.config.stats.rotation_interval,
        );

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal, stopping...");
        };

        let result =
            api::start_server(Arc::clone(&self.stats), self.config.server.clone(), shutdown).await;

        rotator.stop();
        result
    }
}
