use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use http_balancer::{Config, LoadBalancer, ServerRegistry};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().context("Failed to load configuration")?;

    let registry = Arc::new(ServerRegistry::new());
    for server in &config.servers {
        registry.add_server(server.as_str());
    }
    if config.shuffle_on_start {
        registry.shuffle();
    }

    info!("Available servers: {:?}", registry.servers());
    info!("Proximity metric: {}", registry.metric_name());

    let load_balancer = LoadBalancer::new(&config, registry);
    for (path, algorithm) in load_balancer.paths() {
        info!("Route {} -> {}", path, algorithm);
    }

    info!("Starting HTTP Load Balancer...");
    load_balancer
        .start()
        .await
        .map_err(|e| anyhow!("HTTP server error: {}", e))?;

    Ok(())
}
