//! Meshsim node binary
//!
//! Hosts the mesh peer simulator behind the control-plane HTTP API.

use std::sync::Arc;

use meshsim_core::MeshSim;
use meshsim_server::{build_router, NodeConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshsim_server=info,meshsim_core=info,meshsim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = NodeConfig::from_env();

    tracing::info!("Starting meshsim node");
    tracing::info!("  HTTP: http://{}", config.http_addr);
    tracing::info!("  Tick: {:?}", config.sim.tick_interval);
    tracing::info!("  Range: {}m", config.sim.max_range_m);

    let sim = Arc::new(MeshSim::start(config.sim.clone()));
    let app = build_router(sim);

    let listener = tokio::net::TcpListener::bind(config.http_addr).await?;
    tracing::info!("HTTP server listening on {}", config.http_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
