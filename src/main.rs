use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use concierge::config::Config;
use concierge::signaling::{SESSION_PATH_TEMPLATE, SignalingServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("concierge=info"));
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let ice_servers = config.ice_servers()?;
    let bind_addr = config.listen_addr();

    info!("Concierge v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Sessions served at ws://{}{}", bind_addr, SESSION_PATH_TEMPLATE);

    let server = SignalingServer::bind(&bind_addr, ice_servers).await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
