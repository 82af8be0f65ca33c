//! api-chassis server binary.
//!
//! Boots the chassis with the built-in echo handler: every request is
//! answered with the canonical envelope plus an `echo` section showing
//! what arrived. Replace the handler to build a real API on the same
//! pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use api_chassis::config::{load_config, ChassisConfig};
use api_chassis::envelope::Fragment;
use api_chassis::error::Failure;
use api_chassis::lifecycle::{spawn_signal_listener, Shutdown};
use api_chassis::observability::{init_logging, init_metrics};
use api_chassis::pipeline::{Handler, RequestContext};
use api_chassis::ApiServer;

#[derive(Parser)]
#[command(name = "api-chassis")]
#[command(about = "JSON API server chassis", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

/// Demonstration handler: echoes the request back inside the envelope.
struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), Failure> {
        let mut echo = json!({
            "method": ctx.method().as_str(),
            "path": ctx.path(),
        });
        if let Some(query) = ctx.query() {
            echo["query"] = json!(query);
        }
        if let Some(body) = ctx.body() {
            echo["body"] = body.clone();
        }
        ctx.merge(Fragment::new(json!({ "echo": echo })))?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ChassisConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);

    tracing::info!(
        service = %config.service.name,
        version = %config.service.version,
        "api-chassis starting"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    // Bind TCP listener
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    // Create and run HTTP server
    let server = ApiServer::new(config, Arc::new(EchoHandler));
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
