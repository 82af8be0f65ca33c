//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use serde_json::json;

use api_chassis::config::ChassisConfig;
use api_chassis::envelope::Fragment;
use api_chassis::error::Failure;
use api_chassis::lifecycle::Shutdown;
use api_chassis::pipeline::{Handler, RequestContext};
use api_chassis::ApiServer;

/// Start a chassis server on an ephemeral loopback port.
///
/// The listener is bound before the server task spawns, so clients can
/// connect immediately. Returns the bound address and the shutdown
/// coordinator; trigger it to stop the server.
pub async fn spawn_chassis(
    config: ChassisConfig,
    handler: Arc<dyn Handler>,
) -> (SocketAddr, Shutdown) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = ApiServer::new(config, handler);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Non-pooled client so each test request opens a fresh connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Config with a recognizable service identity for envelope assertions.
pub fn test_config() -> ChassisConfig {
    let mut config = ChassisConfig::default();
    config.service.name = "petshop".to_string();
    config.service.version = "1.2.3".to_string();
    config
}

/// Handler with one behavior per path, covering the interesting request
/// outcomes.
pub struct ScenarioHandler;

#[async_trait]
impl Handler for ScenarioHandler {
    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), Failure> {
        match ctx.path() {
            "/items" => {
                ctx.merge(Fragment::new(json!({
                    "items": [{ "id": 1, "name": "ball" }, { "id": 2, "name": "bone" }]
                })))?;
                Ok(())
            }
            "/echo" => {
                let body = ctx.body().cloned();
                if let Some(body) = body {
                    ctx.merge(Fragment::new(json!({ "echo": body })))?;
                }
                Ok(())
            }
            "/explode" => Err(Failure::unknown_msg("simulated failure")),
            _ => Err(Failure::domain_with_status(
                "not_found",
                StatusCode::NOT_FOUND,
                "No handler is registered for this path.",
            )),
        }
    }
}
