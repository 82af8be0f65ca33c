//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all pipeline handler
//! - Wire up middleware (tracing, timeouts)
//! - Bind the server to a listener
//! - Capture each request and run it through the stage pipeline
//! - Emit the buffered response the pipeline produced

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ChassisConfig, LimitsConfig};
use crate::http::request::capture_request;
use crate::http::response::emit_response;
use crate::pipeline::context::RequestContext;
use crate::pipeline::stages::{BodyDecoder, Handler, JsonDecoder};
use crate::pipeline::Pipeline;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub limits: LimitsConfig,
}

/// HTTP server hosting the request pipeline.
pub struct ApiServer {
    router: Router,
    config: ChassisConfig,
}

impl ApiServer {
    /// Create a server with the default JSON body decoder.
    pub fn new(config: ChassisConfig, handler: Arc<dyn Handler>) -> Self {
        Self::with_decoder(config, Arc::new(JsonDecoder), handler)
    }

    /// Create a server with a custom body decoder.
    pub fn with_decoder(
        config: ChassisConfig,
        decoder: Arc<dyn BodyDecoder>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let pipeline = Arc::new(Pipeline::standard(&config, decoder, handler));
        tracing::debug!(stages = ?pipeline.stage_names(), "pipeline assembled");

        let state = AppState {
            pipeline,
            limits: config.limits.clone(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ChassisConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(pipeline_handler))
            .route("/", any(pipeline_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(TimeoutLayer::new(Duration::from_secs(
                        config.timeouts.request_secs,
                    ))),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            version = %self.config.service.version,
            "API server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("API server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ChassisConfig {
        &self.config
    }
}

/// Catch-all handler. Every request, any method and path, is captured
/// and run through the stage pipeline; the response comes out of the
/// buffered parts the terminal responder filled.
async fn pipeline_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let raw = capture_request(request, Some(addr), state.limits.max_body_bytes).await;
    let mut ctx = RequestContext::new(raw);

    if let Err(failure) = state.pipeline.run(&mut ctx).await {
        tracing::error!("request aborted: {failure}");
        // A consistency violation before any write leaves nothing usable
        // in the parts; answer with a bare 500 rather than an empty 200.
        if !ctx.responded() {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    emit_response(ctx.into_parts())
}
