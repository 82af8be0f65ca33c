//! Envelope initialization.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::config::ServiceConfig;
use crate::envelope::Fragment;
use crate::pipeline::context::RequestContext;
use crate::pipeline::stage::{Stage, StageOutcome};

/// Seeds the envelope with the service identity and anchors the request
/// timer.
///
/// Runs before decoding and dispatch so that every response, including
/// error responses produced further down the chain, carries `meta.name`
/// and `meta.version`.
pub struct InitStage {
    name: String,
    version: String,
}

impl InitStage {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            name: config.name.clone(),
            version: config.version.clone(),
        }
    }
}

#[async_trait]
impl Stage for InitStage {
    fn name(&self) -> &'static str {
        "init"
    }

    async fn process(&self, ctx: &mut RequestContext) -> StageOutcome {
        ctx.mark_received();

        let origin = ctx
            .origin()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        info!(
            method = %ctx.method(),
            path = %ctx.path(),
            origin = %origin,
            request_id = %ctx.request_id(),
            "incoming request"
        );

        let fragment = Fragment::new(json!({
            "meta": { "name": self.name, "version": self.version }
        }));
        match ctx.merge(fragment) {
            Ok(()) => StageOutcome::Continue,
            Err(failure) => StageOutcome::Fail(failure),
        }
    }
}
