//! Cross-origin response headers.

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use tracing::warn;

use crate::config::CorsConfig;
use crate::pipeline::context::RequestContext;
use crate::pipeline::stage::{Stage, StageOutcome};

/// Sets the Access-Control-Allow-* headers on every response.
///
/// Runs first so the headers are present on error responses too. Header
/// values are joined and validated once at construction; requests only
/// pay for a clone.
pub struct CorsStage {
    origin: Option<HeaderValue>,
    methods: Option<HeaderValue>,
    headers: Option<HeaderValue>,
}

impl CorsStage {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            origin: join_values(&config.allowed_origins),
            methods: join_values(&config.allowed_methods),
            headers: join_values(&config.allowed_headers),
        }
    }
}

#[async_trait]
impl Stage for CorsStage {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn process(&self, ctx: &mut RequestContext) -> StageOutcome {
        let pairs = [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, &self.origin),
            (header::ACCESS_CONTROL_ALLOW_METHODS, &self.methods),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, &self.headers),
        ];
        for (name, value) in pairs {
            if let Some(value) = value {
                if let Err(failure) = ctx.insert_response_header(name, value.clone()) {
                    return StageOutcome::Fail(failure);
                }
            }
        }
        StageOutcome::Continue
    }
}

/// Comma-joins the configured values into a single header value. Values
/// that cannot form a valid header are dropped with a warning; config
/// validation reports them before this is ever hit.
fn join_values(parts: &[String]) -> Option<HeaderValue> {
    if parts.is_empty() {
        return None;
    }
    let joined = parts.join(", ");
    match HeaderValue::from_str(&joined) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("dropping CORS header with invalid value: {joined}");
            None
        }
    }
}
