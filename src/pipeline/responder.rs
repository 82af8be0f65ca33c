//! The single writer of terminal responses.

use std::time::Duration;

use axum::http::StatusCode;
use tracing::{error, info};

use crate::error::Failure;
use crate::observability::metrics;
use crate::pipeline::context::RequestContext;

/// Written when the envelope itself cannot be serialized. The terminal
/// write still has to happen, so this minimal body is prebuilt and known
/// to be valid JSON.
const FALLBACK_BODY: &[u8] = br#"{"meta":{"success":false,"status":500},"error":{"id":"server_error","message":"The server encountered an unknown error."}}"#;

/// Completes a request exactly once.
///
/// Every completion, success or failure, funnels through [`complete`]:
/// it claims the responded flag, stamps `meta.duration`, and serializes
/// the envelope into the buffered response parts. Holding the only call
/// sites for the context's write methods makes a second write a
/// [`Failure::Consistency`] rather than a corrupted response.
///
/// [`complete`]: Responder::complete
#[derive(Debug, Clone, Copy, Default)]
pub struct Responder;

impl Responder {
    pub fn new() -> Self {
        Self
    }

    /// Performs the terminal write for this request.
    ///
    /// Fails only with a consistency violation when the response was
    /// already written; the caller escalates that instead of retrying.
    pub fn complete(&self, ctx: &mut RequestContext) -> Result<(), Failure> {
        ctx.claim_write()?;

        let elapsed = ctx.received_at().elapsed();
        ctx.stamp_duration(&format_duration(elapsed));

        let body = match ctx.envelope().to_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                error!("failed to serialize response envelope: {err}");
                ctx.force_status(StatusCode::INTERNAL_SERVER_ERROR);
                FALLBACK_BODY.to_vec()
            }
        };
        ctx.write_body(body);
        ctx.mark_responded();

        let status = ctx.response_status();
        info!(
            "{} {} -> {} in {}ms",
            ctx.method(),
            ctx.path(),
            status.as_u16(),
            elapsed.as_millis()
        );
        metrics::record_request(ctx.method().as_str(), status.as_u16(), elapsed);
        Ok(())
    }
}

/// Whole milliseconds with the unit attached, e.g. `12ms`.
fn format_duration(elapsed: Duration) -> String {
    format!("{}ms", elapsed.as_millis())
}
