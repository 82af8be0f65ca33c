//! The stage abstraction the pipeline is composed from.

use async_trait::async_trait;

use crate::error::Failure;
use crate::pipeline::context::RequestContext;

/// What a stage decided about the request.
///
/// Control flow is carried in the value, not in panics or sentinel
/// errors: the runner matches on this to continue, divert to the error
/// path, or stop.
#[derive(Debug)]
pub enum StageOutcome {
    /// Hand the request to the next stage.
    Continue,
    /// Divert to the error path with this failure.
    Fail(Failure),
    /// The terminal write has happened; the pipeline stops here.
    Responded,
}

/// One step in the request pipeline.
///
/// Stages run in registration order, at most once per request, with
/// exclusive access to the context. Implementations hold no per-request
/// state of their own so a single instance serves every request.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable name used in logs and consistency diagnostics.
    fn name(&self) -> &'static str;

    async fn process(&self, ctx: &mut RequestContext) -> StageOutcome;
}
