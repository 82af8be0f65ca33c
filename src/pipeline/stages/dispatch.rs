//! Handler dispatch and success completion.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Failure;
use crate::pipeline::context::RequestContext;
use crate::pipeline::responder::Responder;
use crate::pipeline::stage::{Stage, StageOutcome};

/// Application logic plugged into the end of the chain.
///
/// Handlers contribute to the response by merging fragments into the
/// context and report failures by returning them. Completion is not
/// theirs to perform; the dispatch stage writes the response after a
/// handler returns cleanly.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &mut RequestContext) -> Result<(), Failure>;
}

/// Terminal stage: runs the handler and completes the request.
pub struct DispatchStage {
    handler: Arc<dyn Handler>,
    responder: Responder,
}

impl DispatchStage {
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            responder: Responder::new(),
        }
    }
}

#[async_trait]
impl Stage for DispatchStage {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn process(&self, ctx: &mut RequestContext) -> StageOutcome {
        match self.handler.handle(ctx).await {
            Ok(()) => match self.responder.complete(ctx) {
                Ok(()) => StageOutcome::Responded,
                Err(failure) => StageOutcome::Fail(failure),
            },
            Err(failure) => StageOutcome::Fail(failure),
        }
    }
}
