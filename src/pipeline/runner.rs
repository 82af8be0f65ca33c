//! Drives a request through the ordered stages.

use std::sync::Arc;

use tracing::{error, trace};

use crate::config::ChassisConfig;
use crate::error::{Failure, Normalizer};
use crate::pipeline::context::RequestContext;
use crate::pipeline::stage::{Stage, StageOutcome};
use crate::pipeline::stages::{BodyDecoder, CorsStage, DecodeStage, DispatchStage, Handler, InitStage};

/// The ordered stage chain plus the error path shared by all of them.
///
/// Built once at startup and shared across requests behind an `Arc`;
/// nothing in here is per-request.
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
    normalizer: Normalizer,
}

impl Pipeline {
    pub fn new(stages: Vec<Arc<dyn Stage>>, normalizer: Normalizer) -> Self {
        Self { stages, normalizer }
    }

    /// The canonical chain: CORS headers, envelope initialization, body
    /// decoding, then dispatch to the handler.
    pub fn standard(
        config: &ChassisConfig,
        decoder: Arc<dyn BodyDecoder>,
        handler: Arc<dyn Handler>,
    ) -> Self {
        let stages: Vec<Arc<dyn Stage>> = vec![
            Arc::new(CorsStage::from_config(&config.cors)),
            Arc::new(InitStage::from_config(&config.service)),
            Arc::new(DecodeStage::new(decoder)),
            Arc::new(DispatchStage::new(handler)),
        ];
        Self::new(stages, Normalizer::new(config.api.stack_traces))
    }

    /// Registration order, for logs and diagnostics.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Runs the request to completion.
    ///
    /// Every path ends in exactly one terminal write: a stage completes
    /// the request, a failure is folded into the error envelope, or the
    /// chain is exhausted and treated as an unknown failure. `Err` means
    /// a consistency violation; the transport aborts the request instead
    /// of synthesizing a second response.
    pub async fn run(&self, ctx: &mut RequestContext) -> Result<(), Failure> {
        ctx.enter_processing();

        for stage in &self.stages {
            trace!("running stage {}", stage.name());
            match stage.process(ctx).await {
                StageOutcome::Continue => {
                    if ctx.responded() {
                        let failure = Failure::consistency(format!(
                            "stage {} continued after the terminal write",
                            stage.name()
                        ));
                        error!("aborting request: {failure}");
                        return Err(failure);
                    }
                }
                StageOutcome::Fail(failure) => {
                    trace!("stage {} diverted to the error path", stage.name());
                    return self.normalizer.fail(ctx, failure);
                }
                StageOutcome::Responded => {
                    if !ctx.responded() {
                        let failure = Failure::consistency(format!(
                            "stage {} reported a response that never happened",
                            stage.name()
                        ));
                        error!("aborting request: {failure}");
                        return Err(failure);
                    }
                    return Ok(());
                }
            }
        }

        // No stage completed the request. The dispatch stage normally
        // guarantees completion, so reaching this is itself a malfunction.
        self.normalizer
            .fail(ctx, Failure::unknown_msg("no stage completed the request"))
    }
}
