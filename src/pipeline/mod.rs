//! The request pipeline.
//!
//! # Data Flow
//! ```text
//! Transport captures RawRequest
//!     → RequestContext created (Receiving)
//!     → Pipeline::run walks the stages in order (Processing)
//!         cors → init → decode → dispatch
//!     → a stage fails: Normalizer folds the failure, responder writes
//!       (Erroring → Responded)
//!     → dispatch succeeds: responder writes (→ Responded)
//! Transport converts the buffered ResponseParts into the HTTP response
//! ```
//!
//! # Design Decisions
//! - Stages communicate through [`StageOutcome`] values; the runner owns
//!   all control flow
//! - The context moves as `&mut`, so a stage can never observe another
//!   stage's half-finished mutation
//! - Exactly one terminal write per request, claimed through an atomic
//!   flag; violations abort the request rather than racing the client

pub mod context;
pub mod responder;
pub mod runner;
pub mod stage;
pub mod stages;

pub use context::{RawBody, RawRequest, RequestContext, RequestState, ResponseParts, UnreadReason};
pub use responder::Responder;
pub use runner::Pipeline;
pub use stage::{Stage, StageOutcome};
pub use stages::{BodyDecoder, DecodeFailure, Handler, JsonDecoder};
