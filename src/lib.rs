//! JSON API server chassis.
//!
//! A configurable request-handling core: every request runs through an
//! ordered stage pipeline that accumulates a single JSON envelope, any
//! failure is folded into a canonical error shape, and exactly one
//! terminal write produces the response.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌───────────────────────────────────────────────┐
//!                    │                  API CHASSIS                  │
//!                    │                                               │
//!  Client Request    │  ┌────────┐   ┌──────────────────────────┐    │
//!  ──────────────────┼─▶│  http  │──▶│        pipeline          │    │
//!                    │  │ server │   │ cors → init → decode →   │    │
//!                    │  └────────┘   │        dispatch          │    │
//!                    │       ▲       └──────┬───────────┬───────┘    │
//!                    │       │              │ fragments │ failures   │
//!                    │       │              ▼           ▼            │
//!                    │  ┌────────┐   ┌──────────┐  ┌──────────┐      │
//!  Client Response   │  │response│◀──│ envelope │◀─│  error   │      │
//!  ◀─────────────────┼──│  emit  │   │accumulate│  │normalize │      │
//!                    │  └────────┘   └──────────┘  └──────────┘      │
//!                    │                                               │
//!                    │  ┌─────────────────────────────────────────┐  │
//!                    │  │         Cross-Cutting Concerns          │  │
//!                    │  │  config   observability   lifecycle     │  │
//!                    │  └─────────────────────────────────────────┘  │
//!                    └───────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;

pub use config::{load_config, ChassisConfig};
pub use envelope::{Envelope, Fragment};
pub use error::{Failure, NormalizedError, Normalizer};
pub use http::ApiServer;
pub use lifecycle::Shutdown;
pub use pipeline::{
    BodyDecoder, Handler, JsonDecoder, Pipeline, RawRequest, RequestContext, RequestState, Stage,
    StageOutcome,
};
