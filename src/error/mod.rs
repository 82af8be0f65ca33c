//! Failure taxonomy and normalization.
//!
//! # Data Flow
//! ```text
//! Stage or handler fails
//!     → Failure (tagged: domain / decode / unknown / consistency)
//!     → Normalizer folds it into a NormalizedError
//!     → error fragment merged into the envelope (status to meta.status)
//!     → terminal responder writes the envelope
//! Consistency failures skip normalization and abort the request instead.
//! ```
//!
//! # Design Decisions
//! - One enum, resolved by pattern match rather than runtime type inspection
//! - Client-visible payloads carry only stable fields (id, message, stack);
//!   the numeric status lives in meta.status alone
//! - Traces always reach the log; they reach the client only when the
//!   operator enabled exposure

pub mod failure;
pub mod normalizer;

pub use failure::Failure;
pub use normalizer::{NormalizedError, Normalizer};
