//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware layers)
//!     → request.rs (capture: request ID, body buffering, size limit)
//!     → pipeline (stages produce the envelope and buffered parts)
//!     → response.rs (emit the buffered parts to the client)
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{capture_request, X_REQUEST_ID};
pub use response::emit_response;
pub use server::{ApiServer, AppState};
