//! Response emission.
//!
//! # Responsibilities
//! - Convert the pipeline's buffered ResponseParts into the transport
//!   response
//! - Carry over the status and headers the stages set
//!
//! # Design Decisions
//! - The pipeline never touches transport types; this is the only place
//!   the buffered parts become an HTTP response
//! - Conversion is infallible; everything fallible happened before the
//!   terminal write

use axum::body::Body;
use axum::http::Response;

use crate::pipeline::context::ResponseParts;

/// Builds the wire response from the parts the terminal responder filled.
pub fn emit_response(parts: ResponseParts) -> Response<Body> {
    let mut response = Response::new(Body::from(parts.body.unwrap_or_default()));
    *response.status_mut() = parts.status;
    *response.headers_mut() = parts.headers;
    response
}
