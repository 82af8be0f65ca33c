//! Folds arbitrary failures into the canonical error envelope.

use axum::http::StatusCode;
use serde_json::{json, Map};
use tracing::{error, warn};

use crate::envelope::Fragment;
use crate::error::Failure;
use crate::observability::metrics;
use crate::pipeline::context::RequestContext;
use crate::pipeline::responder::Responder;

/// Client-facing message for malformed request bodies.
pub const INVALID_BODY_MESSAGE: &str = "The body of your request is invalid.";
/// Client-facing message for failures the server takes the blame for.
pub const SERVER_ERROR_MESSAGE: &str = "The server encountered an unknown error.";
/// Client-facing message for unrecognized handler failures.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred while processing the request.";

/// A failure reduced to the fields the error envelope carries.
///
/// The numeric status never appears inside the `error` object; it travels
/// as the fragment's transport status and as `meta.status`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedError {
    pub id: String,
    pub status: Option<StatusCode>,
    pub message: String,
    pub stack: Vec<String>,
    pub cause: Option<String>,
}

impl NormalizedError {
    /// Renders the error as an envelope fragment. The stack is attached
    /// only when the operator enabled exposure; it is always logged.
    pub fn to_fragment(&self, expose_stack: bool) -> Fragment {
        let mut meta = Map::new();
        meta.insert("success".to_string(), json!(false));
        if let Some(status) = self.status {
            meta.insert("status".to_string(), json!(status.as_u16()));
        }

        let mut error = Map::new();
        error.insert("id".to_string(), json!(self.id));
        error.insert("message".to_string(), json!(self.message));
        if expose_stack && !self.stack.is_empty() {
            error.insert("stack".to_string(), json!(self.stack));
        }

        let payload = json!({ "meta": meta, "error": error });
        match self.status {
            Some(status) => Fragment::with_status(payload, status),
            None => Fragment::new(payload),
        }
    }
}

/// Translates any [`Failure`] into a response and hands it to the terminal
/// responder. Stateless apart from configuration, so one instance serves
/// every request.
#[derive(Debug, Clone)]
pub struct Normalizer {
    expose_stack_traces: bool,
    responder: Responder,
}

impl Normalizer {
    pub fn new(expose_stack_traces: bool) -> Self {
        Self {
            expose_stack_traces,
            responder: Responder::default(),
        }
    }

    /// Completes the request with the canonical envelope for `failure`.
    ///
    /// Consistency violations are not representable as responses; they are
    /// logged and escalated so the transport can abort the request.
    pub fn fail(&self, ctx: &mut RequestContext, failure: Failure) -> Result<(), Failure> {
        metrics::record_failure(failure.kind());

        if failure.is_consistency() {
            error!("aborting request: {failure}");
            return Err(failure);
        }

        ctx.enter_erroring();
        let normalized = self.normalize(&failure);
        let fragment = normalized.to_fragment(self.expose_stack_traces);
        ctx.merge(fragment)?;
        self.responder.complete(ctx)
    }

    /// Reduces a failure to the id, status and message the client will see.
    pub fn normalize(&self, failure: &Failure) -> NormalizedError {
        match failure {
            Failure::Domain {
                id,
                status,
                message,
            } => {
                warn!(code = %id, "request failed: {message}");
                NormalizedError {
                    id: id.clone(),
                    status: *status,
                    message: message.clone(),
                    stack: Vec::new(),
                    cause: None,
                }
            }

            Failure::Decode { status, message } => match status {
                Some(status) if status.is_client_error() => {
                    warn!("rejected request body ({status}): {message}");
                    NormalizedError {
                        id: "invalid_body".to_string(),
                        status: Some(*status),
                        message: INVALID_BODY_MESSAGE.to_string(),
                        stack: Vec::new(),
                        cause: Some(message.clone()),
                    }
                }
                _ => {
                    error!("body decoding failed unexpectedly: {message}");
                    NormalizedError {
                        id: "server_error".to_string(),
                        status: Some(StatusCode::INTERNAL_SERVER_ERROR),
                        message: SERVER_ERROR_MESSAGE.to_string(),
                        stack: Vec::new(),
                        cause: Some(message.clone()),
                    }
                }
            },

            Failure::Unknown { message, .. } => {
                let stack = trace_lines(failure);
                error!(trace = ?stack, "unhandled failure while processing request: {message}");
                NormalizedError {
                    id: "unknown_error".to_string(),
                    status: Some(StatusCode::INTERNAL_SERVER_ERROR),
                    message: UNKNOWN_ERROR_MESSAGE.to_string(),
                    stack,
                    cause: Some(message.clone()),
                }
            }

            // Reached only when called directly; fail() escalates these
            // before normalization.
            Failure::Consistency(detail) => {
                error!("consistency violation treated as server error: {detail}");
                NormalizedError {
                    id: "server_error".to_string(),
                    status: Some(StatusCode::INTERNAL_SERVER_ERROR),
                    message: SERVER_ERROR_MESSAGE.to_string(),
                    stack: Vec::new(),
                    cause: Some(detail.clone()),
                }
            }
        }
    }
}

/// Display text of the failure and its whole source chain, one line per
/// entry, with embedded newlines split out.
fn trace_lines(failure: &Failure) -> Vec<String> {
    let mut lines = Vec::new();
    append_lines(&mut lines, &failure.to_string());
    let mut source = std::error::Error::source(failure);
    while let Some(err) = source {
        append_lines(&mut lines, &err.to_string());
        source = err.source();
    }
    lines
}

fn append_lines(lines: &mut Vec<String>, text: &str) {
    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        // Wrapped errors often repeat their source's message verbatim.
        if lines.last().map(String::as_str) == Some(line) {
            continue;
        }
        lines.push(line.to_string());
    }
}
