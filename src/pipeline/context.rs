//! Per-request state threaded through the stage pipeline.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use axum::body::Bytes;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use crate::envelope::{Envelope, Fragment};
use crate::error::Failure;

/// Lifecycle of a single request. Responded is absorbing; no transition
/// leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Receiving,
    Processing,
    Erroring,
    Responded,
}

/// Why the transport could not buffer a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnreadReason {
    /// The body exceeded the configured size limit.
    TooLarge,
    /// The read itself failed, e.g. the peer disconnected mid-body.
    Failed,
}

/// The request body as captured at the transport boundary.
#[derive(Debug, Clone)]
pub enum RawBody {
    /// Fully buffered body, possibly empty.
    Complete(Bytes),
    /// The body could not be buffered.
    Unread { reason: UnreadReason, detail: String },
}

/// Immutable facts about the request, fixed at capture time.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub origin: Option<SocketAddr>,
    pub request_id: Uuid,
    pub headers: HeaderMap,
    pub body: RawBody,
}

impl RawRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: None,
            origin: None,
            request_id: Uuid::new_v4(),
            headers: HeaderMap::new(),
            body: RawBody::Complete(Bytes::new()),
        }
    }

    /// Header value as a string, when present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Buffered body bytes, or None when capture failed.
    pub fn body_bytes(&self) -> Option<&Bytes> {
        match &self.body {
            RawBody::Complete(bytes) => Some(bytes),
            RawBody::Unread { .. } => None,
        }
    }
}

/// What the transport needs to emit the HTTP response.
#[derive(Debug, Clone)]
pub struct ResponseParts {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// Everything a stage may read or mutate for one request.
///
/// The context is owned by a single task and passed as `&mut`, so stages
/// never race each other. The responded flag is still atomic: it is the
/// one piece of state whose check-and-set must be indivisible even if a
/// future transport hands the context to cooperating tasks.
#[derive(Debug)]
pub struct RequestContext {
    request: RawRequest,
    received_at: Instant,
    decoded_body: Option<Value>,
    envelope: Envelope,
    parts: ResponseParts,
    responded: AtomicBool,
    state: RequestState,
}

impl RequestContext {
    pub fn new(request: RawRequest) -> Self {
        Self {
            request,
            received_at: Instant::now(),
            decoded_body: None,
            envelope: Envelope::new(),
            parts: ResponseParts::default(),
            responded: AtomicBool::new(false),
            state: RequestState::Receiving,
        }
    }

    pub fn request(&self) -> &RawRequest {
        &self.request
    }

    pub fn method(&self) -> &Method {
        &self.request.method
    }

    pub fn path(&self) -> &str {
        &self.request.path
    }

    pub fn query(&self) -> Option<&str> {
        self.request.query.as_deref()
    }

    pub fn origin(&self) -> Option<SocketAddr> {
        self.request.origin
    }

    pub fn request_id(&self) -> Uuid {
        self.request.request_id
    }

    /// Decoded request body, once the decode stage has run.
    pub fn body(&self) -> Option<&Value> {
        self.decoded_body.as_ref()
    }

    pub fn set_body(&mut self, body: Option<Value>) {
        self.decoded_body = body;
    }

    /// When the request was received. The duration stamped into the
    /// response measures from here to the terminal write.
    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Re-anchors the arrival timestamp, excluding transport queueing from
    /// the measured duration.
    pub fn mark_received(&mut self) {
        self.received_at = Instant::now();
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    pub fn enter_processing(&mut self) {
        self.advance(RequestState::Processing);
    }

    pub fn enter_erroring(&mut self) {
        self.advance(RequestState::Erroring);
    }

    pub(crate) fn mark_responded(&mut self) {
        self.advance(RequestState::Responded);
    }

    fn advance(&mut self, next: RequestState) {
        if self.state == RequestState::Responded {
            return;
        }
        self.state = next;
    }

    /// Whether the terminal write has happened.
    pub fn responded(&self) -> bool {
        self.responded.load(Ordering::SeqCst)
    }

    /// Claims the single terminal write. Exactly one caller per request
    /// wins; every later attempt is a consistency violation.
    pub(crate) fn claim_write(&self) -> Result<(), Failure> {
        self.responded
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|_| Failure::consistency("a second terminal write was attempted"))
    }

    /// Merges a fragment into the envelope and applies its transport
    /// status. Rejected once the response has been written.
    pub fn merge(&mut self, fragment: Fragment) -> Result<(), Failure> {
        if self.responded() {
            return Err(Failure::consistency(format!(
                "fragment offered after the response was written ({} {})",
                self.request.method, self.request.path
            )));
        }
        let (payload, status) = fragment.into_parts();
        self.envelope.absorb(payload);
        if let Some(status) = status {
            self.parts.status = status;
        }
        Ok(())
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Sets a response header. Headers are part of the response and so
    /// fall under the same no-mutation-after-write rule as the envelope.
    pub fn insert_response_header(
        &mut self,
        name: HeaderName,
        value: HeaderValue,
    ) -> Result<(), Failure> {
        if self.responded() {
            return Err(Failure::consistency(
                "header set after the response was written",
            ));
        }
        self.parts.headers.insert(name, value);
        Ok(())
    }

    pub fn response_status(&self) -> StatusCode {
        self.parts.status
    }

    pub(crate) fn stamp_duration(&mut self, text: &str) {
        self.envelope
            .put_meta("duration", Value::String(text.to_string()));
    }

    pub(crate) fn force_status(&mut self, status: StatusCode) {
        self.parts.status = status;
    }

    pub(crate) fn write_body(&mut self, bytes: Vec<u8>) {
        self.parts.headers.insert(
            axum::http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.parts.body = Some(bytes);
    }

    /// Consumes the context, yielding what the transport writes out.
    pub fn into_parts(self) -> ResponseParts {
        self.parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> RequestContext {
        RequestContext::new(RawRequest::new(Method::GET, "/things"))
    }

    #[test]
    fn merge_applies_payload_and_status() {
        let mut ctx = context();

        ctx.merge(Fragment::with_status(
            json!({ "meta": { "success": true } }),
            StatusCode::CREATED,
        ))
        .unwrap();

        assert_eq!(ctx.response_status(), StatusCode::CREATED);
        assert_eq!(
            ctx.envelope().get("meta"),
            Some(&json!({ "success": true }))
        );
    }

    #[test]
    fn merge_after_write_is_a_consistency_failure() {
        let mut ctx = context();
        ctx.claim_write().unwrap();

        let result = ctx.merge(Fragment::new(json!({ "late": true })));

        assert!(matches!(result, Err(Failure::Consistency(_))));
        assert_eq!(ctx.envelope().get("late"), None);
    }

    #[test]
    fn second_write_claim_is_rejected() {
        let ctx = context();

        assert!(ctx.claim_write().is_ok());
        assert!(matches!(ctx.claim_write(), Err(Failure::Consistency(_))));
    }

    #[test]
    fn responded_state_is_absorbing() {
        let mut ctx = context();
        ctx.enter_processing();
        ctx.mark_responded();

        ctx.enter_erroring();

        assert_eq!(ctx.state(), RequestState::Responded);
    }

    #[test]
    fn headers_are_frozen_after_the_write() {
        let mut ctx = context();
        ctx.claim_write().unwrap();

        let result = ctx.insert_response_header(
            HeaderName::from_static("x-late"),
            HeaderValue::from_static("too late"),
        );

        assert!(matches!(result, Err(Failure::Consistency(_))));
    }
}
