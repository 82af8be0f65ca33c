//! Request capture and identification.
//!
//! # Responsibilities
//! - Assign each request a unique ID (reusing a valid inbound one)
//! - Buffer the body under the configured size limit
//! - Extract the identity facts the pipeline reads (method, path, query,
//!   origin)
//!
//! # Design Decisions
//! - Request ID assigned as early as possible for tracing
//! - Body size limit enforced during the read, not after buffering
//! - Capture never fails the request itself; an unreadable body is
//!   recorded on the RawRequest and reported by the decode stage, so the
//!   error response still carries the usual envelope

use std::net::SocketAddr;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use http_body_util::LengthLimitError;
use tracing::debug;
use uuid::Uuid;

use crate::pipeline::context::{RawBody, RawRequest, UnreadReason};

/// Header carrying the request ID, inbound and outbound.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Converts an inbound HTTP request into the transport-agnostic form the
/// pipeline works on, buffering the body up to `max_body_bytes`.
pub async fn capture_request(
    request: Request<Body>,
    origin: Option<SocketAddr>,
    max_body_bytes: usize,
) -> RawRequest {
    let (parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value).ok())
        .unwrap_or_else(Uuid::new_v4);

    let raw_body = match to_bytes(body, max_body_bytes).await {
        Ok(bytes) => RawBody::Complete(bytes),
        Err(err) => {
            let reason = if is_length_limit(&err) {
                UnreadReason::TooLarge
            } else {
                UnreadReason::Failed
            };
            debug!(request_id = %request_id, "body capture failed: {err}");
            RawBody::Unread {
                reason,
                detail: err.to_string(),
            }
        }
    };

    RawRequest {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        origin,
        request_id,
        headers: parts.headers,
        body: raw_body,
    }
}

/// Distinguishes the size limit tripping from the read itself failing.
/// `to_bytes` boxes the limit error somewhere down the source chain.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    fn request(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn captures_identity_and_body() {
        let raw = capture_request(request("/pets?limit=5", r#"{"a":1}"#), None, 1024).await;

        assert_eq!(raw.method, Method::POST);
        assert_eq!(raw.path, "/pets");
        assert_eq!(raw.query.as_deref(), Some("limit=5"));
        assert_eq!(
            raw.body_bytes().map(|bytes| bytes.as_ref()),
            Some(r#"{"a":1}"#.as_bytes())
        );
    }

    #[tokio::test]
    async fn reuses_a_valid_inbound_request_id() {
        let id = Uuid::new_v4();
        let mut req = request("/pets", "");
        req.headers_mut()
            .insert(X_REQUEST_ID, id.to_string().parse().unwrap());

        let raw = capture_request(req, None, 1024).await;

        assert_eq!(raw.request_id, id);
    }

    #[tokio::test]
    async fn generates_an_id_when_the_inbound_one_is_garbage() {
        let mut req = request("/pets", "");
        req.headers_mut()
            .insert(X_REQUEST_ID, "not-a-uuid".parse().unwrap());

        let raw = capture_request(req, None, 1024).await;

        assert_ne!(raw.request_id.to_string(), "not-a-uuid");
    }

    #[tokio::test]
    async fn oversize_body_is_recorded_not_buffered() {
        let raw = capture_request(request("/pets", "0123456789"), None, 4).await;

        assert!(raw.body_bytes().is_none());
        match &raw.body {
            RawBody::Unread { reason, .. } => assert_eq!(*reason, UnreadReason::TooLarge),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn a_failed_read_is_not_mistaken_for_the_size_limit() {
        let err = axum::Error::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ));

        assert!(!is_length_limit(&err));
    }
}
