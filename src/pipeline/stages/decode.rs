//! Request body decoding.

use async_trait::async_trait;
use axum::http::{header, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use tracing::warn;

use crate::error::Failure;
use crate::pipeline::context::{RawBody, RawRequest, RequestContext, UnreadReason};
use crate::pipeline::stage::{Stage, StageOutcome};

/// Why a body could not be decoded.
///
/// A client-class status marks the input itself as invalid; the
/// normalizer masks anything else as a server error.
#[derive(Debug)]
pub struct DecodeFailure {
    pub status: Option<StatusCode>,
    pub message: String,
}

impl DecodeFailure {
    pub fn new(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Malformed input, the client's fault.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(Some(StatusCode::BAD_REQUEST), message)
    }
}

impl From<DecodeFailure> for Failure {
    fn from(failure: DecodeFailure) -> Self {
        Failure::decode(failure.status, failure.message)
    }
}

/// Turns raw body bytes into a structured value.
///
/// Swappable so deployments can accept other encodings; the chassis
/// ships with [`JsonDecoder`].
#[async_trait]
pub trait BodyDecoder: Send + Sync {
    /// Decodes the buffered body. `Ok(None)` means there was nothing for
    /// this decoder to do, which is not an error.
    async fn decode(&self, request: &RawRequest) -> Result<Option<Value>, DecodeFailure>;
}

/// Strict JSON decoding for requests that declare a JSON content type.
///
/// Bodies without a JSON content type pass through undecoded rather than
/// failing, mirroring how content-type driven body parsers behave.
pub struct JsonDecoder;

#[async_trait]
impl BodyDecoder for JsonDecoder {
    async fn decode(&self, request: &RawRequest) -> Result<Option<Value>, DecodeFailure> {
        let bytes = match request.body_bytes() {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        if bytes.is_empty() || !declares_json(request) {
            return Ok(None);
        }
        serde_json::from_slice(bytes)
            .map(Some)
            .map_err(|err| DecodeFailure::invalid(err.to_string()))
    }
}

fn declares_json(request: &RawRequest) -> bool {
    request
        .header(header::CONTENT_TYPE.as_str())
        .map(|value| value.to_ascii_lowercase().contains("json"))
        .unwrap_or(false)
}

/// Runs the configured decoder and stores the result on the context.
///
/// A body the transport could not buffer fails here rather than at
/// capture time, so the envelope already carries the service identity
/// when the error is rendered. Hitting the size limit keeps 413; a read
/// that failed outright carries no status and is masked downstream.
pub struct DecodeStage {
    decoder: Arc<dyn BodyDecoder>,
}

impl DecodeStage {
    pub fn new(decoder: Arc<dyn BodyDecoder>) -> Self {
        Self { decoder }
    }
}

#[async_trait]
impl Stage for DecodeStage {
    fn name(&self) -> &'static str {
        "decode"
    }

    async fn process(&self, ctx: &mut RequestContext) -> StageOutcome {
        if let RawBody::Unread { reason, detail } = &ctx.request().body {
            warn!("request body was not captured: {detail}");
            let status = match reason {
                UnreadReason::TooLarge => Some(StatusCode::PAYLOAD_TOO_LARGE),
                UnreadReason::Failed => None,
            };
            return StageOutcome::Fail(Failure::decode(status, detail.clone()));
        }

        match self.decoder.decode(ctx.request()).await {
            Ok(decoded) => {
                ctx.set_body(decoded);
                StageOutcome::Continue
            }
            Err(failure) => StageOutcome::Fail(failure.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::{HeaderValue, Method};
    use serde_json::json;

    fn request_with_body(content_type: Option<&'static str>, body: &str) -> RawRequest {
        let mut request = RawRequest::new(Method::POST, "/things");
        if let Some(content_type) = content_type {
            request.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static(content_type),
            );
        }
        request.body = RawBody::Complete(Bytes::copy_from_slice(body.as_bytes()));
        request
    }

    #[tokio::test]
    async fn decodes_declared_json() {
        let request = request_with_body(Some("application/json"), r#"{"name":"Rex"}"#);

        let decoded = JsonDecoder.decode(&request).await.unwrap();

        assert_eq!(decoded, Some(json!({ "name": "Rex" })));
    }

    #[tokio::test]
    async fn json_suffix_content_types_count_as_json() {
        let request = request_with_body(Some("application/vnd.api+json"), r#"[1,2]"#);

        let decoded = JsonDecoder.decode(&request).await.unwrap();

        assert_eq!(decoded, Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let request = request_with_body(Some("application/json"), r#"{"name": "#);

        let failure = JsonDecoder.decode(&request).await.unwrap_err();

        assert_eq!(failure.status, Some(StatusCode::BAD_REQUEST));
        assert!(!failure.message.is_empty());
    }

    #[tokio::test]
    async fn empty_body_decodes_to_nothing() {
        let request = request_with_body(Some("application/json"), "");

        let decoded = JsonDecoder.decode(&request).await.unwrap();

        assert_eq!(decoded, None);
    }

    #[tokio::test]
    async fn undeclared_body_passes_through_undecoded() {
        let request = request_with_body(None, r#"{"name":"Rex"}"#);

        let decoded = JsonDecoder.decode(&request).await.unwrap();

        assert_eq!(decoded, None);
    }

    #[tokio::test]
    async fn stage_stores_the_decoded_body() {
        let stage = DecodeStage::new(Arc::new(JsonDecoder));
        let mut ctx = RequestContext::new(request_with_body(
            Some("application/json"),
            r#"{"kind":"toy"}"#,
        ));

        let outcome = stage.process(&mut ctx).await;

        assert!(matches!(outcome, StageOutcome::Continue));
        assert_eq!(ctx.body(), Some(&json!({ "kind": "toy" })));
    }

    #[tokio::test]
    async fn uncaptured_body_fails_as_payload_too_large() {
        let stage = DecodeStage::new(Arc::new(JsonDecoder));
        let mut request = RawRequest::new(Method::POST, "/things");
        request.body = RawBody::Unread {
            reason: UnreadReason::TooLarge,
            detail: "length limit exceeded".to_string(),
        };
        let mut ctx = RequestContext::new(request);

        let outcome = stage.process(&mut ctx).await;

        match outcome {
            StageOutcome::Fail(Failure::Decode { status, .. }) => {
                assert_eq!(status, Some(StatusCode::PAYLOAD_TOO_LARGE));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn interrupted_body_read_is_left_statusless() {
        let stage = DecodeStage::new(Arc::new(JsonDecoder));
        let mut request = RawRequest::new(Method::POST, "/things");
        request.body = RawBody::Unread {
            reason: UnreadReason::Failed,
            detail: "connection reset by peer".to_string(),
        };
        let mut ctx = RequestContext::new(request);

        let outcome = stage.process(&mut ctx).await;

        match outcome {
            StageOutcome::Fail(Failure::Decode { status, .. }) => assert_eq!(status, None),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
