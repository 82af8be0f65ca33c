//! The tagged failure type carried through the stage pipeline.

use axum::http::StatusCode;
use thiserror::Error;

/// Any way a request can fail between arrival and the terminal write.
///
/// Stages and handlers return this instead of writing error responses
/// themselves; the [`Normalizer`](crate::error::Normalizer) owns the
/// translation into a client-visible envelope.
#[derive(Debug, Error)]
pub enum Failure {
    /// A known business failure raised deliberately by a handler. The id is
    /// a stable machine-readable code that clients may switch on.
    #[error("{message}")]
    Domain {
        id: String,
        status: Option<StatusCode>,
        message: String,
    },

    /// The request body could not be buffered or decoded. A client-class
    /// status marks the input as malformed; anything else is treated as a
    /// decoder malfunction and surfaces as a 500.
    #[error("{message}")]
    Decode {
        status: Option<StatusCode>,
        message: String,
    },

    /// An unanticipated failure from a handler or stage. Always surfaces to
    /// the client as a generic 500; the original error rides along for the
    /// log and, when exposure is enabled, the response stack.
    #[error("{message}")]
    Unknown {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A violation of the response lifecycle itself, such as a merge after
    /// the terminal write. Never normalized into a response; the pipeline
    /// aborts the request instead.
    #[error("consistency violation: {0}")]
    Consistency(String),
}

impl Failure {
    /// Business failure without an HTTP status. The transport keeps its
    /// current status and meta.status is omitted.
    pub fn domain(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Domain {
            id: id.into(),
            status: None,
            message: message.into(),
        }
    }

    /// Business failure pinned to a specific HTTP status.
    pub fn domain_with_status(
        id: impl Into<String>,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self::Domain {
            id: id.into(),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn decode(status: Option<StatusCode>, message: impl Into<String>) -> Self {
        Self::Decode {
            status,
            message: message.into(),
        }
    }

    /// Wraps an arbitrary error, keeping it as the source for trace
    /// rendering.
    pub fn unknown(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        let source = source.into();
        Self::Unknown {
            message: source.to_string(),
            source: Some(source),
        }
    }

    /// Unknown failure described only by a message.
    pub fn unknown_msg(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: None,
        }
    }

    pub fn consistency(detail: impl Into<String>) -> Self {
        Self::Consistency(detail.into())
    }

    /// Short tag for log fields and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Domain { .. } => "domain",
            Self::Decode { .. } => "decode",
            Self::Unknown { .. } => "unknown",
            Self::Consistency(_) => "consistency",
        }
    }

    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn unknown_keeps_the_wrapped_error_as_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let failure = Failure::unknown(io);

        assert_eq!(failure.to_string(), "disk on fire");
        assert!(failure.source().is_some());
    }

    #[test]
    fn unknown_msg_has_no_source() {
        let failure = Failure::unknown_msg("handler panicked politely");

        assert_eq!(failure.kind(), "unknown");
        assert!(failure.source().is_none());
    }

    #[test]
    fn domain_without_status_leaves_it_unset() {
        let failure = Failure::domain("quota_exceeded", "Monthly quota exhausted.");

        match failure {
            Failure::Domain { id, status, .. } => {
                assert_eq!(id, "quota_exceeded");
                assert!(status.is_none());
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn consistency_displays_its_detail() {
        let failure = Failure::consistency("merge after terminal write");

        assert!(failure.is_consistency());
        assert_eq!(
            failure.to_string(),
            "consistency violation: merge after terminal write"
        );
    }
}
