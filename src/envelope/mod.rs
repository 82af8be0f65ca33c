//! Response envelope accumulation.
//!
//! # Data Flow
//! ```text
//! Stage contributes Fragment
//!     → RequestContext checks the responded flag
//!     → merge.rs folds the fragment payload into the envelope
//!     → a fragment status propagates to the buffered response parts
//! Terminal responder
//!     → finalizes meta.duration, serializes the envelope once
//! ```
//!
//! # Design Decisions
//! - One envelope per request, owned by the request context; stages see it
//!   through `&mut` so cross-request sharing is impossible by construction
//! - Merge is recursive for objects, concatenating for arrays, and
//!   overwriting for everything else
//! - An empty fragment is a no-op so stages can contribute conditionally
//! - The HTTP status travels on the fragment, not inside the payload: it is
//!   a transport side effect that must land before the body is written

pub mod merge;

use axum::http::StatusCode;
use serde_json::{Map, Value};

pub use merge::deep_merge;

/// One stage's contribution to the outgoing response.
///
/// Wraps a JSON payload to fold into the envelope plus an optional HTTP
/// status for the transport layer.
#[derive(Debug, Clone)]
pub struct Fragment {
    payload: Value,
    status: Option<StatusCode>,
}

impl Fragment {
    /// Fragment carrying only a payload.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            status: None,
        }
    }

    /// Fragment carrying a payload and an HTTP status to set on the response.
    pub fn with_status(payload: Value, status: StatusCode) -> Self {
        Self {
            payload,
            status: Some(status),
        }
    }

    /// Fragment that merges nothing.
    pub fn empty() -> Self {
        Self::new(Value::Null)
    }

    /// True when merging this fragment would change nothing.
    pub fn is_empty(&self) -> bool {
        match &self.payload {
            Value::Null => self.status.is_none(),
            Value::Object(map) => map.is_empty() && self.status.is_none(),
            _ => false,
        }
    }

    /// The HTTP status this fragment asks the transport to set, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// The JSON payload to merge.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub(crate) fn into_parts(self) -> (Value, Option<StatusCode>) {
        (self.payload, self.status)
    }
}

/// The single mutable response object accumulated across a request.
///
/// Starts empty; stages grow it fragment by fragment. Serialized exactly
/// once by the terminal responder.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    root: Map<String, Value>,
}

impl Envelope {
    /// Empty envelope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a fragment payload into the envelope.
    ///
    /// The fragment's status side effect is the caller's concern; this only
    /// touches the JSON body. Callers must not invoke this after the
    /// terminal write; the request context enforces that.
    pub(crate) fn absorb(&mut self, payload: Value) {
        if payload.is_null() {
            return;
        }
        let mut root = Value::Object(std::mem::take(&mut self.root));
        deep_merge(&mut root, payload);
        if let Value::Object(map) = root {
            self.root = map;
        }
    }

    /// Write a single key into `meta`, creating `meta` if absent.
    ///
    /// Used by the terminal responder to finalize `meta.duration` after the
    /// responded flag has been claimed, when the public merge path is
    /// already closed.
    pub(crate) fn put_meta(&mut self, key: &str, value: Value) {
        let meta = self
            .root
            .entry("meta".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = meta {
            map.insert(key.to_string(), value);
        }
    }

    /// Look up a top-level key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Look up a key inside `meta`.
    pub fn meta(&self, key: &str) -> Option<&Value> {
        self.root.get("meta")?.get(key)
    }

    /// True when no stage has contributed yet.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// The accumulated body as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Serialize the accumulated body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.root)
    }
}
