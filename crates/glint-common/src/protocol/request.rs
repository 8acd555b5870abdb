use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::error::{GlintError, Result};

/// A JSON object, as used for payloads and header extensions.
pub type Payload = serde_json::Map<String, Value>;

/// Common message headers.
///
/// `trace_id` is always present once a message is constructed; any other
/// fields are method-specific extensions kept in `extra`. The headers object
/// must stay flat on the wire: its opening brace is the last `{` of a frame,
/// so no `{` may occur inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headers {
    pub trace_id: String,
    #[serde(flatten)]
    pub extra: Payload,
}

impl Headers {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            extra: Payload::new(),
        }
    }
}

/// An RPC request.
///
/// Invariant: `headers.trace_id == trace_id` from construction onwards; use
/// [`Request::set_trace_id`] to change both in lock-step.
///
/// # Example
///
/// ```
/// use glint_common::protocol::Request;
/// use serde_json::json;
///
/// let request = Request::from_payload("create_task", &json!({
///     "task_list_id": 1,
///     "title": "Buy milk",
/// })).unwrap();
/// assert_eq!(request.headers.trace_id, request.trace_id);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method_name: String,
    pub trace_id: String,
    pub payload: Payload,
    pub headers: Headers,
}

impl Request {
    /// Creates a request with a freshly generated trace id.
    pub fn new(method_name: impl Into<String>, payload: Payload) -> Self {
        Self::with_trace_id(method_name, Uuid::new_v4().to_string(), payload)
    }

    /// Creates a request with an explicit trace id.
    pub fn with_trace_id(
        method_name: impl Into<String>,
        trace_id: impl Into<String>,
        payload: Payload,
    ) -> Self {
        let trace_id = trace_id.into();
        Self {
            method_name: method_name.into(),
            headers: Headers::new(trace_id.clone()),
            trace_id,
            payload,
        }
    }

    /// Creates a request from any serializable payload.
    ///
    /// Fails with a validation error when the payload does not serialize to
    /// a JSON object.
    pub fn from_payload<P: Serialize>(method_name: impl Into<String>, payload: &P) -> Result<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(payload) => Ok(Self::new(method_name, payload)),
            other => Err(GlintError::Validation {
                reason: format!("payload must be a JSON object, got {other}"),
            }),
        }
    }

    /// Replaces the trace id, keeping the headers in sync.
    pub fn set_trace_id(&mut self, trace_id: impl Into<String>) {
        self.trace_id = trace_id.into();
        self.headers.trace_id = self.trace_id.clone();
    }
}
