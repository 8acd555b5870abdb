use serde::Serialize;
use serde_json::Value;

use super::error::{GlintError, Result, ZERO_TRACE_ID};
use super::request::{Headers, Payload, Request};

/// An RPC response.
///
/// Carries the same trace id as the request it answers; the invariant
/// `headers.trace_id == trace_id` holds from construction onwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub method_name: String,
    pub trace_id: String,
    pub success: bool,
    pub payload: Payload,
    pub headers: Headers,
}

impl Response {
    pub fn new(
        method_name: impl Into<String>,
        trace_id: impl Into<String>,
        success: bool,
        payload: Payload,
    ) -> Self {
        let trace_id = trace_id.into();
        Self {
            method_name: method_name.into(),
            headers: Headers::new(trace_id.clone()),
            trace_id,
            success,
            payload,
        }
    }

    /// Creates a successful response answering `request`.
    pub fn ok(request: &Request, payload: Payload) -> Self {
        Self::new(
            request.method_name.clone(),
            request.trace_id.clone(),
            true,
            payload,
        )
    }

    /// Creates a successful response from any serializable payload.
    pub fn ok_with<P: Serialize>(request: &Request, payload: &P) -> Result<Self> {
        match serde_json::to_value(payload)? {
            Value::Object(payload) => Ok(Self::ok(request, payload)),
            other => Err(GlintError::Validation {
                reason: format!("payload must be a JSON object, got {other}"),
            }),
        }
    }

    /// Creates an error response with an explicit method name and trace id.
    ///
    /// Used when the originating request is known (or partially decoded) but
    /// not available as a full [`Request`] value.
    pub fn for_error(
        error: &GlintError,
        method_name: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        let mut payload = Payload::new();
        payload.insert("error_code".into(), Value::from(error.error_code()));
        payload.insert("details".into(), error.details());
        Self::new(method_name, trace_id, false, payload)
    }
}

/// Builds the error response for `error`.
///
/// The method name and trace id are taken from the originating request when
/// known; context-free errors get a severity-dependent sentinel method name
/// and the reserved zero trace id.
pub fn response_from_error(error: &GlintError, request: Option<&Request>) -> Response {
    match request {
        Some(request) => {
            Response::for_error(error, request.method_name.clone(), request.trace_id.clone())
        }
        None => Response::for_error(error, error.sentinel_method_name(), ZERO_TRACE_ID),
    }
}
