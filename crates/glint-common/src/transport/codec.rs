//! Wire codec for the Glint text protocol.
//!
//! A frame is `<method_name><payload-json><headers-json>` for requests and
//! `<method_name>:<ok|err><payload-json><headers-json>` for responses. There
//! is no delimiter between the parts: the payload begins at the first `{` of
//! the frame and the headers at the last `{`. JSON string escaping keeps the
//! separator byte out of well-formed bodies, and the headers object must be
//! flat so that its opening brace really is the last `{` of the frame.

use serde_json::Value;
use uuid::Uuid;

use crate::protocol::{GlintError, Payload, Request, Response, Result};

/// Frame terminator appended after every encoded message.
pub const MESSAGE_SEPARATOR: u8 = b'\n';

/// Locates the payload and headers boundaries of a frame.
///
/// Fails with a framing error when fewer than two `{` are present or the
/// first is not strictly before the last.
fn brace_bounds(message: &str) -> Result<(usize, usize)> {
    let payload_start = message
        .find('{')
        .ok_or(GlintError::InvalidMessageFormat)?;
    let headers_start = message.rfind('{').unwrap_or(payload_start);

    if payload_start >= headers_start {
        return Err(GlintError::InvalidMessageFormat);
    }

    Ok((payload_start, headers_start))
}

fn frame_text(raw: &[u8]) -> Result<&str> {
    std::str::from_utf8(raw).map_err(|_| GlintError::InvalidMessageFormat)
}

/// Splits a decoded headers object into its trace id and extension fields.
fn split_headers(mut headers: Payload) -> (Option<String>, Payload) {
    let trace_id = match headers.remove("trace_id") {
        Some(Value::String(trace_id)) if !trace_id.is_empty() => Some(trace_id),
        _ => None,
    };
    (trace_id, headers)
}

/// Extracts only the method name from a raw request frame.
///
/// This is the fast path used by the dispatch table to reject unknown
/// methods before paying the full decode cost: it scans for the first `{`
/// without parsing any JSON. A missing `{`, or a `{` in the very first
/// position (no method name), is a framing error.
pub fn find_method_name(raw: &[u8]) -> Result<&str> {
    let message = frame_text(raw)?;
    match message.find('{') {
        None | Some(0) => Err(GlintError::InvalidMessageFormat),
        Some(payload_start) => Ok(&message[..payload_start]),
    }
}

/// Encodes a request frame (without the separator).
pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
    let mut out = Vec::from(request.method_name.as_bytes());
    out.extend(serde_json::to_vec(&request.payload)?);
    out.extend(serde_json::to_vec(&request.headers)?);
    Ok(out)
}

/// Decodes a request frame.
///
/// Structural failures are framing errors; JSON bodies that do not parse
/// into objects are validation errors. `trace_id` may be omitted from
/// request headers, in which case a fresh one is generated.
pub fn decode_request(raw: &[u8]) -> Result<Request> {
    let message = frame_text(raw)?;
    let (payload_start, headers_start) = brace_bounds(message)?;
    if payload_start == 0 {
        return Err(GlintError::InvalidMessageFormat);
    }

    let method_name = &message[..payload_start];
    let payload: Payload = serde_json::from_str(&message[payload_start..headers_start])?;
    let headers: Payload = serde_json::from_str(&message[headers_start..])?;

    let (trace_id, extra) = split_headers(headers);
    let trace_id = trace_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut request = Request::with_trace_id(method_name, trace_id, payload);
    request.headers.extra = extra;
    Ok(request)
}

/// Encodes a response frame (without the separator).
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let mut out = Vec::from(response.method_name.as_bytes());
    out.push(b':');
    out.extend_from_slice(if response.success { b"ok".as_slice() } else { b"err".as_slice() });
    out.extend(serde_json::to_vec(&response.payload)?);
    out.extend(serde_json::to_vec(&response.headers)?);
    Ok(out)
}

/// Decodes a response frame.
///
/// Any failure, including a missing or empty `trace_id` in the headers, is
/// a framing error.
pub fn decode_response(raw: &[u8]) -> Result<Response> {
    let message = frame_text(raw)?;
    let (payload_start, headers_start) = brace_bounds(message)?;

    let status_start = message.find(':').ok_or(GlintError::InvalidMessageFormat)?;
    if status_start == 0 || status_start >= payload_start {
        return Err(GlintError::InvalidMessageFormat);
    }

    let method_name = &message[..status_start];
    let success = &message[status_start + 1..payload_start] == "ok";

    let payload: Payload = serde_json::from_str(&message[payload_start..headers_start])
        .map_err(|_| GlintError::InvalidMessageFormat)?;
    let headers: Payload = serde_json::from_str(&message[headers_start..])
        .map_err(|_| GlintError::InvalidMessageFormat)?;

    let (trace_id, extra) = split_headers(headers);
    let trace_id = trace_id.ok_or(GlintError::InvalidMessageFormat)?;

    let mut response = Response::new(method_name, trace_id, success, payload);
    response.headers.extra = extra;
    Ok(response)
}
