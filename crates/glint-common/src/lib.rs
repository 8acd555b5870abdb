//! Glint Common Protocol and Transport
//!
//! This crate provides the core protocol definitions and TCP transport layer
//! for the Glint RPC framework.
//!
//! # Overview
//!
//! Glint is a minimal RPC framework built on a textual wire protocol: each
//! frame carries a method name and two JSON objects (payload and headers),
//! terminated by a reserved separator byte. This crate contains the shared
//! infrastructure used by both the server and the client:
//!
//! - **Protocol Layer**: Request/Response types, headers, and the error
//!   taxonomy
//! - **Transport Layer**: the wire codec and async frame I/O helpers
//!
//! # Wire Format
//!
//! ```text
//! request:  <method_name><payload-json><headers-json>\n
//! response: <method_name>:<ok|err><payload-json><headers-json>\n
//! ```
//!
//! The payload starts at the first `{` of the frame and the headers at the
//! last `{`. Headers always carry a `trace_id` used to correlate responses
//! and log lines with their originating request.
//!
//! # Example
//!
//! ```
//! use glint_common::protocol::{Request, Response};
//! use glint_common::transport::codec;
//! use serde_json::json;
//!
//! let request = Request::from_payload("create_task", &json!({"title": "Buy milk"})).unwrap();
//! let encoded = codec::encode_request(&request).unwrap();
//! let decoded = codec::decode_request(&encoded).unwrap();
//! assert_eq!(decoded.method_name, "create_task");
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
