//! Glint RPC Client
//!
//! Owns one persistent TCP connection to a Glint server and serializes
//! concurrent callers into a single in-flight request at a time. Responses
//! are correlated to callers purely by program order; the wire format
//! carries no request ids.

pub mod client;

pub use client::Client;
