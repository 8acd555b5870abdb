pub mod error;
pub mod request;
pub mod response;


pub use error::{GlintError, Result, Severity, ZERO_TRACE_ID};
pub use request::{Headers, Payload, Request};
pub use response::{response_from_error, Response};
