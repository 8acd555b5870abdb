use serde_json::{json, Value};
use thiserror::Error;

/// Trace id used on error responses that cannot be attributed to a request.
pub const ZERO_TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Severity of an external-facing error.
///
/// Severity selects the sentinel method name for context-free error
/// responses and feeds the fatality decisions: `Critical` errors terminate
/// their calling context (client caller or server process) rather than being
/// answered on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
    Critical,
}

/// The Glint error taxonomy.
///
/// Every variant carries a machine-stable `error_code`, structured
/// `details`, and a `severity`. Per-message errors are converted into error
/// responses and sent back on the same connection; connection-fatal and
/// process-fatal errors are logged and terminate the connection or process.
#[derive(Error, Debug)]
pub enum GlintError {
    /// Frame fails the brace/colon structural rules of the wire format.
    #[error("invalid message format")]
    InvalidMessageFormat,

    /// Payload or headers fail structural validation against the declared
    /// schema.
    #[error("validation failed: {reason}")]
    Validation { reason: String },

    /// No handler registered for the extracted method name.
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// An unexpected failure escaped a registered handler.
    #[error("method internal error: {reason}")]
    MethodInternal { reason: String },

    /// A frame exceeded the configured maximum message size. The server
    /// notifies the peer and then disconnects it.
    #[error("message exceeds the maximum size of {max_message_size} bytes")]
    MaxMessageSize { max_message_size: usize },

    /// Connection refused or a client-side size/read overrun. Terminates the
    /// calling context; never retried.
    #[error("client fatal error: {0}")]
    ClientFatal(String),

    /// Bind failure or an unrecoverable top-level condition. Stops the
    /// accept loop entirely.
    #[error("server fatal error: {0}")]
    ServerFatal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for GlintError {
    fn from(err: serde_json::Error) -> Self {
        GlintError::Validation {
            reason: err.to_string(),
        }
    }
}

impl GlintError {
    /// Stable identifier carried in error response payloads.
    pub fn error_code(&self) -> &'static str {
        match self {
            GlintError::InvalidMessageFormat => "invalid_message_format",
            GlintError::Validation { .. } => "validation_error",
            GlintError::UnknownMethod(_) => "unknown_method",
            GlintError::MethodInternal { .. } => "method_internal_error",
            GlintError::MaxMessageSize { .. } => "max_message_size_received",
            GlintError::ClientFatal(_) => "client_fatal_error",
            GlintError::ServerFatal(_) => "server_fatal_error",
            GlintError::Io(_) => "io_error",
        }
    }

    /// Structured diagnostic details carried in error response payloads.
    pub fn details(&self) -> Value {
        match self {
            GlintError::InvalidMessageFormat => json!({}),
            GlintError::Validation { reason } => json!({ "reason": reason }),
            GlintError::UnknownMethod(method_name) => json!({ "method_name": method_name }),
            GlintError::MethodInternal { reason } => json!({ "reason": reason }),
            GlintError::MaxMessageSize { max_message_size } => {
                json!({ "max_message_size": max_message_size })
            }
            GlintError::ClientFatal(reason) => json!({ "reason": reason }),
            GlintError::ServerFatal(reason) => json!({ "reason": reason }),
            GlintError::Io(err) => json!({ "reason": err.to_string() }),
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            GlintError::InvalidMessageFormat
            | GlintError::Validation { .. }
            | GlintError::UnknownMethod(_) => Severity::Warning,
            GlintError::MethodInternal { .. }
            | GlintError::MaxMessageSize { .. }
            | GlintError::Io(_) => Severity::Error,
            GlintError::ClientFatal(_) | GlintError::ServerFatal(_) => Severity::Critical,
        }
    }

    /// Placeholder method name for error responses that cannot be attributed
    /// to a specific originating request.
    pub fn sentinel_method_name(&self) -> &'static str {
        match self.severity() {
            Severity::Warning => "__warning",
            Severity::Error | Severity::Critical => "__error",
        }
    }

    /// Whether the server must disconnect the peer after responding.
    pub fn is_connection_fatal(&self) -> bool {
        matches!(self, GlintError::MaxMessageSize { .. })
    }

    /// Whether the error terminates the whole process (accept loop included).
    pub fn is_process_fatal(&self) -> bool {
        matches!(self, GlintError::ServerFatal(_))
    }
}

pub type Result<T> = std::result::Result<T, GlintError>;
