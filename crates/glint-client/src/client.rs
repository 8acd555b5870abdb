use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use uuid::Uuid;

use glint_common::protocol::{GlintError, Request, Response, Result};
use glint_common::transport::{codec, read_frame, write_frame};

const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;
const DEFAULT_TIMEOUT_MS: u64 = 5000;

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// The Glint RPC client.
///
/// Holds one persistent connection. `send` acquires a single-permit gate
/// for the whole write-then-read sequence, so concurrent callers are queued
/// rather than interleaved; the response read off the wire always belongs
/// to the request written just before it. This is a deliberate design
/// choice, not a gap: the wire format carries no correlation ids, so
/// pipelining would require changing it.
///
/// # Example
///
/// ```no_run
/// use glint_client::Client;
/// use glint_common::protocol::Request;
/// use serde_json::json;
///
/// # async fn run() -> glint_common::protocol::Result<()> {
/// let client = Client::new("127.0.0.1", 4430);
/// client.connect().await?;
///
/// let request = Request::from_payload("create_task", &json!({"title": "Buy milk"}))?;
/// let response = client.send(request).await?;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    host: String,
    port: u16,
    max_message_size: usize,
    /// Stored for configuration parity but not enforced against reads or
    /// writes. Known gap carried over deliberately; see DESIGN.md.
    timeout_ms: u64,
    connection: Mutex<Option<Connection>>,
}

impl Client {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connection: Mutex::new(None),
        }
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    /// Advisory only; see the field note.
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    /// Establishes the connection. A second call while connected is a
    /// no-op. Connection refused is a client-fatal error.
    pub async fn connect(&self) -> Result<()> {
        let mut connection = self.connection.lock().await;
        if connection.is_some() {
            return Ok(());
        }

        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|err| {
                GlintError::ClientFatal(format!(
                    "connection to {}:{} failed: {err}",
                    self.host, self.port
                ))
            })?;

        tracing::debug!("connected to {}:{}", self.host, self.port);

        let (read_half, write_half) = stream.into_split();
        *connection = Some(Connection {
            reader: BufReader::new(read_half),
            writer: write_half,
        });
        Ok(())
    }

    /// Sends a request and returns its response.
    ///
    /// The request's trace id is replaced with a freshly generated one;
    /// correlation is by program order, so the caller-supplied value is
    /// never trusted. A response exceeding the configured maximum message
    /// size is a client-fatal error.
    pub async fn send(&self, mut request: Request) -> Result<Response> {
        request.set_trace_id(Uuid::new_v4().to_string());
        let encoded = codec::encode_request(&request)?;

        // Single-permit gate: held for the full request/response cycle.
        let mut guard = self.connection.lock().await;
        let connection = guard
            .as_mut()
            .ok_or_else(|| GlintError::ClientFatal("client is not connected".into()))?;

        write_frame(&mut connection.writer, &encoded).await?;
        let data = read_frame(&mut connection.reader, self.max_message_size)
            .await
            .map_err(|err| match err {
                GlintError::MaxMessageSize { max_message_size } => GlintError::ClientFatal(
                    format!("response exceeded the maximum message size of {max_message_size} bytes"),
                ),
                other => other,
            })?;
        drop(guard);

        codec::decode_response(&data)
    }
}
