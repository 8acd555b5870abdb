//! Connection server.
//!
//! One tokio task per accepted connection. Each task registers its peer in
//! the live-connection registry, then loops: read one frame, dispatch it,
//! send the response, repeat. A frame over the size limit is the one
//! per-message error that also terminates the connection; a truncated or
//! reset stream disconnects without a response.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use glint_common::protocol::{response_from_error, GlintError, Response, Result};
use glint_common::transport::{codec, read_frame, write_frame};

use crate::dispatch::MethodTable;
use crate::user::User;

/// Server construction parameters.
///
/// `log_messages` logs full response bodies at debug level; it is meant for
/// debugging only, both for sensitivity and for cost.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum number of concurrently served connections.
    pub connection_limit: usize,
    /// Read buffer capacity per connection.
    pub chunk_size: usize,
    /// Upper bound on a single frame, in bytes.
    pub max_message_size: usize,
    pub log_messages: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 4430,
            connection_limit: 1024,
            chunk_size: 32 * 1024,
            max_message_size: 1024 * 1024,
            log_messages: false,
        }
    }
}

type Registry = Arc<Mutex<HashMap<String, User>>>;

/// The Glint connection server.
pub struct Server {
    config: ServerConfig,
    methods: Arc<MethodTable>,
    users: Registry,
    listener: TcpListener,
}

impl Server {
    /// Binds the listener. A bind failure is server-fatal.
    pub async fn bind(config: ServerConfig, methods: MethodTable) -> Result<Self> {
        if config.log_messages {
            tracing::warn!("log_messages is enabled; use it only for debugging purposes");
        }

        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|err| GlintError::ServerFatal(format!("failed to bind {addr}: {err}")))?;

        Ok(Self {
            config,
            methods: Arc::new(methods),
            users: Arc::new(Mutex::new(HashMap::new())),
            listener,
        })
    }

    /// The actual bound address (useful when the port was 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|err| GlintError::ServerFatal(format!("failed to get local addr: {err}")))
    }

    /// Number of live connections in the registry.
    pub fn connection_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    /// Runs the accept loop.
    ///
    /// Accept failures are server-fatal and stop the loop; per-connection
    /// failures never do.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        tracing::info!("listening on {}", self.local_addr()?);
        tracing::info!(
            "registered methods: {:?}",
            self.methods.method_names().collect::<Vec<_>>()
        );

        let permits = Arc::new(Semaphore::new(self.config.connection_limit));

        loop {
            let permit = permits
                .clone()
                .acquire_owned()
                .await
                .map_err(|err| GlintError::ServerFatal(format!("semaphore closed: {err}")))?;

            let (stream, peer) = self
                .listener
                .accept()
                .await
                .map_err(|err| GlintError::ServerFatal(format!("failed to accept: {err}")))?;

            let server = Arc::clone(&self);
            tokio::spawn(async move {
                server.handle_connection(stream, peer).await;
                drop(permit);
            });
        }
    }

    /// Per-connection processing loop.
    async fn handle_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let address = peer.to_string();
        let user = User::new(address.clone());

        // Duplicate addresses overwrite; not expected in practice.
        self.users
            .lock()
            .unwrap()
            .insert(address.clone(), user.clone());
        tracing::debug!("connected user {address}");

        let (read_half, write_half) = stream.into_split();
        let mut reader: BufReader<OwnedReadHalf> =
            BufReader::with_capacity(self.config.chunk_size, read_half);
        let mut writer = write_half;

        loop {
            let frame = match read_frame(&mut reader, self.config.max_message_size).await {
                Ok(frame) => frame,
                Err(err @ GlintError::MaxMessageSize { .. }) => {
                    tracing::debug!("user {address} reached the maximum message size");
                    let response = response_from_error(&err, None);
                    self.send_response(&mut writer, &user, &response).await;
                    self.disconnect(&mut writer, &user).await;
                    break;
                }
                Err(_) => {
                    // Peer closed or reset mid-frame; nothing to answer.
                    self.disconnect(&mut writer, &user).await;
                    break;
                }
            };

            let response = self.methods.handle(&frame, user.clone()).await;

            if self.config.log_messages {
                tracing::debug!("{address}: {response:?}");
            }

            if !self.send_response(&mut writer, &user, &response).await {
                break;
            }
        }
    }

    /// Writes one response back to the connection.
    ///
    /// Checks registry membership first, so a send racing a disconnect is
    /// tolerated. Returns `false` when the connection is gone.
    async fn send_response(
        &self,
        writer: &mut OwnedWriteHalf,
        user: &User,
        response: &Response,
    ) -> bool {
        let registered = self.users.lock().unwrap().contains_key(user.address());
        if !registered {
            return false;
        }

        let encoded = match codec::encode_response(response) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::error!("failed to encode response for {}: {err}", user.address());
                return true;
            }
        };

        if let Err(err) = write_frame(writer, &encoded).await {
            tracing::debug!("send to {} failed: {err}", user.address());
            self.disconnect(writer, user).await;
            return false;
        }

        true
    }

    /// Closes the write side, awaits the close, and drops the registry
    /// entry if still present. Idempotent.
    async fn disconnect(&self, writer: &mut OwnedWriteHalf, user: &User) {
        tracing::debug!("user {} was disconnected", user.address());
        let _ = writer.shutdown().await;

        let mut users = self.users.lock().unwrap();
        if users.contains_key(user.address()) {
            users.remove(user.address());
        }
    }
}
