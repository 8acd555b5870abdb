//! Glint RPC Server
//!
//! Accepts TCP connections, reads brace-framed messages, and dispatches them
//! to registered method handlers. Each accepted connection runs as its own
//! tokio task and processes one frame fully before reading the next, so
//! responses always leave a connection in arrival order.
//!
//! # Example
//!
//! ```no_run
//! use glint_server::{MethodTable, Server, ServerConfig, TypedRequest, User};
//! use glint_common::protocol::Result;
//! use serde::Deserialize;
//! use std::sync::Arc;
//!
//! #[derive(Deserialize)]
//! struct Ping {}
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let mut methods = MethodTable::new();
//! methods.register("ping", |request: TypedRequest<Ping>, _user: User| async move {
//!     request.ok_with(&serde_json::json!({"pong": true}))
//! });
//!
//! let server = Server::bind(ServerConfig::default(), methods).await?;
//! Arc::new(server).run().await
//! # }
//! ```

pub mod dispatch;
pub mod server;
pub mod user;

pub use dispatch::{MethodTable, TypedRequest};
pub use server::{Server, ServerConfig};
pub use user::User;
