/// Handle for one live connection, passed to every method handler.
///
/// Identified by the peer `host:port` address. The socket's read and write
/// halves are owned by the connection task itself; handlers see only this
/// handle and respond through their return value. Lives from accept to
/// disconnect, at which point the server drops its registry entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    address: String,
}

impl User {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// Peer address (`host:port`) this handle was registered under.
    pub fn address(&self) -> &str {
        &self.address
    }
}
