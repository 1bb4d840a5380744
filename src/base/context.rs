//! Ergonomic error context helpers.
//!
//! Converts IO errors from connection attempts into `NetError` variants
//! that name the peer.

use crate::base::neterror::NetError;
use std::io;
use std::net::SocketAddr;

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use http_native::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context(addr)?;
    /// // Error: "ConnectFailure: connection to 127.0.0.1:443 failed: connection refused"
    /// ```
    fn connection_context(self, addr: SocketAddr) -> Result<T, NetError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, addr: SocketAddr) -> Result<T, NetError> {
        self.map_err(|e| NetError::ConnectFailure(format!("connection to {addr} failed: {e}")))
    }
}
