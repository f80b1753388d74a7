//! Transport trait
//!
//! Byte-level access to one projector connection.

use std::net::SocketAddr;

use crate::error::Result;

/// A single socket-like connection to one address
///
/// Every blocking call honours the configured timeout; expiry is reported as
/// [`ProjectorError::Timeout`](crate::ProjectorError::Timeout), distinct from
/// [`ProjectorError::ConnectionClosed`](crate::ProjectorError::ConnectionClosed).
pub trait Transport: Send + 'static {
    /// Open the connection, replacing any existing one
    ///
    /// A refused connection is reported as `ConnectionRefused` so callers can
    /// retry it; anything else is a `ConnectFailure`.
    fn connect(&mut self) -> Result<()>;

    /// Read exactly `n` bytes
    fn read(&mut self, n: usize) -> Result<Vec<u8>>;

    /// Read up to and including the line delimiter
    fn read_line(&mut self) -> Result<Vec<u8>>;

    /// Write the whole buffer
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Whether the connection is open and the peer has not closed it
    fn is_connected(&self) -> bool;

    /// Close the connection. Idempotent.
    fn disconnect(&mut self);

    /// Address the connection resolved to, if any
    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}
