//! Network Module
//!
//! Socket transport to a single projector.
//!
//! ## Architecture
//! - `Transport` trait: the seam the device executor talks through
//! - `TcpTransport`: blocking `TcpStream` with per-operation timeouts

mod transport;
mod connection;

pub use transport::Transport;
pub use connection::TcpTransport;
