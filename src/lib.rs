//! # jvcprojector
//!
//! A blocking client for the JVC projector network control protocol:
//! - Greeting handshake with busy and refused-connection retry
//! - Legacy and SHA-256 salted authentication
//! - Operation / reference command framing with per-command acknowledgement
//! - Connection keepalive window for rapid successive calls
//! - One in-flight batch per device, safe to share across threads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Callers (any thread)                       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ send(&mut [Command])
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Device (command executor)                    │
//! │          session lock · keepalive · refresh cutoff           │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//!            ▼                              ▼
//!   ┌─────────────────┐            ┌─────────────────┐
//!   │    Handshake    │            │      Codec      │
//!   │ (PJ_OK / PJREQ) │            │ (frame / parse) │
//!   └────────┬────────┘            └────────┬────────┘
//!            │                              │
//!            └──────────────┬───────────────┘
//!                           ▼
//!                  ┌─────────────────┐
//!                  │    Transport    │
//!                  │   (TcpStream)   │
//!                  └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod network;
pub mod protocol;
pub mod device;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ProjectorError, Result};
pub use config::Config;
pub use device::{AuthScheme, Device};
pub use network::{TcpTransport, Transport};
pub use protocol::Command;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
