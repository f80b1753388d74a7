//! Session Handshake
//!
//! Greeting, busy/refused retry and authentication.
//!
//! ```text
//! connect ─► read 5 ─┬─ PJ_NG ─► backoff, reconnect
//!                    ├─ PJ_OK ─► PJREQ[_legacy] ─► read 5 ─┬─ PJACK ─► done
//!                    │                                    └─ PJNAK ─► PJREQ_sha256 ─► read 5
//!                    └─ other ─► protocol error
//! ```

use std::thread;

use crate::config::Config;
use crate::error::{ProjectorError, Result};
use crate::network::Transport;
use crate::protocol::{
    auth_request, legacy_credential, sha256_credential, PJACK, PJNAK, PJNG, PJOK, TOKEN_LEN,
};

/// Authentication scheme the device accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// No password configured
    None,

    /// Raw null-padded password
    Legacy,

    /// Hex SHA-256 of password + salt (newer models)
    Sha256,
}

/// Credentials prepared once per device
///
/// The SHA-256 fallback always exists; without a password it hashes the
/// salt alone.
#[derive(Clone)]
pub struct Credentials {
    legacy: Option<Vec<u8>>,
    hashed: Vec<u8>,
}

impl Credentials {
    pub fn from_password(password: Option<&str>) -> Self {
        Self {
            legacy: password.map(legacy_credential),
            hashed: sha256_credential(password.unwrap_or_default()),
        }
    }
}

/// Connect and authenticate, retrying refused and busy connections
///
/// On error the transport is left disconnected.
pub fn connect<T: Transport>(
    transport: &mut T,
    config: &Config,
    credentials: &Credentials,
) -> Result<AuthScheme> {
    for attempt in 1..=config.max_connect_retries {
        tracing::debug!("Connecting to {}:{} (attempt {})", config.host, config.port, attempt);

        match transport.connect() {
            Ok(()) => {}
            Err(ProjectorError::ConnectionRefused) => {
                tracing::debug!("Retrying refused connection");
                thread::sleep(config.refused_backoff() * attempt);
                continue;
            }
            Err(e) => {
                transport.disconnect();
                return Err(connect_error(e, "handshake connect"));
            }
        }

        let greeting = match transport.read(TOKEN_LEN) {
            Ok(greeting) => greeting,
            Err(e) => {
                transport.disconnect();
                return Err(connect_error(e, "handshake init"));
            }
        };
        tracing::debug!("Handshake received {}", greeting.escape_ascii());

        if greeting == PJNG {
            tracing::warn!("Handshake retrying on busy");
            transport.disconnect();
            thread::sleep(config.busy_backoff() * attempt);
            continue;
        }

        if greeting != PJOK {
            transport.disconnect();
            return Err(ProjectorError::Protocol("Handshake init invalid".to_string()));
        }

        let result = authenticate(transport, credentials);
        if result.is_err() {
            transport.disconnect();
        }
        return result;
    }

    transport.disconnect();
    Err(ProjectorError::ConnectFailure("Retries exceeded".to_string()))
}

/// Send `PJREQ`, falling back to the SHA-256 credential on `PJNAK`
fn authenticate<T: Transport>(transport: &mut T, credentials: &Credentials) -> Result<AuthScheme> {
    let (first, scheme) = match &credentials.legacy {
        Some(legacy) => (Some(legacy.as_slice()), AuthScheme::Legacy),
        None => (None, AuthScheme::None),
    };

    let mut reply = exchange_auth(transport, &auth_request(first))?;
    let mut accepted = scheme;

    if reply == PJNAK {
        tracing::debug!("Authentication failed. Trying SHA-256 credential");
        reply = exchange_auth(transport, &auth_request(Some(&credentials.hashed)))?;
        accepted = AuthScheme::Sha256;
    }

    if reply == PJNAK {
        return Err(ProjectorError::Auth);
    }
    if reply != PJACK {
        return Err(ProjectorError::Protocol("Handshake ack invalid".to_string()));
    }

    tracing::debug!("Authenticated ({:?})", accepted);
    Ok(accepted)
}

fn exchange_auth<T: Transport>(transport: &mut T, request: &[u8]) -> Result<Vec<u8>> {
    // The request carries the credential; only the token is logged
    tracing::debug!("Handshake sending 'PJREQ'");
    transport
        .write(request)
        .map_err(|e| connect_error(e, "handshake request"))?;

    let reply = transport
        .read(TOKEN_LEN)
        .map_err(|e| connect_error(e, "handshake ack"))?;
    tracing::debug!("Handshake received {}", reply.escape_ascii());
    Ok(reply)
}

/// Transport failures during the handshake surface as connect failures
fn connect_error(e: ProjectorError, stage: &str) -> ProjectorError {
    match e {
        ProjectorError::Timeout => ProjectorError::ConnectFailure(format!("{stage} timeout")),
        ProjectorError::ConnectionClosed => {
            ProjectorError::ConnectFailure(format!("{stage}: connection closed"))
        }
        ProjectorError::ConnectionRefused => {
            ProjectorError::ConnectFailure(format!("{stage}: connection refused"))
        }
        ProjectorError::Io(e) => ProjectorError::ConnectFailure(format!("{stage}: {e}")),
        other => other,
    }
}
