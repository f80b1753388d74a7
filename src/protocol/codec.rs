//! Protocol codec
//!
//! Fixed protocol tokens, command framing and ack/response validation.
//!
//! ## Wire Format
//!
//! ### Operation / Reference Frame
//! ```text
//! ┌──────────┬──────────────┬──────────────────┬─────────┐
//! │ !/? (1)  │  0x89 0x01   │      Opcode      │   LF    │
//! └──────────┴──────────────┴──────────────────┴─────────┘
//! ```
//!
//! ### Acknowledgement Line
//! ```text
//! ┌──────────┬──────────────┬──────────────────┬─────────┐
//! │ 0x06 (1) │  0x89 0x01   │   Opcode[0..2]   │   LF    │
//! └──────────┴──────────────┴──────────────────┴─────────┘
//! ```
//!
//! ### Response Line (reference only)
//! ```text
//! ┌──────────┬──────────────┬──────────────┬───────────┬─────────┐
//! │  @ (1)   │  0x89 0x01   │ Opcode[0..2] │  Payload  │   LF    │
//! └──────────┴──────────────┴──────────────┴───────────┴─────────┘
//! ```

use sha2::{Digest, Sha256};

use super::Command;
use crate::error::{ProjectorError, Result};

// =============================================================================
// Handshake Tokens
// =============================================================================

/// Length of every handshake token
pub const TOKEN_LEN: usize = 5;

/// Greeting: device ready
pub const PJOK: &[u8; TOKEN_LEN] = b"PJ_OK";

/// Greeting: device busy with another client
pub const PJNG: &[u8; TOKEN_LEN] = b"PJ_NG";

/// Authentication request sent by the client
pub const PJREQ: &[u8; TOKEN_LEN] = b"PJREQ";

/// Authentication accepted
pub const PJACK: &[u8; TOKEN_LEN] = b"PJACK";

/// Authentication rejected
pub const PJNAK: &[u8; TOKEN_LEN] = b"PJNAK";

/// Salt appended to the password for the SHA-256 scheme
pub const AUTH_SALT: &str = "JVCKWPJ";

/// Separates `PJREQ` from the credential
const AUTH_SEPARATOR: u8 = b'_';

/// Minimum width of the legacy (null padded) credential
const LEGACY_CREDENTIAL_LEN: usize = 10;

// =============================================================================
// Command Headers
// =============================================================================

/// Fixed unit identifier carried by every header
pub const UNIT_ID: [u8; 2] = [0x89, 0x01];

/// Header size: role byte + unit id
pub const HEAD_LEN: usize = 1 + UNIT_ID.len();

pub const HEAD_OP: [u8; HEAD_LEN] = [b'!', UNIT_ID[0], UNIT_ID[1]];
pub const HEAD_REF: [u8; HEAD_LEN] = [b'?', UNIT_ID[0], UNIT_ID[1]];
pub const HEAD_RES: [u8; HEAD_LEN] = [b'@', UNIT_ID[0], UNIT_ID[1]];
pub const HEAD_ACK: [u8; HEAD_LEN] = [0x06, UNIT_ID[0], UNIT_ID[1]];

/// Line delimiter
pub const END: u8 = b'\n';

/// Opcode bytes echoed back in acks and responses
const ECHO_LEN: usize = 2;

// =============================================================================
// Command Encoding
// =============================================================================

/// Encode a command to its wire frame
///
/// Format: header (3) + opcode + LF
pub fn encode_command(command: &Command) -> Vec<u8> {
    let header = if command.is_query() { HEAD_REF } else { HEAD_OP };
    let code = command.code().as_bytes();

    let mut frame = Vec::with_capacity(HEAD_LEN + code.len() + 1);
    frame.extend_from_slice(&header);
    frame.extend_from_slice(code);
    frame.push(END);
    frame
}

// =============================================================================
// Reply Validation
// =============================================================================

/// Check that `line` acknowledges `code`
pub fn validate_ack(code: &str, line: &[u8]) -> Result<()> {
    if !has_prefix(line, &HEAD_ACK, code) {
        return Err(ProjectorError::Protocol(format!(
            "Response ack invalid '{}' for '{}'",
            line.escape_ascii(),
            code.escape_debug()
        )));
    }
    Ok(())
}

/// Validate a reference response line and return its payload
///
/// The payload is everything between the header + opcode echo and the
/// trailing delimiter.
pub fn decode_response(code: &str, line: &[u8]) -> Result<Vec<u8>> {
    if !has_prefix(line, &HEAD_RES, code) {
        return Err(ProjectorError::Protocol(format!(
            "Ref ack invalid '{}' for '{}'",
            line.escape_ascii(),
            code.escape_debug()
        )));
    }

    let body = line.strip_suffix(&[END]).unwrap_or(line);
    body.get(HEAD_LEN + echo(code).len()..)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            ProjectorError::Protocol(format!(
                "Ref ack truncated '{}' for '{}'",
                line.escape_ascii(),
                code.escape_debug()
            ))
        })
}

/// Render a response payload as text
///
/// A payload that is not valid UTF-8 becomes a hex dump of the whole
/// response `line`.
pub fn response_text(payload: &[u8], line: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::warn!("Failed to decode response '{}'", line.escape_ascii());
            hex::encode(line)
        }
    }
}

fn echo(code: &str) -> &[u8] {
    let code = code.as_bytes();
    &code[..ECHO_LEN.min(code.len())]
}

fn has_prefix(line: &[u8], header: &[u8; HEAD_LEN], code: &str) -> bool {
    let echo = echo(code);
    line.len() >= HEAD_LEN + echo.len()
        && line[..HEAD_LEN] == header[..]
        && &line[HEAD_LEN..HEAD_LEN + echo.len()] == echo
}

// =============================================================================
// Authentication
// =============================================================================

/// Legacy credential: the raw password, null padded to at least 10 bytes
pub fn legacy_credential(password: &str) -> Vec<u8> {
    let mut credential = password.as_bytes().to_vec();
    if credential.len() < LEGACY_CREDENTIAL_LEN {
        credential.resize(LEGACY_CREDENTIAL_LEN, 0);
    }
    credential
}

/// Fallback credential: lowercase hex SHA-256 of password + salt
pub fn sha256_credential(password: &str) -> Vec<u8> {
    let digest = Sha256::digest(format!("{password}{AUTH_SALT}").as_bytes());
    hex::encode(digest).into_bytes()
}

/// Build the authentication request
///
/// Without a credential this is just `PJREQ`.
pub fn auth_request(credential: Option<&[u8]>) -> Vec<u8> {
    let mut request = PJREQ.to_vec();
    if let Some(credential) = credential {
        request.push(AUTH_SEPARATOR);
        request.extend_from_slice(credential);
    }
    request
}
