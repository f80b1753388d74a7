//! Protocol Module
//!
//! Defines the JVC network control wire protocol.
//!
//! ## Session Setup
//! ```text
//! device → client   PJ_OK            (or PJ_NG when busy)
//! client → device   PJREQ[_<credential>]
//! device → client   PJACK            (or PJNAK when the credential is rejected)
//! ```
//!
//! ## Command Format
//! ```text
//! ┌──────────┬──────────────┬──────────────────┬─────────┐
//! │ Role (1) │ Unit id (2)  │      Opcode      │ LF (1)  │
//! └──────────┴──────────────┴──────────────────┴─────────┘
//! ```
//!
//! ### Roles
//! - `!`    (0x21): operation, client → device
//! - `?`    (0x3F): reference query, client → device
//! - `ACK`  (0x06): acknowledgement, device → client, carries opcode[0..2]
//! - `@`    (0x40): reference response, device → client, carries
//!   opcode[0..2] followed by the payload

mod command;
mod codec;
pub mod formatter;
pub mod opcode;

pub use command::Command;
pub use codec::{
    auth_request, decode_response, encode_command, legacy_credential, response_text,
    sha256_credential, validate_ack, AUTH_SALT, END, HEAD_ACK, HEAD_LEN, HEAD_OP, HEAD_REF,
    HEAD_RES, PJACK, PJNAK, PJNG, PJOK, PJREQ, TOKEN_LEN, UNIT_ID,
};
