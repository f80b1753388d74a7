//! Command definitions
//!
//! One protocol exchange: an opcode sent either as an operation or as a
//! reference query, plus the outcome written back by the device executor.

use super::{formatter, opcode, response_text};

/// A single command and, once sent, its outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Opcode, at least two bytes
    code: String,

    /// Reference query (expects a response line) vs operation
    is_query: bool,

    /// Set once the device acknowledged the command
    acknowledged: bool,

    /// Raw response payload (queries only)
    raw_response: Option<Vec<u8>>,

    /// Response payload decoded through the formatter registry
    response: Option<String>,
}

impl Command {
    /// Create an operation command
    pub fn operation(code: impl Into<String>) -> Self {
        Self::new(code.into(), false)
    }

    /// Create a reference (query) command
    pub fn reference(code: impl Into<String>) -> Self {
        Self::new(code.into(), true)
    }

    fn new(code: String, is_query: bool) -> Self {
        Self {
            code,
            is_query,
            acknowledged: false,
            raw_response: None,
            response: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn is_query(&self) -> bool {
        self.is_query
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged
    }

    /// True for power state commands
    pub fn is_power(&self) -> bool {
        self.code.starts_with(opcode::POWER)
    }

    /// Raw response payload as received
    pub fn raw_response(&self) -> Option<&[u8]> {
        self.raw_response.as_deref()
    }

    /// Decoded response value
    ///
    /// Only queries that were acknowledged and answered carry one.
    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Record a successful exchange
    ///
    /// `reply` is the extracted payload and the full response line.
    pub(crate) fn complete(&mut self, reply: Option<(Vec<u8>, Vec<u8>)>) {
        if self.is_query {
            if let Some((payload, line)) = reply {
                let text = response_text(&payload, &line);
                self.response = Some(formatter::decode(&self.code, &text));
                self.raw_response = Some(payload);
            }
        }
        self.acknowledged = true;
    }
}
