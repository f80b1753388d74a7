//! Shared test helpers
//!
//! - `ScriptedTransport`: in-memory transport replaying canned replies and
//!   recording everything the client does
//! - `test_config`: config with hardware timings shrunk for tests
//! - `cc`: build an expected command/ack/response line

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use jvcprojector::config::Config;
use jvcprojector::protocol::{END, PJACK, PJOK};
use jvcprojector::{ProjectorError, Result, Transport};
use parking_lot::Mutex;

/// One scripted reply
#[derive(Debug, Clone)]
pub enum Reply {
    Bytes(Vec<u8>),
    /// Bytes delivered after a delay, without holding the script lock
    Delayed(Duration, Vec<u8>),
    Timeout,
    Closed,
}

/// Outcome of one scripted connect call
#[derive(Debug, Clone, Copy)]
pub enum ConnectOutcome {
    Ok,
    Refused,
}

#[derive(Debug, Default)]
pub struct ScriptState {
    /// Consumed per `connect`; `Ok` when empty
    pub connects: VecDeque<ConnectOutcome>,
    /// Consumed per `read(n)`; `Timeout` when empty
    pub reads: VecDeque<Reply>,
    /// Consumed per `read_line`; `Timeout` when empty
    pub lines: VecDeque<Reply>,

    pub writes: Vec<Vec<u8>>,
    pub connect_calls: usize,
    pub read_calls: usize,
    pub line_calls: usize,
    pub disconnect_calls: usize,
    pub connected: bool,
}

/// Transport whose state stays inspectable after it is moved into a device
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    pub state: Arc<Mutex<ScriptState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a greeting + auth exchange that succeeds
    pub fn push_handshake(&self) -> &Self {
        self.push_read(PJOK).push_read(PJACK)
    }

    pub fn push_read(&self, data: &[u8]) -> &Self {
        self.state.lock().reads.push_back(Reply::Bytes(data.to_vec()));
        self
    }

    pub fn push_line(&self, data: Vec<u8>) -> &Self {
        self.state.lock().lines.push_back(Reply::Bytes(data));
        self
    }

    pub fn push_line_reply(&self, reply: Reply) -> &Self {
        self.state.lock().lines.push_back(reply);
        self
    }

    pub fn push_connect(&self, outcome: ConnectOutcome) -> &Self {
        self.state.lock().connects.push_back(outcome);
        self
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().connect_calls
    }

    pub fn read_calls(&self) -> usize {
        self.state.lock().read_calls
    }

    pub fn connected(&self) -> bool {
        self.state.lock().connected
    }

    fn take(reply: Option<Reply>) -> Result<Vec<u8>> {
        match reply.unwrap_or(Reply::Timeout) {
            Reply::Bytes(data) => Ok(data),
            Reply::Delayed(delay, data) => {
                thread::sleep(delay);
                Ok(data)
            }
            Reply::Timeout => Err(ProjectorError::Timeout),
            Reply::Closed => Err(ProjectorError::ConnectionClosed),
        }
    }
}

impl Transport for ScriptedTransport {
    fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.connect_calls += 1;
        match state.connects.pop_front().unwrap_or(ConnectOutcome::Ok) {
            ConnectOutcome::Ok => {
                state.connected = true;
                Ok(())
            }
            ConnectOutcome::Refused => Err(ProjectorError::ConnectionRefused),
        }
    }

    fn read(&mut self, _n: usize) -> Result<Vec<u8>> {
        let mut state = self.state.lock();
        state.read_calls += 1;
        let reply = state.reads.pop_front();
        Self::take(reply)
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let reply = {
            let mut state = self.state.lock();
            state.line_calls += 1;
            state.lines.pop_front()
        };
        Self::take(reply)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if !state.connected {
            return Err(ProjectorError::ConnectionClosed);
        }
        state.writes.push(data.to_vec());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }

    fn disconnect(&mut self) {
        let mut state = self.state.lock();
        if state.connected {
            state.disconnect_calls += 1;
        }
        state.connected = false;
    }
}

/// Config with every hardware delay shrunk so tests run quickly
pub fn test_config() -> Config {
    Config::builder()
        .host("127.0.0.1")
        .timeout_ms(200)
        .connect_spacing_ms(0)
        .busy_backoff_ms(1)
        .refused_backoff_ms(1)
        .command_throttle_ms(0)
        .keepalive_ttl_ms(10_000)
        .build()
}

/// Build a line: header + code + delimiter
pub fn cc(header: &[u8], code: &str) -> Vec<u8> {
    let mut line = header.to_vec();
    line.extend_from_slice(code.as_bytes());
    line.push(END);
    line
}

/// Install a test-writer subscriber once; honours RUST_LOG
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
