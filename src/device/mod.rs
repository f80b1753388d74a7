//! Device Module
//!
//! The command executor that owns one projector session.
//!
//! ## Responsibilities
//! - Serialize command batches through a single session lock
//! - Connect (rate limited) and handshake on demand
//! - Frame, send and validate each command in a batch
//! - Stop status refreshes early when the projector is not on
//! - Hold the connection open for a keepalive window after a successful send

mod handshake;
mod keepalive;
mod rate_limit;

pub use handshake::AuthScheme;
pub use rate_limit::RateLimiter;

use std::net::SocketAddr;
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{ProjectorError, Result};
use crate::network::{TcpTransport, Transport};
use crate::protocol::{decode_response, encode_command, opcode, validate_ack, Command};
use handshake::Credentials;
use keepalive::KeepaliveHandle;

/// A handle to one projector
///
/// ## Concurrency Model
///
/// - One batch at a time: `send`, `connect` and `disconnect` all run under
///   the session lock, so concurrent callers queue behind each other.
/// - The keepalive job runs on its own thread. It only disconnects after
///   re-acquiring the lock and confirming it is still the pending job, so a
///   `send` that cancelled it under the lock always keeps the connection.
/// - Accessors never wait for a running batch. While the session is busy they
///   report the state recorded at the last connect or disconnect.
///
/// Cloning is cheap and every clone talks to the same session.
pub struct Device<T: Transport = TcpTransport> {
    shared: Arc<Shared<T>>,
}

struct Shared<T: Transport> {
    config: Config,
    credentials: Credentials,
    session: Mutex<Session<T>>,
    link: Mutex<Link>,
}

/// Last-known connection state, readable without the session lock
#[derive(Debug, Default)]
struct Link {
    connected: bool,
    peer_addr: Option<SocketAddr>,
    auth_scheme: Option<AuthScheme>,
}

/// Mutable session state, guarded by the session lock
struct Session<T: Transport> {
    transport: T,
    rate_limiter: RateLimiter,
    keepalive: Option<KeepaliveHandle>,
    next_keepalive_id: u64,
}

impl<T: Transport> Clone for Device<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Device<TcpTransport> {
    /// Create a device that talks TCP to `config.host:config.port`
    ///
    /// No connection is made until the first `connect` or `send`.
    pub fn new(config: Config) -> Result<Self> {
        let transport = TcpTransport::from_config(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Device<T> {
    /// Create a device over a caller-supplied transport
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        config.validate()?;

        let credentials = Credentials::from_password(config.password.as_deref());
        let session = Session {
            transport,
            rate_limiter: RateLimiter::new(config.connect_spacing()),
            keepalive: None,
            next_keepalive_id: 0,
        };

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                credentials,
                session: Mutex::new(session),
                link: Mutex::new(Link::default()),
            }),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    /// Address of the current connection, if connected
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match self.shared.session.try_lock() {
            Some(session) => session.transport.peer_addr(),
            None => self.shared.link.lock().peer_addr,
        }
    }

    /// Scheme accepted by the most recent successful handshake
    pub fn auth_scheme(&self) -> Option<AuthScheme> {
        self.shared.link.lock().auth_scheme
    }

    pub fn is_connected(&self) -> bool {
        match self.shared.session.try_lock() {
            Some(session) => session.transport.is_connected(),
            None => self.shared.link.lock().connected,
        }
    }

    // =========================================================================
    // Connection Lifetime
    // =========================================================================

    /// Connect and authenticate now, if not already connected
    ///
    /// A pending keepalive is cancelled; the connection then stays open until
    /// the next `send` completes or `disconnect` is called.
    pub fn connect(&self) -> Result<()> {
        let mut session = self.shared.session.lock();
        session.cancel_keepalive();
        if !session.transport.is_connected() {
            session.open(&self.shared)?;
        }
        Ok(())
    }

    /// Cancel any pending keepalive and close the connection
    pub fn disconnect(&self) {
        let mut session = self.shared.session.lock();
        session.cancel_keepalive();
        session.close(&self.shared);
    }

    // =========================================================================
    // Command Execution
    // =========================================================================

    /// Send a batch of commands, recording acks and responses in place
    ///
    /// ## Flow
    /// 1. Lock the session
    /// 2. Reuse a pending keepalive connection, or connect + handshake
    /// 3. Send each command and wait for its ack (and response for queries)
    /// 4. Keep the connection open for the keepalive window, or disconnect
    ///
    /// An ack or response timeout is not an error: the command stays
    /// unacknowledged and the rest of the batch is skipped. Any error closes
    /// the connection so the next call starts clean.
    pub fn send(&self, commands: &mut [Command]) -> Result<()> {
        validate_batch(commands)?;

        let mut session = self.shared.session.lock();

        // Status refreshes are treated specially
        let is_refresh = commands.len() > 1 && commands[0].is_query() && commands[0].is_power();

        // A pending keepalive hands its connection to this batch. Refreshes
        // may extend a window but never open a new one.
        let mut keepalive = true;
        if session.keepalive.is_some() {
            session.cancel_keepalive();
        } else if is_refresh {
            keepalive = false;
        }

        match session.run_batch(&self.shared, commands, is_refresh) {
            Ok(last_acked) if keepalive && last_acked => {
                self.schedule_keepalive(&mut session);
                Ok(())
            }
            Ok(_) => {
                session.close(&self.shared);
                Ok(())
            }
            Err(e) => {
                session.close(&self.shared);
                Err(e)
            }
        }
    }

    fn schedule_keepalive(&self, session: &mut Session<T>) {
        let id = session.next_keepalive_id;
        session.next_keepalive_id = session.next_keepalive_id.wrapping_add(1);

        let weak: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        let scheduled = KeepaliveHandle::schedule(id, self.shared.config.keepalive_ttl(), move |id| {
            if let Some(shared) = weak.upgrade() {
                let mut session = shared.session.lock();
                if session.keepalive.as_ref().map(KeepaliveHandle::id) == Some(id) {
                    session.keepalive = None;
                    tracing::debug!("Keepalive window elapsed");
                    session.close(&shared);
                }
            }
        });

        match scheduled {
            Ok(handle) => session.keepalive = Some(handle),
            Err(e) => {
                tracing::warn!("Failed to schedule keepalive: {}", e);
                session.close(&self.shared);
            }
        }
    }
}

impl<T: Transport> Session<T> {
    /// Rate limit, then connect and authenticate
    fn open(&mut self, shared: &Shared<T>) -> Result<()> {
        self.rate_limiter.wait();
        let result = handshake::connect(&mut self.transport, &shared.config, &shared.credentials);

        let mut link = shared.link.lock();
        link.connected = self.transport.is_connected();
        link.peer_addr = self.transport.peer_addr();
        let scheme = result?;
        link.auth_scheme = Some(scheme);
        Ok(())
    }

    fn close(&mut self, shared: &Shared<T>) {
        self.transport.disconnect();
        let mut link = shared.link.lock();
        link.connected = false;
        link.peer_addr = None;
        tracing::debug!("Disconnected");
    }

    fn cancel_keepalive(&mut self) {
        if let Some(handle) = self.keepalive.take() {
            handle.cancel();
        }
    }

    /// Run every command in order; returns whether the last one attempted
    /// was acknowledged
    fn run_batch(
        &mut self,
        shared: &Shared<T>,
        commands: &mut [Command],
        is_refresh: bool,
    ) -> Result<bool> {
        if !self.transport.is_connected() {
            self.open(shared)?;
        }

        let throttle = shared.config.command_throttle();
        let mut last_acked = false;

        for (index, command) in commands.iter_mut().enumerate() {
            last_acked = exchange(&mut self.transport, command)?;
            if !last_acked {
                break;
            }

            // Some projectors lock up on back to back commands
            thread::sleep(throttle);

            // Projector is not on; further queries would only time out
            if is_refresh && index == 0 && command.response() != Some(opcode::ON) {
                break;
            }
        }

        Ok(last_acked)
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        self.cancel_keepalive();
        self.transport.disconnect();
    }
}

/// Send one command and read its ack (and response, for queries)
///
/// Returns `Ok(false)` when the device did not answer in time.
fn exchange<T: Transport>(transport: &mut T, command: &mut Command) -> Result<bool> {
    let frame = encode_command(command);
    let kind = if command.is_query() { "ref" } else { "op" };
    tracing::debug!("Sending {} '{} ({})'", kind, command.code().escape_debug(), frame.escape_ascii());
    transport.write(&frame)?;

    let ack = match transport.read_line() {
        Ok(line) => line,
        Err(e) if e.is_timeout() => {
            tracing::warn!("Response timeout for '{}'", command.code().escape_debug());
            return Ok(false);
        }
        Err(e) => return Err(e),
    };
    tracing::debug!("Received ack {}", ack.escape_ascii());
    validate_ack(command.code(), &ack)?;

    let reply = if command.is_query() {
        let line = match transport.read_line() {
            Ok(line) => line,
            Err(e) if e.is_timeout() => {
                tracing::warn!("Ref response timeout for '{}'", command.code().escape_debug());
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        tracing::debug!("Received ref {}", line.escape_ascii());
        let payload = decode_response(command.code(), &line)?;
        Some((payload, line))
    } else {
        None
    };

    command.complete(reply);
    Ok(true)
}

fn validate_batch(commands: &[Command]) -> Result<()> {
    if commands.is_empty() {
        return Err(ProjectorError::InvalidCommand("empty command batch".to_string()));
    }
    if let Some(short) = commands.iter().find(|c| c.code().len() < 2) {
        return Err(ProjectorError::InvalidCommand(format!(
            "opcode '{}' is shorter than 2 bytes",
            short.code().escape_debug()
        )));
    }
    Ok(())
}
