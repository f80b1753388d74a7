//! Configuration for a projector connection
//!
//! Centralized configuration with sensible defaults. The timing defaults were
//! tuned against real hardware and are exposed so slower or faster units can
//! be accommodated.

use std::time::Duration;

use crate::error::{ProjectorError, Result};

/// Well-known JVC control port
pub const DEFAULT_PORT: u16 = 20554;

/// Main configuration for one projector
#[derive(Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Target
    // -------------------------------------------------------------------------
    /// Hostname or IP address of the projector
    pub host: String,

    /// TCP control port
    pub port: u16,

    /// Per-I/O timeout (milliseconds), applied to connect, reads and writes
    pub timeout_ms: u64,

    /// Optional network password configured on the projector
    pub password: Option<String>,

    // -------------------------------------------------------------------------
    // Connection Policy
    // -------------------------------------------------------------------------
    /// Minimum spacing between physical connect attempts (milliseconds)
    pub connect_spacing_ms: u64,

    /// Backoff unit after a busy greeting, multiplied by the attempt number
    pub busy_backoff_ms: u64,

    /// Backoff unit after a refused connect, multiplied by the attempt number
    pub refused_backoff_ms: u64,

    /// Connect attempts before giving up
    pub max_connect_retries: u32,

    // -------------------------------------------------------------------------
    // Command Policy
    // -------------------------------------------------------------------------
    /// Settling delay after every command (milliseconds)
    pub command_throttle_ms: u64,

    /// Idle window a connection is held open after a send (milliseconds)
    pub keepalive_ttl_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout_ms: 15_000,
            password: None,
            connect_spacing_ms: 750,
            busy_backoff_ms: 250,
            refused_backoff_ms: 200,
            max_connect_retries: 10,
            command_throttle_ms: 200,
            keepalive_ttl_ms: 2_000,
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("timeout_ms", &self.timeout_ms)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("connect_spacing_ms", &self.connect_spacing_ms)
            .field("busy_backoff_ms", &self.busy_backoff_ms)
            .field("refused_backoff_ms", &self.refused_backoff_ms)
            .field("max_connect_retries", &self.max_connect_retries)
            .field("command_throttle_ms", &self.command_throttle_ms)
            .field("keepalive_ttl_ms", &self.keepalive_ttl_ms)
            .finish()
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the configuration for values the protocol cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(ProjectorError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(ProjectorError::Config("port must not be 0".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ProjectorError::Config("timeout must be positive".to_string()));
        }
        if self.max_connect_retries == 0 {
            return Err(ProjectorError::Config(
                "at least one connect attempt is required".to_string(),
            ));
        }
        if matches!(self.password.as_deref(), Some("")) {
            return Err(ProjectorError::Config(
                "password must not be empty; use None for no password".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_spacing(&self) -> Duration {
        Duration::from_millis(self.connect_spacing_ms)
    }

    pub fn busy_backoff(&self) -> Duration {
        Duration::from_millis(self.busy_backoff_ms)
    }

    pub fn refused_backoff(&self) -> Duration {
        Duration::from_millis(self.refused_backoff_ms)
    }

    pub fn command_throttle(&self) -> Duration {
        Duration::from_millis(self.command_throttle_ms)
    }

    pub fn keepalive_ttl(&self) -> Duration {
        Duration::from_millis(self.keepalive_ttl_ms)
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the projector host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the control port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the per-I/O timeout (in milliseconds)
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.timeout_ms = ms;
        self
    }

    /// Set the network password
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Set the minimum spacing between connect attempts (in milliseconds)
    pub fn connect_spacing_ms(mut self, ms: u64) -> Self {
        self.config.connect_spacing_ms = ms;
        self
    }

    /// Set the busy-greeting backoff unit (in milliseconds)
    pub fn busy_backoff_ms(mut self, ms: u64) -> Self {
        self.config.busy_backoff_ms = ms;
        self
    }

    /// Set the refused-connect backoff unit (in milliseconds)
    pub fn refused_backoff_ms(mut self, ms: u64) -> Self {
        self.config.refused_backoff_ms = ms;
        self
    }

    /// Set the number of connect attempts
    pub fn max_connect_retries(mut self, count: u32) -> Self {
        self.config.max_connect_retries = count;
        self
    }

    /// Set the inter-command settling delay (in milliseconds)
    pub fn command_throttle_ms(mut self, ms: u64) -> Self {
        self.config.command_throttle_ms = ms;
        self
    }

    /// Set the keepalive window (in milliseconds)
    pub fn keepalive_ttl_ms(mut self, ms: u64) -> Self {
        self.config.keepalive_ttl_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
