//! Configuration for Cachette
//!
//! Centralized server and client configuration with sensible defaults.
//! Both builders validate on `build()`.

use std::time::Duration;

use crate::error::{CacheError, Result};
use crate::logging::{LogSink, Logger};

/// Only transport the server and client speak
pub const PROTOCOL_TCP: &str = "tcp";

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 9999;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // -------------------------------------------------------------------------
    // Authentication
    // -------------------------------------------------------------------------
    /// Raw authentication keys; the server only keeps their SHA-256 digests
    pub auth_keys: Vec<String>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Transport protocol (only "tcp")
    pub protocol: String,

    /// Host to listen on
    pub host: String,

    /// Port to listen on (0 picks a free port)
    pub port: u16,

    // -------------------------------------------------------------------------
    // Loop Configuration
    // -------------------------------------------------------------------------
    /// Sleep between two iterations of the server loop
    pub poll_interval: Duration,

    /// Log connects and disconnects at info level
    pub verbose: bool,

    /// Log destination
    pub logger: LogSink,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            auth_keys: Vec::new(),
            protocol: PROTOCOL_TCP.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            poll_interval: Duration::from_micros(1000),
            verbose: false,
            logger: LogSink::default(),
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// "host:port" string the listener binds to
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the invariants `build()` enforces
    pub fn validate(&self) -> Result<()> {
        if self.auth_keys.is_empty() {
            return Err(CacheError::Config(
                "at least one auth key is required".to_string(),
            ));
        }
        if self.auth_keys.iter().any(|k| k.is_empty()) {
            return Err(CacheError::Config("auth keys must not be empty".to_string()));
        }
        validate_protocol(&self.protocol)
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Add one accepted authentication key
    pub fn auth_key(mut self, key: impl Into<String>) -> Self {
        self.config.auth_keys.push(key.into());
        self
    }

    /// Replace the accepted authentication keys
    pub fn auth_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.auth_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.protocol = protocol.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the loop sleep (in microseconds)
    pub fn poll_interval_micros(mut self, micros: u64) -> Self {
        self.config.poll_interval = Duration::from_micros(micros);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.config.logger = LogSink::new(logger);
        self
    }

    pub fn build(self) -> Result<ServerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Raw authentication key; hashed before it is ever sent
    pub auth_key: String,

    /// Transport protocol (only "tcp")
    pub protocol: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Upper bound on waiting for one response frame
    pub max_reading_delay: Duration,

    /// Upper bound on establishing the TCP connection
    pub connect_timeout: Duration,

    /// Connection attempts per reconnect before giving up
    pub max_reconnect_attempts: u32,

    /// Backoff unit; attempt `n` waits `(n - 1) * reconnect_backoff`
    pub reconnect_backoff: Duration,

    /// Log destination
    pub logger: LogSink,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auth_key: String::new(),
            protocol: PROTOCOL_TCP.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_reading_delay: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(30),
            max_reconnect_attempts: 3,
            reconnect_backoff: Duration::from_secs(1),
            logger: LogSink::default(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// "host:port" string the client connects to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check the invariants `build()` enforces
    pub fn validate(&self) -> Result<()> {
        if self.auth_key.is_empty() {
            return Err(CacheError::Config("no auth key found".to_string()));
        }
        if self.max_reconnect_attempts == 0 {
            return Err(CacheError::Config(
                "max_reconnect_attempts must be at least 1".to_string(),
            ));
        }
        validate_protocol(&self.protocol)
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn auth_key(mut self, key: impl Into<String>) -> Self {
        self.config.auth_key = key.into();
        self
    }

    pub fn protocol(mut self, protocol: impl Into<String>) -> Self {
        self.config.protocol = protocol.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn max_reading_delay(mut self, delay: Duration) -> Self {
        self.config.max_reading_delay = delay;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    pub fn reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.config.reconnect_backoff = backoff;
        self
    }

    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.config.logger = LogSink::new(logger);
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

fn validate_protocol(protocol: &str) -> Result<()> {
    if protocol.eq_ignore_ascii_case(PROTOCOL_TCP) {
        Ok(())
    } else {
        Err(CacheError::Config(format!(
            "unsupported protocol '{}', only tcp is available",
            protocol
        )))
    }
}
