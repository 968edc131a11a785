//! RPC client
//!
//! One outbound connection plus the typed command surface.

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

use tracing::Level;

use crate::auth::hash_auth_key;
use crate::config::ClientConfig;
use crate::error::{CacheError, Result};
use crate::protocol::{
    decode_response, encode_command, CommandKind, CommandMessage, ResponseMessage, Stats, Val,
    Value, HEADER_SIZE, MAX_FRAME_SIZE,
};

/// Sleep between two polls of a non-blocking socket
const POLL_SLEEP: Duration = Duration::from_millis(1);

/// Synchronous client owning a single connection
///
/// Methods take `&mut self`: one call is in flight at a time. Share a client
/// across threads only behind a lock.
pub struct Client {
    config: ClientConfig,

    /// Hex SHA-256 of the configured key, sent with every command
    auth_key: String,

    stream: Option<TcpStream>,
    connected: bool,

    /// Failed attempts during the reconnect in progress
    reconnect_attempts: u32,
}

impl Client {
    /// Create a client; the connection is opened lazily by the first call
    pub fn new(config: ClientConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            config.logger.log(Level::ERROR, &e.to_string());
            return Err(e);
        }

        Ok(Self {
            auth_key: hash_auth_key(&config.auth_key),
            config,
            stream: None,
            connected: false,
            reconnect_attempts: 0,
        })
    }

    // =========================================================================
    // Connection management
    // =========================================================================

    /// Whether the connection is up and the peer has not closed it
    pub fn is_connected(&self) -> bool {
        self.connected && self.is_socket_alive()
    }

    /// Failed attempts of the current reconnect
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    fn is_socket_alive(&self) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return false;
        };

        let mut probe = [0u8; 1];
        match stream.peek(&mut probe) {
            Ok(0) => false,
            Ok(_) => true,
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => true,
            Err(_) => false,
        }
    }

    fn connect(&mut self) -> Result<()> {
        let target = self.config.server_addr();
        let addrs: Vec<SocketAddr> = target
            .to_socket_addrs()
            .map_err(|e| CacheError::Connection(format!("Cannot resolve {}: {}", target, e)))?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.config.connect_timeout) {
                Ok(stream) => {
                    stream.set_nonblocking(true)?;
                    stream.set_nodelay(true)?;
                    self.stream = Some(stream);
                    self.connected = true;
                    return Ok(());
                }
                Err(e) => last_error = Some(e),
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no address resolved".to_string());
        Err(CacheError::Connection(format!(
            "Connection to {} failed: {}",
            target, reason
        )))
    }

    /// Drop the current connection, if any
    pub fn disconnect(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.connected = false;
    }

    /// Reconnect when the connection is missing or stale
    fn check_connection(&mut self) -> Result<()> {
        if !self.is_connected() {
            self.reconnect()?;
        }
        Ok(())
    }

    /// Close the transport and reconnect with linear backoff
    ///
    /// Before attempt `n` (from the second on) the client waits
    /// `(n - 1) * reconnect_backoff`.
    pub fn reconnect(&mut self) -> Result<()> {
        self.disconnect();
        self.reconnect_attempts = 0;

        let max_attempts = self.config.max_reconnect_attempts;
        while self.reconnect_attempts < max_attempts {
            if self.reconnect_attempts > 0 {
                thread::sleep(self.config.reconnect_backoff * self.reconnect_attempts);
            }

            self.log(
                Level::INFO,
                &format!(
                    "Attempting to connect (attempt {})...",
                    self.reconnect_attempts + 1
                ),
            );
            match self.connect() {
                Ok(()) => {
                    self.log(Level::INFO, "Connection successful.");
                    self.reconnect_attempts = 0;
                    return Ok(());
                }
                Err(e) => {
                    self.reconnect_attempts += 1;
                    self.log(
                        Level::WARN,
                        &format!("Connection attempt {} failed: {}", self.reconnect_attempts, e),
                    );
                }
            }
        }

        self.log(
            Level::ERROR,
            &format!("Failed to connect after {} attempts", max_attempts),
        );
        Err(CacheError::ReconnectExhausted(max_attempts))
    }

    // =========================================================================
    // Raw call
    // =========================================================================

    /// Send one command and wait for its response
    ///
    /// `{"error": ...}` responses come back as [`CacheError::Remote`].
    pub fn call(&mut self, command: &CommandMessage) -> Result<Value> {
        self.check_connection()?;

        let frame = encode_command(command);
        if let Err(e) = self.send(&frame) {
            self.log(Level::WARN, &format!("Write failed, reconnecting: {}", e));
            self.reconnect()?;
            if let Err(e) = self.send(&frame) {
                self.disconnect();
                let message = format!("Error writing to the cache server after reconnect: {}", e);
                self.log(Level::ERROR, &message);
                return Err(CacheError::Connection(message));
            }
        }

        match self.receive()? {
            ResponseMessage::Results(value) => Ok(value),
            ResponseMessage::Error(message) => {
                self.log(Level::ERROR, &message);
                Err(CacheError::Remote(message))
            }
        }
    }

    fn send(&mut self, frame: &[u8]) -> Result<()> {
        let deadline = Instant::now() + self.config.max_reading_delay;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CacheError::Connection("not connected".to_string()))?;

        let mut written = 0;
        while written < frame.len() {
            match stream.write(&frame[written..]) {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => written += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(CacheError::Timeout(self.config.max_reading_delay));
                    }
                    thread::sleep(POLL_SLEEP);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Read one response frame within `max_reading_delay`
    fn receive(&mut self) -> Result<ResponseMessage> {
        let deadline = Instant::now() + self.config.max_reading_delay;

        let mut header = [0u8; HEADER_SIZE];
        self.read_exact_before(&mut header, deadline)?;

        let payload_len = u32::from_be_bytes(header);
        if payload_len > MAX_FRAME_SIZE {
            self.disconnect();
            return Err(CacheError::Protocol(format!(
                "Response payload too large: {} bytes (max {})",
                payload_len, MAX_FRAME_SIZE
            )));
        }

        let mut payload = vec![0u8; payload_len as usize];
        self.read_exact_before(&mut payload, deadline)?;

        decode_response(&payload)
    }

    /// Fill `buf` from the non-blocking socket, polling until `deadline`
    ///
    /// Any failure leaves the stream out of step with the server, so the
    /// connection is dropped and the next call reconnects.
    fn read_exact_before(&mut self, buf: &mut [u8], deadline: Instant) -> Result<()> {
        let result = self.poll_read(buf, deadline);
        if result.is_err() {
            self.disconnect();
        }
        result
    }

    fn poll_read(&mut self, buf: &mut [u8], deadline: Instant) -> Result<()> {
        let max_delay = self.config.max_reading_delay;
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| CacheError::Connection("not connected".to_string()))?;

        let mut filled = 0;
        while filled < buf.len() {
            match stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(CacheError::Connection(
                        "Server closed the connection".to_string(),
                    ))
                }
                Ok(n) => filled += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if Instant::now() >= deadline {
                        return Err(CacheError::Timeout(max_delay));
                    }
                    thread::sleep(POLL_SLEEP);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn log(&self, level: Level, message: &str) {
        self.config.logger.log(level, message);
    }

    fn command(&self, kind: CommandKind) -> CommandMessage {
        CommandMessage::new(self.auth_key.clone(), kind)
    }

    fn keyed(&mut self, kind: CommandKind, key: &str) -> Result<Value> {
        let command = self.command(kind).with_key(key);
        self.call(&command)
    }

    // =========================================================================
    // Scalar commands
    // =========================================================================

    pub fn exists(&mut self, key: &str) -> Result<bool> {
        expect_bool(self.keyed(CommandKind::Exists, key)?)
    }

    /// Reset the lifetime of an existing key; `ttl <= 0` clears the expiry
    pub fn expire(&mut self, key: &str, ttl: f64) -> Result<()> {
        let command = self.command(CommandKind::Expire).with_key(key).with_ttl(ttl);
        expect_str(self.call(&command)?).map(drop)
    }

    /// Value of a key; a missing key reads as `""`
    pub fn get(&mut self, key: &str) -> Result<String> {
        expect_str(self.keyed(CommandKind::Get, key)?)
    }

    pub fn get_all_keys(&mut self) -> Result<Vec<String>> {
        let command = self.command(CommandKind::GetAllKeys);
        expect_seq(self.call(&command)?)
    }

    /// Get then delete; a missing key reads as `""`
    pub fn get_rem(&mut self, key: &str) -> Result<String> {
        expect_str(self.keyed(CommandKind::GetRem, key)?)
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        expect_str(self.keyed(CommandKind::Remove, key)?).map(drop)
    }

    /// Store a value; `ttl` in seconds, 0 for no expiry
    pub fn set(&mut self, key: &str, val: &str, ttl: f64) -> Result<()> {
        let command = self
            .command(CommandKind::Set)
            .with_key(key)
            .with_val(val)
            .with_ttl(ttl);
        expect_str(self.call(&command)?).map(drop)
    }

    // =========================================================================
    // List commands
    // =========================================================================

    pub fn list_exists(&mut self, key: &str) -> Result<bool> {
        expect_bool(self.keyed(CommandKind::ListExists, key)?)
    }

    pub fn list_expire(&mut self, key: &str, ttl: f64) -> Result<()> {
        let command = self
            .command(CommandKind::ListExpire)
            .with_key(key)
            .with_ttl(ttl);
        expect_str(self.call(&command)?).map(drop)
    }

    /// Prepend one value or a sequence (kept in its given order); returns
    /// the new length
    pub fn list_add_first(&mut self, key: &str, val: impl Into<Val>, ttl: f64) -> Result<i64> {
        let command = self
            .command(CommandKind::ListAddFirst)
            .with_key(key)
            .with_val(val)
            .with_ttl(ttl);
        expect_int(self.call(&command)?)
    }

    /// Append one value or a sequence; returns the new length
    pub fn list_add_last(&mut self, key: &str, val: impl Into<Val>, ttl: f64) -> Result<i64> {
        let command = self
            .command(CommandKind::ListAddLast)
            .with_key(key)
            .with_val(val)
            .with_ttl(ttl);
        expect_int(self.call(&command)?)
    }

    /// Whole list; a missing list comes back empty
    pub fn list_get(&mut self, key: &str) -> Result<Vec<String>> {
        expect_list(self.keyed(CommandKind::ListGet, key)?)
    }

    pub fn list_get_first(&mut self, key: &str) -> Result<Option<String>> {
        expect_opt_str(self.keyed(CommandKind::ListGetFirst, key)?)
    }

    pub fn list_get_rem_first(&mut self, key: &str) -> Result<Option<String>> {
        expect_opt_str(self.keyed(CommandKind::ListGetRemFirst, key)?)
    }

    pub fn list_get_last(&mut self, key: &str) -> Result<Option<String>> {
        expect_opt_str(self.keyed(CommandKind::ListGetLast, key)?)
    }

    pub fn list_get_rem_last(&mut self, key: &str) -> Result<Option<String>> {
        expect_opt_str(self.keyed(CommandKind::ListGetRemLast, key)?)
    }

    pub fn list_get_all_keys(&mut self) -> Result<Vec<String>> {
        let command = self.command(CommandKind::ListGetAllKeys);
        expect_seq(self.call(&command)?)
    }

    /// Whole list, then delete it; a missing list comes back empty
    pub fn list_get_rem(&mut self, key: &str) -> Result<Vec<String>> {
        expect_list(self.keyed(CommandKind::ListGetRem, key)?)
    }

    pub fn list_remove(&mut self, key: &str) -> Result<()> {
        expect_str(self.keyed(CommandKind::ListRemove, key)?).map(drop)
    }

    /// Replace the whole list
    pub fn list_set<I, S>(&mut self, key: &str, values: I, ttl: f64) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        let command = self
            .command(CommandKind::ListSet)
            .with_key(key)
            .with_val(values)
            .with_ttl(ttl);
        expect_str(self.call(&command)?).map(drop)
    }

    // =========================================================================
    // Server commands
    // =========================================================================

    pub fn ping(&mut self) -> Result<String> {
        let command = self.command(CommandKind::Ping);
        expect_str(self.call(&command)?)
    }

    pub fn stats(&mut self) -> Result<Stats> {
        let command = self.command(CommandKind::Stats);
        match self.call(&command)? {
            Value::Stats(stats) => Ok(stats),
            other => Err(mismatch("stats", &other)),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// =============================================================================
// Response shape checks
// =============================================================================

fn mismatch(expected: &'static str, actual: &Value) -> CacheError {
    CacheError::UnexpectedResponse {
        expected,
        actual: actual.kind_name().to_string(),
    }
}

fn expect_bool(value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        other => Err(mismatch("bool", &other)),
    }
}

fn expect_str(value: Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(mismatch("string", &other)),
    }
}

fn expect_opt_str(value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::Str(s) => Ok(Some(s)),
        other => Err(mismatch("string or null", &other)),
    }
}

fn expect_int(value: Value) -> Result<i64> {
    match value {
        Value::Int(n) => Ok(n),
        other => Err(mismatch("integer", &other)),
    }
}

fn expect_seq(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Seq(items) => Ok(items),
        other => Err(mismatch("sequence", &other)),
    }
}

/// Like `expect_seq`, but the server's `""` for a missing list maps to empty
fn expect_list(value: Value) -> Result<Vec<String>> {
    match value {
        Value::Str(s) if s.is_empty() => Ok(Vec::new()),
        other => expect_seq(other),
    }
}
