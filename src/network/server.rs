//! TCP Server
//!
//! Single-threaded reactor: accepts, reads, dispatches, and writes for every
//! connection from one loop.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::Level;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::engine::Engine;
use crate::error::{CacheError, Result};
use crate::protocol::{decode_command, ResponseMessage};

use super::connection::{Connection, ReadStatus};

/// Cooperative stop flag checked at every loop iteration
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    /// Ask the loop to stop after the current iteration
    pub fn trigger(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// TCP server for Cachette
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    engine: Engine,
    auth: Authenticator,
    connections: Vec<Connection>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Bind the listening socket
    pub fn bind(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr).map_err(|e| {
            config
                .logger
                .log(Level::ERROR, &format!("Socket creation failed: {}", e));
            CacheError::Connection(format!("Unable to start server on {}: {}", addr, e))
        })?;

        Self::from_listener(config, listener)
    }

    /// Serve on a listener that is already bound
    pub fn from_listener(config: ServerConfig, listener: TcpListener) -> Result<Self> {
        config.validate()?;

        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            auth: Authenticator::new(&config.auth_keys),
            config,
            listener,
            local_addr,
            engine: Engine::new(),
            connections: Vec::new(),
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle that stops [`Server::run`] from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the loop until the shutdown handle fires, then close everything
    pub fn run(mut self) -> Result<()> {
        self.log(Level::INFO, &format!("Cache server started on {}", self.local_addr));

        while !self.shutdown.is_triggered() {
            self.tick();
            thread::sleep(self.config.poll_interval);
        }

        self.close();
        Ok(())
    }

    /// One loop iteration: sweep, accept, then service readable connections
    ///
    /// A failing accept never skips servicing the clients already connected.
    pub fn tick(&mut self) {
        let expired = self.engine.check_expiries();
        if expired > 0 {
            self.log(Level::DEBUG, &format!("Expired {} keys", expired));
        }

        self.accept_pending();
        self.service_connections();
    }

    /// Accept until the listener has nothing queued or accept fails
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, _)) => {
                    if let Err(e) = self.adopt(stream) {
                        self.log(Level::WARN, &format!("Failed to set up client: {}", e));
                    }
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    // EMFILE and friends: retry on the next tick
                    self.log(Level::WARN, &format!("Accept failed: {}", e));
                    return;
                }
            }
        }
    }

    /// Hand an already connected client stream to the loop
    pub fn adopt(&mut self, stream: TcpStream) -> Result<()> {
        let conn = Connection::new(stream)?;
        if self.config.verbose {
            self.log(
                Level::INFO,
                &format!("Client connected: {}", conn.peer_addr()),
            );
        }
        self.connections.push(conn);
        Ok(())
    }

    /// Drain every connection once, evicting the dead ones
    fn service_connections(&mut self) {
        let Self {
            config,
            engine,
            auth,
            connections,
            ..
        } = self;
        let logger = &config.logger;
        let verbose = config.verbose;

        let mut evicted = Vec::new();
        let mut index = 0;
        while index < connections.len() {
            match service(&mut connections[index], engine, auth) {
                Ok(true) => index += 1,
                Ok(false) => {
                    if verbose {
                        logger.log(
                            Level::INFO,
                            &format!("Client disconnected: {}", connections[index].peer_addr()),
                        );
                    }
                    evicted.push(connections.swap_remove(index));
                }
                Err(e) => {
                    logger.log(
                        Level::WARN,
                        &format!("Dropping client {}: {}", connections[index].peer_addr(), e),
                    );
                    evicted.push(connections.swap_remove(index));
                }
            }
        }

        for conn in evicted {
            conn.close();
        }
    }

    /// Build the response for one frame payload
    pub fn handle_frame(&mut self, payload: &[u8]) -> ResponseMessage {
        dispatch(&mut self.engine, &self.auth, payload)
    }

    /// Close every client connection and the listener
    pub fn close(self) {
        let count = self.connections.len();
        for conn in self.connections {
            conn.close();
        }
        self.config.logger.log(
            Level::INFO,
            &format!("Cache server shut down, closed {} connections", count),
        );
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn log(&self, level: Level, message: &str) {
        self.config.logger.log(level, message);
    }
}

/// Read and answer every complete frame on one connection
///
/// `Ok(false)` means the peer closed; an error is a transport failure. Both
/// evict the connection. Frames that arrived before the close are still
/// applied, but their responses may have nowhere to go.
fn service(conn: &mut Connection, engine: &mut Engine, auth: &Authenticator) -> Result<bool> {
    let closed = match conn.read_available()? {
        ReadStatus::Idle => return Ok(true),
        ReadStatus::Received(_) => false,
        ReadStatus::Closed => true,
    };

    while let Some(payload) = conn.next_frame()? {
        let response = dispatch(engine, auth, &payload);
        if closed {
            let _ = conn.send(&response);
        } else {
            conn.send(&response)?;
        }
    }
    Ok(!closed)
}

/// Decode, authenticate, and apply one command
fn dispatch(engine: &mut Engine, auth: &Authenticator, payload: &[u8]) -> ResponseMessage {
    let command = match decode_command(payload) {
        Ok(command) => command,
        Err(e) => return ResponseMessage::error(e),
    };

    if !auth.is_authenticated(&command.auth_key) {
        return ResponseMessage::error(CacheError::Authentication);
    }

    engine.apply(&command)
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("local_addr", &self.local_addr)
            .field("connections", &self.connections.len())
            .finish()
    }
}
