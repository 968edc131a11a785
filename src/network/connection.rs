//! Connection Handler
//!
//! One accepted client socket and its reassembly buffer.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use bytes::{Bytes, BytesMut};

use crate::error::Result;
use crate::protocol::{encode_response, split_frame, ResponseMessage};

/// Bytes pulled from the socket per read call
const READ_CHUNK: usize = 8 * 1024;

/// Outcome of draining a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// Nothing to read right now
    Idle,

    /// This many bytes were appended to the buffer
    Received(usize),

    /// The peer closed its side, possibly after sending more bytes
    Closed,
}

/// A live client connection owned by the server loop
pub struct Connection {
    /// Non-blocking TCP stream
    stream: TcpStream,

    /// Bytes received but not yet consumed as whole frames
    buffer: BytesMut,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Wrap an accepted stream
    ///
    /// Switches the socket to non-blocking mode and disables Nagle's
    /// algorithm.
    pub fn new(stream: TcpStream) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            buffer: BytesMut::with_capacity(READ_CHUNK),
            peer_addr,
        })
    }

    /// Read everything currently available without blocking
    ///
    /// Bytes are read straight into the reassembly buffer. `Closed` may come
    /// after bytes were appended in the same call; those frames are still
    /// buffered and must be drained before the connection is dropped.
    pub fn read_available(&mut self) -> Result<ReadStatus> {
        let mut received = 0;

        loop {
            let filled = self.buffer.len();
            self.buffer.resize(filled + READ_CHUNK, 0);

            let result = self.stream.read(&mut self.buffer[filled..]);
            let read = result.as_ref().map_or(0, |n| *n);
            self.buffer.truncate(filled + read);

            match result {
                Ok(0) => return Ok(ReadStatus::Closed),
                Ok(n) => received += n,
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(if received == 0 {
            ReadStatus::Idle
        } else {
            ReadStatus::Received(received)
        })
    }

    /// Next complete frame payload in arrival order
    pub fn next_frame(&mut self) -> Result<Option<Bytes>> {
        split_frame(&mut self.buffer)
    }

    /// Send a response frame in one shot
    ///
    /// A short write on the non-blocking socket surfaces as an error; the
    /// caller evicts the connection.
    pub fn send(&mut self, response: &ResponseMessage) -> Result<()> {
        self.stream.write_all(&encode_response(response))?;
        Ok(())
    }

    /// Bytes waiting for the rest of their frame
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    /// Close both directions of the socket
    pub fn close(self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}
