//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │ Len (4)  │      UTF-8 JSON payload (Len bytes)     │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! The length is a big-endian `u32`. Commands and responses share the same
//! framing; only the JSON shape differs.

use std::io::{Read, Write};

use bytes::{Buf, Bytes, BytesMut};
use serde::Serialize;

use crate::error::{CacheError, Result};
use super::{CommandMessage, ResponseMessage};

/// Header size: 4 bytes length
pub const HEADER_SIZE: usize = 4;

/// Maximum payload size (16 MB)
pub const MAX_FRAME_SIZE: u32 = 16 * 1024 * 1024;

// =============================================================================
// Framing
// =============================================================================

/// Wrap a payload in a length-prefixed frame
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);
    message
}

/// Strip one complete frame off the front of a reassembly buffer
///
/// Returns `Ok(None)` while the header or payload is still partial, leaving
/// the buffer untouched. An oversized declared length is an error because
/// the stream can no longer be resynchronised.
pub fn split_frame(buffer: &mut BytesMut) -> Result<Option<Bytes>> {
    if buffer.len() < HEADER_SIZE {
        return Ok(None);
    }

    let payload_len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
    check_frame_len(payload_len)?;

    let total_len = HEADER_SIZE + payload_len as usize;
    if buffer.len() < total_len {
        return Ok(None);
    }

    buffer.advance(HEADER_SIZE);
    Ok(Some(buffer.split_to(payload_len as usize).freeze()))
}

fn check_frame_len(payload_len: u32) -> Result<()> {
    if payload_len > MAX_FRAME_SIZE {
        return Err(CacheError::Protocol(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_FRAME_SIZE
        )));
    }
    Ok(())
}

fn encode_json<T: Serialize>(message: &T) -> Vec<u8> {
    // Only fails on non-string map keys, which these types never carry
    let payload = serde_json::to_vec(message).unwrap_or_else(|_| b"{}".to_vec());
    frame(&payload)
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command into a complete frame
pub fn encode_command(command: &CommandMessage) -> Vec<u8> {
    encode_json(command)
}

/// Decode a command from a frame payload (header already stripped)
pub fn decode_command(payload: &[u8]) -> Result<CommandMessage> {
    Ok(serde_json::from_slice(payload)?)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response into a complete frame
pub fn encode_response(response: &ResponseMessage) -> Vec<u8> {
    encode_json(response)
}

/// Decode a response from a frame payload (header already stripped)
pub fn decode_response(payload: &[u8]) -> Result<ResponseMessage> {
    Ok(serde_json::from_slice(payload)?)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one frame payload from a blocking stream
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes(header);
    check_frame_len(payload_len)?;

    let mut payload = vec![0u8; payload_len as usize];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

/// Read a complete command from a stream
pub fn read_command<R: Read>(reader: &mut R) -> Result<CommandMessage> {
    decode_command(&read_frame(reader)?)
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &CommandMessage) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<ResponseMessage> {
    decode_response(&read_frame(reader)?)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &ResponseMessage) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
