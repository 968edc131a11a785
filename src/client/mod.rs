//! Client Module
//!
//! Blocking RPC client for a Cachette server.
//!
//! ## Call discipline
//! - Exactly one command frame, then exactly one response frame
//! - The socket is non-blocking; reads poll with a short sleep until
//!   `max_reading_delay` runs out
//! - A failed write triggers one reconnect and one retry
//! - A stale connection is detected before each call and re-established
//!   with linear backoff

mod rpc;
pub mod quick;

pub use rpc::Client;
