//! Network Module
//!
//! TCP server and client connection handling.
//!
//! ## Architecture
//! - One thread runs the whole server loop
//! - Non-blocking listener, drained on every iteration
//! - Non-blocking client sockets, each with its own reassembly buffer
//! - Commands routed through the Engine

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{Connection, ReadStatus};
