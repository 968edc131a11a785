//! # Cachette
//!
//! A standalone in-memory cache server with:
//! - Scalar and list namespaces sharing one key space each
//! - Optional per-key expiry with a lazily maintained expiry index
//! - Length-prefixed JSON frames over TCP, authenticated by SHA-256 key digest
//! - A single-threaded, non-blocking connection loop
//! - A blocking client with reconnect, backoff, and bounded reads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client(s)                             │
//! │           (typed calls, reconnect + backoff)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  [len][json] frames
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Server Loop                                │
//! │     (accept, read, reassemble, authenticate, dispatch)       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Engine                                   │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │ Scalar namespace│                │  List namespace │
//!   │ + ExpiryIndex   │                │  + ExpiryIndex  │
//!   └─────────────────┘                └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod logging;

pub mod auth;
pub mod client;
pub mod engine;
pub mod expiry;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::{ClientConfig, ServerConfig};
pub use engine::Engine;
pub use error::{CacheError, Result};
pub use logging::{Logger, TracingLogger};
pub use network::{Server, ShutdownHandle};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of Cachette
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
