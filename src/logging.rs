//! Logging sink
//!
//! Server and client report lifecycle events through an injected [`Logger`].
//! The default sink forwards everything to `tracing`, so binaries only have
//! to install a subscriber.

use std::fmt;
use std::sync::Arc;

use tracing::Level;

/// A destination for log lines emitted by the server loop and the client
pub trait Logger: Send + Sync {
    /// Record one message at the given level
    fn log(&self, level: Level, message: &str);
}

/// Forwards log lines to the `tracing` macros
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!("{}", message),
            Level::WARN => tracing::warn!("{}", message),
            Level::INFO => tracing::info!("{}", message),
            Level::DEBUG => tracing::debug!("{}", message),
            Level::TRACE => tracing::trace!("{}", message),
        }
    }
}

impl<F> Logger for F
where
    F: Fn(Level, &str) + Send + Sync,
{
    fn log(&self, level: Level, message: &str) {
        self(level, message)
    }
}

/// Shared handle to a logger, cloneable into configs
#[derive(Clone)]
pub struct LogSink(Arc<dyn Logger>);

impl LogSink {
    pub fn new(logger: impl Logger + 'static) -> Self {
        Self(Arc::new(logger))
    }

    pub fn log(&self, level: Level, message: &str) {
        self.0.log(level, message);
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(TracingLogger)
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink")
    }
}
