//! Cachette Server Binary
//!
//! Starts the TCP cache server.

use cachette::{Server, ServerConfig};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Cachette Server
#[derive(Parser, Debug)]
#[command(name = "cachette-server")]
#[command(about = "In-memory cache server with TTL and list support")]
#[command(version)]
struct Args {
    /// Accepted authentication key (repeat for several)
    #[arg(short = 'k', long = "auth-key", required = true)]
    auth_keys: Vec<String>,

    /// Host to listen on
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "9999")]
    port: u16,

    /// Sleep between loop iterations, in microseconds
    #[arg(long, default_value = "1000")]
    poll_interval_micros: u64,

    /// Log client connects and disconnects
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cachette=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("Cachette Server v{}", cachette::VERSION);
    tracing::info!("Listen address: {}:{}", args.host, args.port);
    tracing::info!("Auth keys configured: {}", args.auth_keys.len());

    // Build config from args
    let config = match ServerConfig::builder()
        .auth_keys(args.auth_keys)
        .host(args.host)
        .port(args.port)
        .poll_interval_micros(args.poll_interval_micros)
        .verbose(args.verbose)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C flips the loop's shutdown flag; the loop closes everything
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.trigger();
    }) {
        tracing::warn!("Could not install Ctrl+C handler: {}", e);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
