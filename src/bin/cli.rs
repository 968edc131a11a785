//! Cachette CLI Client
//!
//! Command-line interface for interacting with a Cachette server.

use cachette::auth::hash_auth_key;
use cachette::protocol::{CommandKind, CommandMessage};
use cachette::{Client, ClientConfig};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

/// Cachette CLI
#[derive(Parser, Debug)]
#[command(name = "cachette-cli")]
#[command(about = "CLI for the Cachette cache server")]
struct Args {
    /// Server host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "9999")]
    port: u16,

    /// Authentication key
    #[arg(short = 'k', long)]
    auth_key: String,

    /// Seconds to wait for a response
    #[arg(long, default_value = "5")]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check whether a key exists
    Exists { key: String },

    /// Reset the lifetime of a key
    Expire { key: String, ttl: f64 },

    /// Get a value by key
    Get { key: String },

    /// List all scalar keys
    GetAllKeys,

    /// Get a value and delete it
    GetRem { key: String },

    /// Delete a key
    Remove { key: String },

    /// Set a key-value pair
    Set {
        key: String,
        value: String,
        /// Lifetime in seconds, 0 for none
        #[arg(default_value = "0")]
        ttl: f64,
    },

    /// Check whether a list exists
    ListExists { key: String },

    /// Reset the lifetime of a list
    ListExpire { key: String, ttl: f64 },

    /// Prepend values to a list
    ListAddFirst {
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Append values to a list
    ListAddLast {
        key: String,
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Get a whole list
    ListGet { key: String },

    /// Peek at the head of a list
    ListGetFirst { key: String },

    /// Pop the head of a list
    ListGetRemFirst { key: String },

    /// Peek at the tail of a list
    ListGetLast { key: String },

    /// Pop the tail of a list
    ListGetRemLast { key: String },

    /// List all list keys
    ListGetAllKeys,

    /// Get a whole list and delete it
    ListGetRem { key: String },

    /// Delete a list
    ListRemove { key: String },

    /// Replace a whole list
    ListSet { key: String, values: Vec<String> },

    /// Ping the server
    Ping,

    /// Show server counters
    Stats,
}

impl Commands {
    fn into_message(self, auth_key: &str) -> CommandMessage {
        let base = |kind| CommandMessage::new(auth_key, kind);
        match self {
            Commands::Exists { key } => base(CommandKind::Exists).with_key(key),
            Commands::Expire { key, ttl } => base(CommandKind::Expire).with_key(key).with_ttl(ttl),
            Commands::Get { key } => base(CommandKind::Get).with_key(key),
            Commands::GetAllKeys => base(CommandKind::GetAllKeys),
            Commands::GetRem { key } => base(CommandKind::GetRem).with_key(key),
            Commands::Remove { key } => base(CommandKind::Remove).with_key(key),
            Commands::Set { key, value, ttl } => base(CommandKind::Set)
                .with_key(key)
                .with_val(value)
                .with_ttl(ttl),
            Commands::ListExists { key } => base(CommandKind::ListExists).with_key(key),
            Commands::ListExpire { key, ttl } => {
                base(CommandKind::ListExpire).with_key(key).with_ttl(ttl)
            }
            Commands::ListAddFirst { key, values } => {
                base(CommandKind::ListAddFirst).with_key(key).with_val(values)
            }
            Commands::ListAddLast { key, values } => {
                base(CommandKind::ListAddLast).with_key(key).with_val(values)
            }
            Commands::ListGet { key } => base(CommandKind::ListGet).with_key(key),
            Commands::ListGetFirst { key } => base(CommandKind::ListGetFirst).with_key(key),
            Commands::ListGetRemFirst { key } => base(CommandKind::ListGetRemFirst).with_key(key),
            Commands::ListGetLast { key } => base(CommandKind::ListGetLast).with_key(key),
            Commands::ListGetRemLast { key } => base(CommandKind::ListGetRemLast).with_key(key),
            Commands::ListGetAllKeys => base(CommandKind::ListGetAllKeys),
            Commands::ListGetRem { key } => base(CommandKind::ListGetRem).with_key(key),
            Commands::ListRemove { key } => base(CommandKind::ListRemove).with_key(key),
            Commands::ListSet { key, values } => {
                base(CommandKind::ListSet).with_key(key).with_val(values)
            }
            Commands::Ping => base(CommandKind::Ping),
            Commands::Stats => base(CommandKind::Stats),
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();

    let config = match ClientConfig::builder()
        .auth_key(args.auth_key.clone())
        .host(args.host)
        .port(args.port)
        .max_reading_delay(std::time::Duration::from_secs(args.timeout))
        .max_reconnect_attempts(1)
        .build()
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let message = args.command.into_message(&hash_auth_key(&args.auth_key));

    let result = Client::new(config).and_then(|mut client| client.call(&message));
    match result {
        Ok(value) => println!("{}", value),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
