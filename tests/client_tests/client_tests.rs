//! Client Tests
//!
//! Typed calls against a live server, plus the failure paths:
//! - Server-side errors surface as `Remote`
//! - Silent servers hit the read deadline
//! - Unreachable servers exhaust the reconnect budget
//! - A failed write reconnects once and retries once
//! - Bad configurations are refused up front

use std::net::{SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use cachette::client::quick;
use cachette::config::{ClientConfig, ServerConfig};
use cachette::protocol::{read_command, write_response, ResponseMessage};
use cachette::{CacheError, Client, Server, ShutdownHandle};
use tracing::Level;

const KEY: &str = "client-test-key";

// =============================================================================
// Helper Functions
// =============================================================================

struct RunningServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    handle: Option<JoinHandle<cachette::Result<()>>>,
}

impl RunningServer {
    fn start() -> Self {
        let config = ServerConfig::builder()
            .auth_key(KEY)
            .host("127.0.0.1")
            .port(0)
            .poll_interval_micros(200)
            .logger(|_level: Level, _message: &str| {})
            .build()
            .unwrap();
        let server = Server::bind(config).unwrap();
        let addr = server.local_addr();
        let shutdown = server.shutdown_handle();

        Self {
            addr,
            shutdown,
            handle: Some(thread::spawn(move || server.run())),
        }
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn config_for(port: u16) -> ClientConfig {
    ClientConfig::builder()
        .auth_key(KEY)
        .host("127.0.0.1")
        .port(port)
        .max_reading_delay(Duration::from_secs(5))
        .connect_timeout(Duration::from_secs(1))
        .reconnect_backoff(Duration::from_millis(10))
        .logger(|_level: Level, _message: &str| {})
        .build()
        .unwrap()
}

fn client_for(server: &RunningServer) -> Client {
    Client::new(config_for(server.addr.port())).unwrap()
}

/// A value too large for the socket buffers, so sending it needs a live peer
fn large_value() -> String {
    "x".repeat(15 * 1024 * 1024)
}

/// A port nothing is listening on
fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

// =============================================================================
// Scalar Command Tests
// =============================================================================

#[test]
fn test_ping() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    assert_eq!(client.ping().unwrap(), "pong");
    assert!(client.is_connected());
}

#[test]
fn test_set_get_remove() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    client.set("user:1", "alice", 0.0).unwrap();
    assert!(client.exists("user:1").unwrap());
    assert_eq!(client.get("user:1").unwrap(), "alice");

    client.remove("user:1").unwrap();
    assert!(!client.exists("user:1").unwrap());
    assert_eq!(client.get("user:1").unwrap(), "");
}

#[test]
fn test_get_rem_consumes() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    client.set("token", "t-1", 0.0).unwrap();
    assert_eq!(client.get_rem("token").unwrap(), "t-1");
    assert_eq!(client.get_rem("token").unwrap(), "");
}

#[test]
fn test_get_all_keys() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    client.set("a", "1", 0.0).unwrap();
    client.set("b", "2", 0.0).unwrap();
    client.list_set("not-a-scalar", ["x"], 0.0).unwrap();

    let mut keys = client.get_all_keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn test_expire_missing_key_is_remote_error() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    match client.expire("ghost", 10.0) {
        Err(CacheError::Remote(message)) => assert_eq!(message, "Key does not exist"),
        other => panic!("Expected Remote error, got {:?}", other),
    }

    // The connection survives a command error
    assert_eq!(client.ping().unwrap(), "pong");
}

#[test]
fn test_wrong_auth_key_is_remote_error() {
    let server = RunningServer::start();
    let config = ClientConfig {
        auth_key: "not-the-key".to_string(),
        ..config_for(server.addr.port())
    };
    let mut client = Client::new(config).unwrap();

    match client.ping() {
        Err(CacheError::Remote(message)) => assert_eq!(message, "Authentication failed"),
        other => panic!("Expected Remote error, got {:?}", other),
    }
}

// =============================================================================
// List Command Tests
// =============================================================================

#[test]
fn test_list_round_trip() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    assert_eq!(client.list_add_last("q", "b", 0.0).unwrap(), 1);
    assert_eq!(client.list_add_first("q", vec!["a"], 0.0).unwrap(), 2);
    assert_eq!(client.list_add_last("q", ["c", "d"], 0.0).unwrap(), 4);

    assert_eq!(client.list_get("q").unwrap(), vec!["a", "b", "c", "d"]);
    assert_eq!(client.list_get_first("q").unwrap().as_deref(), Some("a"));
    assert_eq!(client.list_get_last("q").unwrap().as_deref(), Some("d"));

    assert_eq!(client.list_get_rem_first("q").unwrap().as_deref(), Some("a"));
    assert_eq!(client.list_get_rem_last("q").unwrap().as_deref(), Some("d"));
    assert_eq!(client.list_get_rem("q").unwrap(), vec!["b", "c"]);
    assert!(!client.list_exists("q").unwrap());
}

#[test]
fn test_missing_list_reads_empty() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    assert!(client.list_get("nothing").unwrap().is_empty());
    assert!(client.list_get_rem("nothing").unwrap().is_empty());
    assert_eq!(client.list_get_first("nothing").unwrap(), None);
    assert_eq!(client.list_get_rem_last("nothing").unwrap(), None);
}

#[test]
fn test_list_set_and_remove() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    client.list_set("l", vec!["x".to_string(), "y".to_string()], 0.0).unwrap();
    assert_eq!(client.list_get_all_keys().unwrap(), vec!["l".to_string()]);

    client.list_remove("l").unwrap();
    assert!(client.list_get_all_keys().unwrap().is_empty());
}

#[test]
fn test_list_expire_missing_list() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    assert!(matches!(
        client.list_expire("ghost", 1.0),
        Err(CacheError::Remote(_))
    ));
}

#[test]
fn test_stats() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    client.set("k", "vv", 0.0).unwrap();
    client.list_set("l", ["abc"], 0.0).unwrap();

    let stats = client.stats().unwrap();
    assert_eq!(stats.keys, 1);
    assert_eq!(stats.lists, 1);
    assert_eq!(stats.approximate_memory_used, 1 + 2 + 1 + 3);
}

// =============================================================================
// Connection Lifecycle Tests
// =============================================================================

#[test]
fn test_new_does_not_connect() {
    let client = Client::new(config_for(closed_port())).unwrap();
    assert!(!client.is_connected());
}

#[test]
fn test_reconnects_after_disconnect() {
    let server = RunningServer::start();
    let mut client = client_for(&server);

    client.set("k", "v", 0.0).unwrap();
    client.disconnect();
    assert!(!client.is_connected());

    assert_eq!(client.get("k").unwrap(), "v");
    assert!(client.is_connected());
}

#[test]
fn test_reconnect_exhausted() {
    let config = ClientConfig {
        max_reconnect_attempts: 2,
        ..config_for(closed_port())
    };
    let mut client = Client::new(config).unwrap();

    let started = Instant::now();
    match client.ping() {
        Err(CacheError::ReconnectExhausted(2)) => {}
        other => panic!("Expected ReconnectExhausted(2), got {:?}", other),
    }

    // One backoff step between the two attempts
    assert!(started.elapsed() >= Duration::from_millis(10));
    assert_eq!(client.reconnect_attempts(), 2);
    assert!(!client.is_connected());
}

#[test]
fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        // Accept and hold the socket without ever answering
        if let Ok((stream, _)) = listener.accept() {
            thread::sleep(Duration::from_secs(2));
            drop(stream);
        }
    });

    let delay = Duration::from_millis(200);
    let config = ClientConfig {
        max_reading_delay: delay,
        ..config_for(port)
    };
    let mut client = Client::new(config).unwrap();

    let started = Instant::now();
    match client.ping() {
        Err(CacheError::Timeout(d)) => assert_eq!(d, delay),
        other => panic!("Expected Timeout, got {:?}", other),
    }
    assert!(started.elapsed() >= delay);

    // A timed out stream is out of step, so it is dropped
    assert!(!client.is_connected());
}

#[test]
fn test_failed_write_reconnects_and_retries() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = thread::spawn(move || {
        // The first connection is dropped unread, so the client's write fails
        let (first, _) = listener.accept().unwrap();
        drop(first);

        let (mut second, _) = listener.accept().unwrap();
        let command = read_command(&mut second).unwrap();
        write_response(&mut second, &ResponseMessage::results("ACK")).unwrap();
        command
    });

    let mut client = Client::new(config_for(port)).unwrap();
    client.set("big", &large_value(), 0.0).unwrap();

    let received = peer.join().unwrap();
    assert_eq!(received.key.as_deref(), Some("big"));
    assert_eq!(client.reconnect_attempts(), 0);
}

#[test]
fn test_failed_write_without_server_exhausts_reconnects() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let peer = thread::spawn(move || {
        let (first, _) = listener.accept().unwrap();
        // Close the port before the client notices the dead connection
        drop(listener);
        drop(first);
    });

    let config = ClientConfig {
        max_reconnect_attempts: 2,
        ..config_for(port)
    };
    let mut client = Client::new(config).unwrap();

    match client.set("big", &large_value(), 0.0) {
        Err(CacheError::ReconnectExhausted(2)) => {}
        other => panic!("Expected ReconnectExhausted(2), got {:?}", other),
    }
    peer.join().unwrap();
    assert!(!client.is_connected());
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_missing_auth_key_rejected() {
    let result = ClientConfig::builder().port(1).build();
    assert!(matches!(result, Err(CacheError::Config(_))));

    let config = ClientConfig::default();
    assert!(matches!(Client::new(config), Err(CacheError::Config(_))));
}

#[test]
fn test_unsupported_protocol_rejected() {
    let result = ClientConfig::builder().auth_key(KEY).protocol("udp").build();
    assert!(matches!(result, Err(CacheError::Config(_))));
}

#[test]
fn test_zero_reconnect_attempts_rejected() {
    let result = ClientConfig::builder()
        .auth_key(KEY)
        .max_reconnect_attempts(0)
        .build();
    assert!(matches!(result, Err(CacheError::Config(_))));
}

#[test]
fn test_client_defaults() {
    let config = ClientConfig::default();

    assert_eq!(config.host, "localhost");
    assert_eq!(config.port, 9999);
    assert_eq!(config.max_reading_delay, Duration::from_secs(5));
    assert_eq!(config.max_reconnect_attempts, 3);
}

// =============================================================================
// One-shot Helper Tests
// =============================================================================

#[test]
fn test_quick_helpers() {
    let server = RunningServer::start();
    let config = config_for(server.addr.port());

    quick::set(&config, "q", "1", 0.0).unwrap();
    assert_eq!(quick::get(&config, "q").unwrap(), "1");
    assert!(quick::exists(&config, "q").unwrap());

    assert_eq!(quick::list_add_last(&config, "l", "x").unwrap(), 1);
    assert_eq!(quick::list_get(&config, "l").unwrap(), vec!["x".to_string()]);
    assert_eq!(quick::ping(&config).unwrap(), "pong");
}
