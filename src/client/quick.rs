//! One-shot helpers
//!
//! Each function opens a fresh client, runs one command, and drops the
//! connection. Convenient for scripts; anything issuing more than a handful
//! of commands should keep a [`Client`] around instead.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::protocol::{Stats, Val};

use super::Client;

fn client(config: &ClientConfig) -> Result<Client> {
    Client::new(config.clone())
}

// Scalar namespace

pub fn get(config: &ClientConfig, key: &str) -> Result<String> {
    client(config)?.get(key)
}

pub fn set(config: &ClientConfig, key: &str, val: &str, ttl: f64) -> Result<()> {
    client(config)?.set(key, val, ttl)
}

pub fn remove(config: &ClientConfig, key: &str) -> Result<()> {
    client(config)?.remove(key)
}

pub fn exists(config: &ClientConfig, key: &str) -> Result<bool> {
    client(config)?.exists(key)
}

pub fn get_rem(config: &ClientConfig, key: &str) -> Result<String> {
    client(config)?.get_rem(key)
}

pub fn expire(config: &ClientConfig, key: &str, ttl: f64) -> Result<()> {
    client(config)?.expire(key, ttl)
}

pub fn get_all_keys(config: &ClientConfig) -> Result<Vec<String>> {
    client(config)?.get_all_keys()
}

// List namespace

pub fn list_exists(config: &ClientConfig, key: &str) -> Result<bool> {
    client(config)?.list_exists(key)
}

pub fn list_remove(config: &ClientConfig, key: &str) -> Result<()> {
    client(config)?.list_remove(key)
}

pub fn list_add_first(config: &ClientConfig, key: &str, val: impl Into<Val>) -> Result<i64> {
    client(config)?.list_add_first(key, val, 0.0)
}

pub fn list_add_last(config: &ClientConfig, key: &str, val: impl Into<Val>) -> Result<i64> {
    client(config)?.list_add_last(key, val, 0.0)
}

pub fn list_get_first(config: &ClientConfig, key: &str) -> Result<Option<String>> {
    client(config)?.list_get_first(key)
}

pub fn list_get_last(config: &ClientConfig, key: &str) -> Result<Option<String>> {
    client(config)?.list_get_last(key)
}

pub fn list_get_rem_first(config: &ClientConfig, key: &str) -> Result<Option<String>> {
    client(config)?.list_get_rem_first(key)
}

pub fn list_get_rem_last(config: &ClientConfig, key: &str) -> Result<Option<String>> {
    client(config)?.list_get_rem_last(key)
}

pub fn list_expire(config: &ClientConfig, key: &str, ttl: f64) -> Result<()> {
    client(config)?.list_expire(key, ttl)
}

pub fn list_set(config: &ClientConfig, key: &str, values: Vec<String>) -> Result<()> {
    client(config)?.list_set(key, values, 0.0)
}

pub fn list_get(config: &ClientConfig, key: &str) -> Result<Vec<String>> {
    client(config)?.list_get(key)
}

// Server

pub fn ping(config: &ClientConfig) -> Result<String> {
    client(config)?.ping()
}

pub fn stats(config: &ClientConfig) -> Result<Stats> {
    client(config)?.stats()
}
