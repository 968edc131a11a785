//! Command definitions
//!
//! Represents commands from clients.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Every command name the server understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    // Scalar namespace
    Exists,
    Expire,
    Get,
    GetAllKeys,
    GetRem,
    Remove,
    Set,

    // List namespace
    ListExists,
    ListExpire,
    ListAddFirst,
    ListAddLast,
    ListGet,
    ListGetFirst,
    ListGetRemFirst,
    ListGetLast,
    ListGetRemLast,
    ListGetAllKeys,
    ListGetRem,
    ListRemove,
    ListSet,

    // Server
    Ping,
    Stats,
}

impl CommandKind {
    pub const ALL: [CommandKind; 22] = [
        CommandKind::Exists,
        CommandKind::Expire,
        CommandKind::Get,
        CommandKind::GetAllKeys,
        CommandKind::GetRem,
        CommandKind::Remove,
        CommandKind::Set,
        CommandKind::ListExists,
        CommandKind::ListExpire,
        CommandKind::ListAddFirst,
        CommandKind::ListAddLast,
        CommandKind::ListGet,
        CommandKind::ListGetFirst,
        CommandKind::ListGetRemFirst,
        CommandKind::ListGetLast,
        CommandKind::ListGetRemLast,
        CommandKind::ListGetAllKeys,
        CommandKind::ListGetRem,
        CommandKind::ListRemove,
        CommandKind::ListSet,
        CommandKind::Ping,
        CommandKind::Stats,
    ];

    /// Wire name of the command
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::Exists => "exists",
            CommandKind::Expire => "expire",
            CommandKind::Get => "get",
            CommandKind::GetAllKeys => "getAllKeys",
            CommandKind::GetRem => "getRem",
            CommandKind::Remove => "remove",
            CommandKind::Set => "set",
            CommandKind::ListExists => "listExists",
            CommandKind::ListExpire => "listExpire",
            CommandKind::ListAddFirst => "listAddFirst",
            CommandKind::ListAddLast => "listAddLast",
            CommandKind::ListGet => "listGet",
            CommandKind::ListGetFirst => "listGetFirst",
            CommandKind::ListGetRemFirst => "listGetRemFirst",
            CommandKind::ListGetLast => "listGetLast",
            CommandKind::ListGetRemLast => "listGetRemLast",
            CommandKind::ListGetAllKeys => "listGetAllKeys",
            CommandKind::ListGetRem => "listGetRem",
            CommandKind::ListRemove => "listRemove",
            CommandKind::ListSet => "listSet",
            CommandKind::Ping => "ping",
            CommandKind::Stats => "stats",
        }
    }
}

impl FromStr for CommandKind {
    type Err = CacheError;

    fn from_str(name: &str) -> Result<Self> {
        CommandKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| CacheError::UnknownCommand(name.to_string()))
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `val` field of a command: one string or a sequence of strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Val {
    Scalar(String),
    Sequence(Vec<String>),
}

impl Val {
    /// Flatten into list items, a scalar becoming a single item
    pub fn into_items(self) -> Vec<String> {
        match self {
            Val::Scalar(value) => vec![value],
            Val::Sequence(values) => values,
        }
    }
}

impl From<&str> for Val {
    fn from(value: &str) -> Self {
        Val::Scalar(value.to_string())
    }
}

impl From<String> for Val {
    fn from(value: String) -> Self {
        Val::Scalar(value)
    }
}

impl From<Vec<String>> for Val {
    fn from(values: Vec<String>) -> Self {
        Val::Sequence(values)
    }
}

impl From<Vec<&str>> for Val {
    fn from(values: Vec<&str>) -> Self {
        Val::Sequence(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Val {
    fn from(values: [&str; N]) -> Self {
        Val::Sequence(values.iter().map(|v| v.to_string()).collect())
    }
}

/// A command as carried on the wire
///
/// `command` stays a raw string here so that an unrecognised name decodes
/// fine and is rejected later as an unknown command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMessage {
    /// Hex SHA-256 of the client's key
    pub auth_key: String,

    /// Command name
    pub command: String,

    pub key: Option<String>,

    pub val: Option<Val>,

    /// Lifetime in seconds, 0 means no expiry
    pub ttl: Option<f64>,
}

impl CommandMessage {
    /// Build a command with no key, value, or ttl
    pub fn new(auth_key: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            auth_key: auth_key.into(),
            command: kind.as_str().to_string(),
            key: None,
            val: None,
            ttl: Some(0.0),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_val(mut self, val: impl Into<Val>) -> Self {
        self.val = Some(val.into());
        self
    }

    pub fn with_ttl(mut self, ttl: f64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Resolve the command name
    pub fn kind(&self) -> Result<CommandKind> {
        self.command.parse()
    }

    // =========================================================================
    // Validation helpers
    // =========================================================================

    /// The key, which must be present and non-empty
    pub fn require_key(&self) -> Result<&str> {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(CacheError::MissingParameter("key")),
        }
    }

    /// The ttl, which must be present and finite
    pub fn require_ttl(&self) -> Result<f64> {
        match self.ttl {
            Some(ttl) if ttl.is_finite() => Ok(ttl),
            _ => Err(CacheError::MissingParameter("ttl")),
        }
    }

    /// The value, which must be present
    pub fn require_val(&self) -> Result<&Val> {
        self.val.as_ref().ok_or(CacheError::MissingParameter("val"))
    }
}
