//! Response definitions
//!
//! Represents responses to clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Counters reported by the `stats` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Keys in the scalar namespace
    pub keys: usize,

    /// Keys in the list namespace
    pub lists: usize,

    /// Summed byte length of all keys and values
    pub approximate_memory_used: usize,
}

/// The `results` payload of a successful response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Seq(Vec<String>),
    Stats(Stats),
}

impl Value {
    /// Short shape name, used in mismatch errors
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Stats(_) => "stats",
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map(Value::Str).unwrap_or(Value::Null)
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Value::Seq(values)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str(self.kind_name()),
        }
    }
}

/// A response to send to client: `{"error": ...}` or `{"results": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMessage {
    Error(String),
    Results(Value),
}

impl ResponseMessage {
    /// Create a successful response
    pub fn results(value: impl Into<Value>) -> Self {
        ResponseMessage::Results(value.into())
    }

    /// Create an error response
    pub fn error(message: impl fmt::Display) -> Self {
        ResponseMessage::Error(message.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResponseMessage::Error(_))
    }
}
