//! Engine Module
//!
//! The storage engine that owns every cached entry.
//!
//! ## Responsibilities
//! - Hold the scalar and list namespaces, each with its own expiry index
//! - Execute decoded commands and turn every outcome into a response
//! - Sweep expired keys, at most once per second
//!
//! ## Concurrency Model
//! None. The engine is owned by the server loop and only ever touched from
//! that thread, so each command runs to completion before the next starts.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::error::{CacheError, Result};
use crate::expiry::ExpiryIndex;
use crate::protocol::{CommandKind, CommandMessage, ResponseMessage, Stats, Val, Value};

/// Minimum spacing between two expiry sweeps
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

const ACK: &str = "ACK";
const EXPIRATION_UPDATED: &str = "Expiration updated";
const PONG: &str = "pong";

/// Entries of one namespace plus their deadlines
#[derive(Debug)]
struct Namespace<V> {
    entries: HashMap<String, V>,
    expiries: ExpiryIndex,
}

impl<V> Default for Namespace<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            expiries: ExpiryIndex::new(),
        }
    }
}

impl<V> Namespace<V> {
    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Insert or overwrite, replacing any previous deadline
    fn insert(&mut self, key: &str, value: V, deadline: Option<Instant>) {
        self.entries.insert(key.to_string(), value);
        self.set_deadline(key, deadline);
    }

    fn remove(&mut self, key: &str) -> Option<V> {
        self.expiries.remove(key);
        self.entries.remove(key)
    }

    fn set_deadline(&mut self, key: &str, deadline: Option<Instant>) {
        match deadline {
            Some(at) => self.expiries.set(key, at),
            None => {
                self.expiries.remove(key);
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn sweep(&mut self, now: Instant) -> usize {
        let expired = self.expiries.drain_expired(now);
        for key in &expired {
            self.entries.remove(key);
        }
        expired.len()
    }
}

/// The in-memory storage engine
#[derive(Debug, Default)]
pub struct Engine {
    /// Scalar namespace: key -> string
    scalars: Namespace<String>,

    /// List namespace: key -> non-empty ordered list
    lists: Namespace<VecDeque<String>>,

    /// When the last sweep ran
    last_sweep: Option<Instant>,
}

impl Engine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a command against the current time
    pub fn apply(&mut self, command: &CommandMessage) -> ResponseMessage {
        self.apply_at(command, Instant::now())
    }

    /// Execute a command as if the current time were `now`
    ///
    /// Never fails: errors come back as `{"error": ...}` responses.
    pub fn apply_at(&mut self, command: &CommandMessage, now: Instant) -> ResponseMessage {
        match self.execute(command, now) {
            Ok(value) => ResponseMessage::Results(value),
            Err(e) => ResponseMessage::error(e),
        }
    }

    /// Routes commands to appropriate handlers
    pub fn execute(&mut self, command: &CommandMessage, now: Instant) -> Result<Value> {
        match command.kind()? {
            // Scalar namespace
            CommandKind::Exists => Ok(Value::Bool(self.scalars.contains(command.require_key()?))),
            CommandKind::Expire => self.expire(command, now),
            CommandKind::Get => {
                let key = command.require_key()?;
                Ok(Value::Str(self.scalars.get(key).cloned().unwrap_or_default()))
            }
            CommandKind::GetAllKeys => Ok(Value::Seq(self.scalars.keys())),
            CommandKind::GetRem => {
                let key = command.require_key()?;
                Ok(Value::Str(self.scalars.remove(key).unwrap_or_default()))
            }
            CommandKind::Remove => {
                self.scalars.remove(command.require_key()?);
                Ok(Value::from(ACK))
            }
            CommandKind::Set => self.set(command, now),

            // List namespace
            CommandKind::ListExists => Ok(Value::Bool(self.lists.contains(command.require_key()?))),
            CommandKind::ListExpire => self.list_expire(command, now),
            CommandKind::ListAddFirst => self.list_add(command, now, End::Front),
            CommandKind::ListAddLast => self.list_add(command, now, End::Back),
            CommandKind::ListGet => {
                let key = command.require_key()?;
                Ok(match self.lists.get(key) {
                    Some(list) => Value::Seq(list.iter().cloned().collect()),
                    None => Value::Str(String::new()),
                })
            }
            CommandKind::ListGetFirst => {
                let key = command.require_key()?;
                Ok(self.lists.get(key).and_then(|list| list.front()).cloned().into())
            }
            CommandKind::ListGetLast => {
                let key = command.require_key()?;
                Ok(self.lists.get(key).and_then(|list| list.back()).cloned().into())
            }
            CommandKind::ListGetRemFirst => Ok(self.list_pop(command.require_key()?, End::Front).into()),
            CommandKind::ListGetRemLast => Ok(self.list_pop(command.require_key()?, End::Back).into()),
            CommandKind::ListGetAllKeys => Ok(Value::Seq(self.lists.keys())),
            CommandKind::ListGetRem => {
                let key = command.require_key()?;
                Ok(match self.lists.remove(key) {
                    Some(list) => Value::Seq(list.into_iter().collect()),
                    None => Value::Str(String::new()),
                })
            }
            CommandKind::ListRemove => {
                self.lists.remove(command.require_key()?);
                Ok(Value::from(ACK))
            }
            CommandKind::ListSet => self.list_set(command, now),

            // Server
            CommandKind::Ping => Ok(Value::from(PONG)),
            CommandKind::Stats => Ok(Value::Stats(self.stats())),
        }
    }

    // =========================================================================
    // Scalar commands
    // =========================================================================

    fn set(&mut self, command: &CommandMessage, now: Instant) -> Result<Value> {
        let key = command.require_key()?;
        let val = command.require_val()?;
        let deadline = deadline_after(now, command.require_ttl()?)?;

        let value = match val {
            Val::Scalar(value) => value.clone(),
            Val::Sequence(_) => {
                return Err(CacheError::InvalidParameter(
                    "val must be a string for set".to_string(),
                ))
            }
        };

        self.scalars.insert(key, value, deadline);
        Ok(Value::from(ACK))
    }

    fn expire(&mut self, command: &CommandMessage, now: Instant) -> Result<Value> {
        let key = command.require_key()?;
        let deadline = deadline_after(now, command.require_ttl()?)?;

        if !self.scalars.contains(key) {
            return Err(CacheError::KeyNotFound);
        }

        self.scalars.set_deadline(key, deadline);
        Ok(Value::from(EXPIRATION_UPDATED))
    }

    // =========================================================================
    // List commands
    // =========================================================================

    fn list_expire(&mut self, command: &CommandMessage, now: Instant) -> Result<Value> {
        let key = command.require_key()?;
        let deadline = deadline_after(now, command.require_ttl()?)?;

        if !self.lists.contains(key) {
            return Err(CacheError::KeyNotFound);
        }

        self.lists.set_deadline(key, deadline);
        Ok(Value::from(EXPIRATION_UPDATED))
    }

    /// Push one or more values, keeping their given relative order
    fn list_add(&mut self, command: &CommandMessage, now: Instant, end: End) -> Result<Value> {
        let key = command.require_key()?;
        let items = command.require_val()?.clone().into_items();
        let deadline = deadline_after(now, command.require_ttl()?)?;

        let mut list = self.lists.entries.remove(key).unwrap_or_default();
        match end {
            End::Front => {
                for item in items.into_iter().rev() {
                    list.push_front(item);
                }
            }
            End::Back => list.extend(items),
        }

        let len = list.len();
        if list.is_empty() {
            self.lists.remove(key);
        } else {
            self.lists.insert(key, list, deadline);
        }
        Ok(Value::Int(len as i64))
    }

    fn list_set(&mut self, command: &CommandMessage, now: Instant) -> Result<Value> {
        let key = command.require_key()?;
        let val = command.require_val()?;
        let deadline = deadline_after(now, command.require_ttl()?)?;

        let items = match val {
            Val::Sequence(items) => items,
            Val::Scalar(_) => return Err(CacheError::ValueNotSequence),
        };

        if items.is_empty() {
            self.lists.remove(key);
        } else {
            self.lists.insert(key, items.iter().cloned().collect(), deadline);
        }
        Ok(Value::from(ACK))
    }

    /// Pop from one end; a drained list disappears along with its deadline
    fn list_pop(&mut self, key: &str, end: End) -> Option<String> {
        let list = self.lists.entries.get_mut(key)?;
        let item = match end {
            End::Front => list.pop_front(),
            End::Back => list.pop_back(),
        };
        if list.is_empty() {
            self.lists.remove(key);
        }
        item
    }

    // =========================================================================
    // Expiry
    // =========================================================================

    /// Sweep expired keys, at most once per [`SWEEP_INTERVAL`]
    pub fn check_expiries(&mut self) -> usize {
        self.check_expiries_at(Instant::now())
    }

    /// Sweep as if the current time were `now`; returns the number of
    /// evicted keys across both namespaces
    pub fn check_expiries_at(&mut self, now: Instant) -> usize {
        if let Some(last) = self.last_sweep {
            if now.saturating_duration_since(last) < SWEEP_INTERVAL {
                return 0;
            }
        }
        self.last_sweep = Some(now);

        self.scalars.sweep(now) + self.lists.sweep(now)
    }

    /// Deadline of a scalar key, if it has one
    pub fn expires_at(&self, key: &str) -> Option<Instant> {
        self.scalars.expiries.get(key)
    }

    /// Deadline of a list key, if it has one
    pub fn list_expires_at(&self, key: &str) -> Option<Instant> {
        self.lists.expiries.get(key)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Number of scalar keys
    pub fn key_count(&self) -> usize {
        self.scalars.entries.len()
    }

    /// Number of list keys
    pub fn list_count(&self) -> usize {
        self.lists.entries.len()
    }

    /// Counters reported by `stats`
    pub fn stats(&self) -> Stats {
        let scalar_bytes: usize = self
            .scalars
            .entries
            .iter()
            .map(|(key, value)| key.len() + value.len())
            .sum();
        let list_bytes: usize = self
            .lists
            .entries
            .iter()
            .map(|(key, list)| key.len() + list.iter().map(String::len).sum::<usize>())
            .sum();

        Stats {
            keys: self.key_count(),
            lists: self.list_count(),
            approximate_memory_used: scalar_bytes + list_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum End {
    Front,
    Back,
}

/// Absolute deadline for a ttl in seconds; zero or negative means none
fn deadline_after(now: Instant, ttl: f64) -> Result<Option<Instant>> {
    if ttl <= 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(ttl)
        .ok()
        .and_then(|lifetime| now.checked_add(lifetime))
        .map(Some)
        .ok_or_else(|| CacheError::InvalidParameter(format!("ttl {} is out of range", ttl)))
}
