//! Expiry index implementation
//!
//! HashMap of deadlines with a cached minimum.

use std::collections::HashMap;
use std::time::Instant;

/// Per-namespace map of key deadlines
///
/// `next_expire_at` is only recomputed when the entry holding the current
/// minimum changes or goes away; every other update is O(1).
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    deadlines: HashMap<String, Instant>,
    next_expire_at: Option<Instant>,
}

impl ExpiryIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace the deadline of a key
    pub fn set(&mut self, key: &str, deadline: Instant) {
        match self.deadlines.insert(key.to_string(), deadline) {
            Some(previous) if Some(previous) == self.next_expire_at => {
                self.recompute();
            }
            _ => {
                self.next_expire_at = Some(match self.next_expire_at {
                    Some(next) => next.min(deadline),
                    None => deadline,
                });
            }
        }
    }

    /// Drop the deadline of a key, returning it if there was one
    pub fn remove(&mut self, key: &str) -> Option<Instant> {
        let removed = self.deadlines.remove(key)?;
        if Some(removed) == self.next_expire_at {
            self.recompute();
        }
        Some(removed)
    }

    /// Deadline of a key
    pub fn get(&self, key: &str) -> Option<Instant> {
        self.deadlines.get(key).copied()
    }

    /// Earliest deadline in the index
    pub fn next_expire_at(&self) -> Option<Instant> {
        self.next_expire_at
    }

    /// Whether at least one deadline has passed
    pub fn is_due(&self, now: Instant) -> bool {
        matches!(self.next_expire_at, Some(next) if next <= now)
    }

    /// Remove and return every key whose deadline is at or before `now`
    ///
    /// One pass over the index; the cached minimum is rebuilt from the
    /// survivors during the same pass.
    pub fn drain_expired(&mut self, now: Instant) -> Vec<String> {
        if !self.is_due(now) {
            return Vec::new();
        }

        let mut expired = Vec::new();
        let mut next: Option<Instant> = None;
        self.deadlines.retain(|key, deadline| {
            if *deadline <= now {
                expired.push(key.clone());
                false
            } else {
                next = Some(next.map_or(*deadline, |n| n.min(*deadline)));
                true
            }
        });
        self.next_expire_at = next;

        expired
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    fn recompute(&mut self) {
        self.next_expire_at = self.deadlines.values().min().copied();
    }
}
