//! Tests for ExpiryIndex
//!
//! These tests verify:
//! - The cached minimum tracks inserts, overwrites, and removals
//! - Draining removes exactly the due keys
//! - The cached minimum is rebuilt from the survivors

use std::time::{Duration, Instant};

use cachette::expiry::ExpiryIndex;

// =============================================================================
// Helper Functions
// =============================================================================

fn secs(base: Instant, n: u64) -> Instant {
    base + Duration::from_secs(n)
}

/// The invariant every operation must preserve
fn assert_consistent(index: &ExpiryIndex, keys: &[&str]) {
    let min = keys.iter().filter_map(|k| index.get(k)).min();
    assert_eq!(index.next_expire_at(), min);
    assert_eq!(index.is_empty(), index.next_expire_at().is_none());
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_empty_index_has_no_next() {
    let index = ExpiryIndex::new();

    assert!(index.is_empty());
    assert_eq!(index.next_expire_at(), None);
    assert!(!index.is_due(Instant::now()));
}

#[test]
fn test_set_tracks_minimum() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();

    index.set("a", secs(base, 10));
    assert_eq!(index.next_expire_at(), Some(secs(base, 10)));

    index.set("b", secs(base, 5));
    assert_eq!(index.next_expire_at(), Some(secs(base, 5)));

    index.set("c", secs(base, 20));
    assert_eq!(index.next_expire_at(), Some(secs(base, 5)));
    assert_consistent(&index, &["a", "b", "c"]);
}

#[test]
fn test_overwriting_minimum_recomputes() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();

    index.set("a", secs(base, 5));
    index.set("b", secs(base, 10));

    // Push the current minimum later
    index.set("a", secs(base, 30));

    assert_eq!(index.next_expire_at(), Some(secs(base, 10)));
    assert_consistent(&index, &["a", "b"]);
}

#[test]
fn test_overwriting_other_key_earlier_lowers_minimum() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();

    index.set("a", secs(base, 5));
    index.set("b", secs(base, 10));
    index.set("b", secs(base, 2));

    assert_eq!(index.next_expire_at(), Some(secs(base, 2)));
    assert_consistent(&index, &["a", "b"]);
}

#[test]
fn test_remove_minimum_recomputes() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();

    index.set("a", secs(base, 5));
    index.set("b", secs(base, 10));

    assert_eq!(index.remove("a"), Some(secs(base, 5)));
    assert_eq!(index.next_expire_at(), Some(secs(base, 10)));

    assert_eq!(index.remove("b"), Some(secs(base, 10)));
    assert_eq!(index.next_expire_at(), None);
    assert!(index.is_empty());
}

#[test]
fn test_remove_missing_key() {
    let mut index = ExpiryIndex::new();
    assert_eq!(index.remove("ghost"), None);
    assert_eq!(index.next_expire_at(), None);
}

#[test]
fn test_duplicate_deadlines_survive_removal() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();

    index.set("a", secs(base, 5));
    index.set("b", secs(base, 5));
    index.remove("a");

    assert_eq!(index.next_expire_at(), Some(secs(base, 5)));
}

// =============================================================================
// Drain Tests
// =============================================================================

#[test]
fn test_drain_before_next_is_noop() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();
    index.set("a", secs(base, 5));

    assert!(index.drain_expired(secs(base, 4)).is_empty());
    assert_eq!(index.len(), 1);
}

#[test]
fn test_drain_removes_due_keys_only() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();
    index.set("a", secs(base, 1));
    index.set("b", secs(base, 2));
    index.set("c", secs(base, 3));
    index.set("d", secs(base, 9));

    let mut expired = index.drain_expired(secs(base, 2));
    expired.sort();

    assert_eq!(expired, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(index.len(), 2);
    assert_eq!(index.next_expire_at(), Some(secs(base, 3)));
    assert_consistent(&index, &["a", "b", "c", "d"]);
}

#[test]
fn test_drain_deadline_equal_to_now_expires() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();
    index.set("a", secs(base, 3));

    assert_eq!(index.drain_expired(secs(base, 3)), vec!["a".to_string()]);
    assert!(index.is_empty());
    assert_eq!(index.next_expire_at(), None);
}

#[test]
fn test_drain_everything() {
    let base = Instant::now();
    let mut index = ExpiryIndex::new();
    for (i, key) in ["a", "b", "c"].iter().enumerate() {
        index.set(key, secs(base, i as u64 + 1));
    }

    assert_eq!(index.drain_expired(secs(base, 100)).len(), 3);
    assert!(index.is_empty());
    assert_eq!(index.next_expire_at(), None);
}
