//! Expiry Module
//!
//! Tracks per-key deadlines for one namespace.
//!
//! ## Responsibilities
//! - Map each expiring key to its absolute deadline
//! - Cache the earliest deadline so an idle sweep is O(1)
//! - Drain every due key in a single pass
//!
//! ## Invariant
//! The cached `next_expire_at` is never later than any deadline in the
//! index, and is `None` exactly when the index is empty.

mod index;

pub use index::ExpiryIndex;
