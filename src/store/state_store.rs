//! Canonical slot state.
//!
//! The store owns the mapping of slot index to value. Every read and write
//! goes through it; nothing else holds an authoritative copy.

use super::types::{SlotIndex, StateSnapshot};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Thread-safe store of slot values with a fixed index space.
///
/// Writes are last-writer-wins per slot. No history is kept.
#[derive(Debug)]
pub struct StateStore {
    slot_count: SlotIndex,
    values: RwLock<BTreeMap<SlotIndex, String>>,
}

impl StateStore {
    /// Creates an empty store with slots `1..=slot_count`.
    pub fn new(slot_count: SlotIndex) -> Self {
        Self {
            slot_count,
            values: RwLock::new(BTreeMap::new()),
        }
    }

    /// Number of slots, fixed at startup.
    pub fn slot_count(&self) -> SlotIndex {
        self.slot_count
    }

    /// Whether `index` names a slot of this store.
    pub fn contains(&self, index: SlotIndex) -> bool {
        (1..=self.slot_count).contains(&index)
    }

    /// Returns a consistent copy of all written slots.
    pub fn snapshot(&self) -> StateSnapshot {
        // A poisoned lock still holds a complete map: every write is a single insert.
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        StateSnapshot::from(values.clone())
    }

    /// Overwrites one slot's value.
    ///
    /// The value is not checked against any label set. Returns `false`
    /// without writing if `index` is outside the slot range.
    pub fn set(&self, index: SlotIndex, value: impl Into<String>) -> bool {
        if !self.contains(index) {
            tracing::debug!(index, slots = self.slot_count, "Ignoring write to unknown slot");
            return false;
        }

        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(index, value.into());
        true
    }
}
