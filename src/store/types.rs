//! Data types for the shared slot state.
//!
//! Defines slot indices, the selectable labels, and the snapshot type
//! handed out to readers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a slot. Valid indices are `1..=slot_count`.
pub type SlotIndex = u32;

/// One selectable value for a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// The string carried on the wire and stored in the slot (e.g. "Option 2").
    pub value: String,

    /// What the page displays for this value (e.g. "YC"). May be empty.
    pub text: String,
}

impl Label {
    /// Creates a label from its wire value and display text.
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// A consistent copy of every written slot at one instant.
///
/// Serializes as a JSON object keyed by the slot index as a string,
/// e.g. `{"3":"Option 2"}`. Slots never written are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSnapshot(BTreeMap<SlotIndex, String>);

impl StateSnapshot {
    /// Returns the value of one slot, if it has been written.
    pub fn get(&self, index: SlotIndex) -> Option<&str> {
        self.0.get(&index).map(String::as_str)
    }

    /// Number of slots holding a value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotIndex, &str)> {
        self.0.iter().map(|(index, value)| (*index, value.as_str()))
    }
}

impl From<BTreeMap<SlotIndex, String>> for StateSnapshot {
    fn from(values: BTreeMap<SlotIndex, String>) -> Self {
        Self(values)
    }
}
