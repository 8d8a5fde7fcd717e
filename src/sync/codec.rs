//! Wire messages.
//!
//! Two shapes travel over the socket:
//! - the snapshot, a JSON object `{"<index>": "<value>", ...}` sent once
//!   right after a connection is admitted
//! - the update, `{"index": <int>, "value": "<string>"}`, sent by a client
//!   and forwarded byte-for-byte to every other connection

use crate::store::{Label, SlotIndex, StateSnapshot};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// A proposed change to one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub index: SlotIndex,
    pub value: String,
}

/// A decoded update together with the exact text the client sent.
#[derive(Debug, Clone)]
pub struct UpdateFrame {
    pub update: SlotUpdate,
    pub payload: Arc<str>,
}

/// Errors raised while decoding or encoding wire messages.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed update: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("slot index {index} is outside 1..={max}")]
    IndexOutOfRange { index: SlotIndex, max: SlotIndex },

    #[error("unknown value {0:?}")]
    UnknownValue(String),

    #[error("failed to encode message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Decodes and validates client updates against the fixed slot range and
/// the label set.
#[derive(Debug, Clone)]
pub struct MessageCodec {
    slot_count: SlotIndex,
    values: Vec<String>,
}

impl MessageCodec {
    pub fn new(slot_count: SlotIndex, labels: &[Label]) -> Self {
        Self {
            slot_count,
            values: labels.iter().map(|label| label.value.clone()).collect(),
        }
    }

    /// Decodes one client text frame.
    pub fn decode_update(&self, text: &str) -> Result<UpdateFrame, CodecError> {
        let update: SlotUpdate = serde_json::from_str(text).map_err(CodecError::Malformed)?;

        if !(1..=self.slot_count).contains(&update.index) {
            return Err(CodecError::IndexOutOfRange {
                index: update.index,
                max: self.slot_count,
            });
        }
        if !self.values.iter().any(|value| *value == update.value) {
            return Err(CodecError::UnknownValue(update.value));
        }

        Ok(UpdateFrame {
            update,
            payload: Arc::from(text),
        })
    }

    /// Encodes the bootstrap snapshot message.
    pub fn encode_snapshot(&self, snapshot: &StateSnapshot) -> Result<Arc<str>, CodecError> {
        serde_json::to_string(snapshot)
            .map(Arc::from)
            .map_err(CodecError::Encode)
    }
}
