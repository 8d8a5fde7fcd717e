//! Applies updates to the store and fans them out.
//!
//! All mutation of the shared state flows through [`BroadcastEngine`]. Each
//! `apply` writes the store, copies the registry, and queues the payload on
//! every other connection's outbox. Queueing never blocks; the socket writes
//! happen later in each connection's writer task. A connection that cannot
//! take the payload is closed and evicted without affecting the rest.

use super::codec::{CodecError, MessageCodec, UpdateFrame};
use super::connection::{Connection, ConnectionId, SendError};
use super::registry::ConnectionRegistry;
use crate::store::StateStore;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Why a new connection could not be admitted.
#[derive(Debug, Error)]
pub enum AdmitError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to send snapshot: {0}")]
    Send(#[from] SendError),
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Connections the payload was queued on.
    pub delivered: usize,

    /// Connections closed and removed because the send failed.
    pub evicted: Vec<ConnectionId>,
}

/// Owner of the shared store and connection registry.
#[derive(Debug)]
pub struct BroadcastEngine {
    store: Arc<StateStore>,
    registry: Arc<ConnectionRegistry>,
    codec: MessageCodec,
    // Orders store writes with their fan-out, and snapshots with later updates.
    sequencer: Mutex<()>,
}

impl BroadcastEngine {
    pub fn new(
        store: Arc<StateStore>,
        registry: Arc<ConnectionRegistry>,
        codec: MessageCodec,
    ) -> Self {
        Self {
            store,
            registry,
            codec,
            sequencer: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn codec(&self) -> &MessageCodec {
        &self.codec
    }

    /// Registers a connection and queues the current snapshot on it.
    ///
    /// The snapshot is queued before any update applied afterwards, so the
    /// client never sees an update older than its bootstrap state.
    pub fn admit(&self, conn: &Connection) -> Result<(), AdmitError> {
        let _order = self.sequencer.lock().unwrap_or_else(PoisonError::into_inner);

        self.registry.add(conn.clone());
        let result = self
            .codec
            .encode_snapshot(&self.store.snapshot())
            .map_err(AdmitError::from)
            .and_then(|payload| conn.deliver(payload).map_err(AdmitError::from));
        if result.is_err() {
            self.evict(conn);
        }
        result
    }

    /// Writes the update to the store and queues its original bytes on
    /// every registered connection except `origin`.
    pub fn apply(&self, frame: &UpdateFrame, origin: Option<ConnectionId>) -> FanOut {
        let _order = self.sequencer.lock().unwrap_or_else(PoisonError::into_inner);

        let update = &frame.update;
        if !self.store.set(update.index, update.value.clone()) {
            return FanOut::default();
        }

        let mut fan_out = FanOut::default();
        self.registry.for_each(|conn| {
            if Some(conn.id()) == origin {
                return;
            }
            match conn.deliver(Arc::clone(&frame.payload)) {
                Ok(()) => fan_out.delivered += 1,
                Err(e) => {
                    tracing::info!(conn = conn.id(), error = %e, "Evicting connection");
                    self.evict(conn);
                    fan_out.evicted.push(conn.id());
                }
            }
        });

        tracing::debug!(
            index = update.index,
            value = %update.value,
            delivered = fan_out.delivered,
            evicted = fan_out.evicted.len(),
            "Update applied"
        );
        fan_out
    }

    /// Deregisters a connection whose read loop has ended. Idempotent.
    pub fn depart(&self, conn: &Connection) {
        conn.close();
        self.registry.remove(conn.id());
    }

    /// Closes and deregisters every connection.
    pub fn close_all(&self) -> usize {
        let mut closed = 0;
        self.registry.for_each(|conn| {
            self.evict(conn);
            closed += 1;
        });
        closed
    }

    fn evict(&self, conn: &Connection) {
        conn.close();
        self.registry.remove(conn.id());
    }
}
