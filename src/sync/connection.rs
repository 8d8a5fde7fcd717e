//! Connection handles and their outboxes.
//!
//! A [`Connection`] is the cheap, cloneable handle stored in the registry.
//! Its [`Outbox`] is the receiving end, owned by the task that writes to the
//! socket. Delivering never blocks; a connection that stops draining its
//! outbox is caught by the writer's per-write timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Notify};

/// Unique identity of a connection for the lifetime of the process.
pub type ConnectionId = u64;

/// Why a message could not be handed to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("connection is closed")]
    Closed,
}

#[derive(Debug)]
struct Liveness {
    open: AtomicBool,
    closed: Notify,
}

impl Liveness {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Flips the flag to closed and wakes the writer. Only the first call has an effect.
    fn shut(&self) {
        if self.open.swap(false, Ordering::AcqRel) {
            self.closed.notify_one();
        }
    }
}

/// Handle to one live client channel.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    outbox: mpsc::UnboundedSender<Arc<str>>,
    liveness: Arc<Liveness>,
}

impl Connection {
    /// Creates a connection handle and the outbox its writer drains.
    pub fn open(id: ConnectionId) -> (Self, Outbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let liveness = Arc::new(Liveness {
            open: AtomicBool::new(true),
            closed: Notify::new(),
        });

        let connection = Self {
            id,
            outbox: tx,
            liveness: Arc::clone(&liveness),
        };
        (connection, Outbox { rx, liveness })
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn is_open(&self) -> bool {
        self.liveness.is_open()
    }

    /// Queues a text frame for the writer task.
    ///
    /// Fails only when the connection is closed or its writer is gone.
    pub fn deliver(&self, payload: Arc<str>) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        self.outbox.send(payload).map_err(|_| SendError::Closed)
    }

    /// Marks the connection closed and wakes its writer. Idempotent.
    pub fn close(&self) {
        self.liveness.shut();
    }
}

/// Receiving side of a connection, drained onto the socket.
#[derive(Debug)]
pub struct Outbox {
    rx: mpsc::UnboundedReceiver<Arc<str>>,
    liveness: Arc<Liveness>,
}

impl Outbox {
    /// Waits for the next queued frame.
    ///
    /// After the connection is closed, frames queued before the close are
    /// still handed out; `None` follows once they are exhausted.
    pub async fn next(&mut self) -> Option<Arc<str>> {
        if !self.liveness.is_open() {
            return self.rx.try_recv().ok();
        }
        tokio::select! {
            biased;
            payload = self.rx.recv() => payload,
            _ = self.liveness.closed.notified() => self.rx.try_recv().ok(),
        }
    }

    /// Marks the connection closed from the writer side. Idempotent.
    pub fn close(&self) {
        self.liveness.shut();
    }
}
