//! Registry of open connections.

use super::connection::{Connection, ConnectionId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// The set of currently open connections.
///
/// Iteration always works on a copy taken under the lock, so callers never
/// send while holding it.
#[derive(Debug)]
pub struct ConnectionRegistry {
    members: Mutex<HashMap<ConnectionId, Connection>>,
    next_id: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Allocates an identity for a new connection.
    pub fn next_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Registers a connection. No-op if already present.
    pub fn add(&self, conn: Connection) {
        let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.entry(conn.id()).or_insert(conn);
    }

    /// Deregisters a connection. Returns whether it was present.
    pub fn remove(&self, id: ConnectionId) -> bool {
        let mut members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.remove(&id).is_some()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        let members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        let members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the current member set.
    pub fn snapshot(&self) -> Vec<Connection> {
        let members = self.members.lock().unwrap_or_else(PoisonError::into_inner);
        members.values().cloned().collect()
    }

    /// Calls `f` for every member of a copy of the current set.
    ///
    /// The lock is released before `f` runs, so `f` may call back into the
    /// registry (e.g. to remove a failed connection).
    pub fn for_each(&self, mut f: impl FnMut(&Connection)) {
        for conn in self.snapshot() {
            f(&conn);
        }
    }
}
