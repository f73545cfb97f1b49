//! In-memory live connection set
//!
//! The broker's connection layer registers each accepted connection here and
//! keeps its identity and buffer sizes current. The scrape path reads it
//! through [`ConnectionSource`].
//!
//! # Locking
//!
//! - Writers take the write lock per update
//! - [`ConnectionSource::snapshot`] copies the whole set under one read lock,
//!   so a single aggregation pass never sees a half-applied update

use crate::domain::connection::ConnectionSnapshot;
use crate::domain::ports::ConnectionSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Handle identifying one registered connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    connections: RwLock<HashMap<ConnectionId, ConnectionSnapshot>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly accepted, unauthenticated connection.
    pub fn open(&self) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write()
            .insert(id, ConnectionSnapshot::unauthenticated());
        id
    }

    /// Record a successful handshake.
    pub fn authenticate(&self, id: ConnectionId, ident: &str, owner: Option<&str>) {
        if let Some(conn) = self.write().get_mut(&id) {
            conn.identity = Some(ident.to_string());
            conn.owner = owner.map(str::to_string);
        }
    }

    pub fn update_buffers(&self, id: ConnectionId, send_buffer_bytes: u64, receive_buffer_bytes: u64) {
        if let Some(conn) = self.write().get_mut(&id) {
            conn.send_buffer_bytes = send_buffer_bytes;
            conn.receive_buffer_bytes = receive_buffer_bytes;
        }
    }

    /// Drop a connection. Returns its last snapshot if it was registered.
    pub fn close(&self, id: ConnectionId) -> Option<ConnectionSnapshot> {
        self.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking writer leaves plain data behind, never a torn invariant.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ConnectionId, ConnectionSnapshot>> {
        self.connections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ConnectionId, ConnectionSnapshot>> {
        self.connections.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionSource for ConnectionRegistry {
    fn snapshot(&self) -> Vec<ConnectionSnapshot> {
        self.read().values().cloned().collect()
    }
}
