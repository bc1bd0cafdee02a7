//! The authoritative record of the current connection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use super::Connection;

/// Owner of the live connection handle.
///
/// The handle slot doubles as the connected flag: the state is connected
/// exactly when a handle is present. All access goes through one exclusive
/// lock that is only ever held to copy or swap the slot, never across I/O.
/// Callers snapshot the handle, release the lock, then act on the snapshot.
///
/// Every transition is also published on a watch channel so observers can
/// wait for connectivity changes without polling.
#[derive(Debug)]
pub struct ConnectionState {
    slot: Mutex<Option<Arc<Connection>>>,
    events: watch::Sender<bool>,
}

impl Default for ConnectionState {
    fn default() -> Self { Self::new() }
}

impl ConnectionState {
    /// Create an empty, disconnected state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            events: watch::Sender::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Connection>>> {
        // The slot holds no invariant a panicking holder could break halfway.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the current handle, or `None` while disconnected.
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Connection>> { self.lock().clone() }

    /// Returns `true` while a handle is installed.
    #[must_use]
    pub fn is_connected(&self) -> bool { self.lock().is_some() }

    /// Install `handle` as the live connection.
    ///
    /// Any handle still installed is closed so at most one physical
    /// connection is referenced at a time.
    pub fn mark_connected(&self, handle: Arc<Connection>) {
        let id = handle.id();
        let previous = self.lock().replace(handle);
        if let Some(stale) = previous {
            stale.close();
            debug!(connection_id = stale.id(), "replaced stale connection handle");
        }
        self.events.send_replace(true);
        debug!(connection_id = id, "connection state: connected");
    }

    /// Clear and close the live handle.
    ///
    /// Returns `true` if a handle was present. The handle is closed before
    /// this returns, so it is unusable by the time the caller dials again.
    pub fn mark_disconnected(&self) -> bool {
        let previous = self.lock().take();
        let Some(handle) = previous else {
            return false;
        };
        handle.close();
        self.events.send_replace(false);
        debug!(connection_id = handle.id(), "connection state: disconnected");
        true
    }

    /// Subscribe to connectivity transitions.
    ///
    /// The receiver starts with the current value marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> { self.events.subscribe() }
}
