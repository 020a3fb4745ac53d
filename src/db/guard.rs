//! RAII handle for a borrowed connection.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::db::connector::Connector;
use crate::db::pool::Shared;
use crate::db::slot::SlotId;

/// A connection lent out by a [`ConnectionPool`](crate::db::ConnectionPool).
///
/// The slot stays marked borrowed until this guard is dropped or
/// [`release`](Self::release)d, on every exit path.
pub struct PooledConnection<M: Connector> {
    shared: Arc<Shared<M>>,
    slot: SlotId,
    conn: Option<M::Connection>,
}

impl<M: Connector> PooledConnection<M> {
    pub(crate) fn new(shared: Arc<Shared<M>>, slot: SlotId, conn: M::Connection) -> Self {
        Self {
            shared,
            slot,
            conn: Some(conn),
        }
    }

    /// Identity of the pool slot this connection belongs to.
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    /// Hand the connection back to the pool now.
    pub fn release(self) {
        drop(self);
    }
}

impl<M: Connector> Deref for PooledConnection<M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        self.conn.as_ref().expect("connection is present until release")
    }
}

impl<M: Connector> DerefMut for PooledConnection<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("connection is present until release")
    }
}

impl<M: Connector> Drop for PooledConnection<M> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.shared.checkin(self.slot, conn);
        }
    }
}

impl<M: Connector> std::fmt::Debug for PooledConnection<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PooledConnection")
            .field("slot", &self.slot)
            .finish_non_exhaustive()
    }
}
