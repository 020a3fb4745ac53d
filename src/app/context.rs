//! Shared request context.

use crate::db::{ConnectionPool, Connector};

/// Everything a handler can reach besides its own request.
pub struct Context<M: Connector> {
    pub pool: ConnectionPool<M>,
}

impl<M: Connector> Context<M> {
    pub fn new(pool: ConnectionPool<M>) -> Self {
        Self { pool }
    }
}
