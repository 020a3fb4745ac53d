//! Database connection pooling subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     PoolConfig → ConnectionPool::new
//!     → connector.rs (open N connections eagerly)
//!     → slot.rs (queue of Idle slots)
//!
//! Handler borrows:
//!     pool.get_connection()
//!     → slot.rs (rotate past Borrowed slots; full lap → grow by one)
//!     → connector.rs (reconnect until usable, per RetryPolicy)
//!     → guard.rs (PooledConnection, marks slot Idle again on drop)
//!
//! Periodic sweep (health::sweeper):
//!     pool.update_connections()
//!     → replace every Idle connection that reports disconnected
//! ```
//!
//! # Design Decisions
//! - Borrow state is explicit per slot, never inferred from reference counts
//! - Connections are opaque; the driver is a `Connector` implementation
//! - All operations are synchronous and block the calling thread

pub mod connector;
pub mod guard;
pub mod pool;
pub mod slot;
pub mod tcp;

pub use connector::{ConnectError, Connector, DataSource};
pub use guard::PooledConnection;
pub use pool::{ConnectionPool, PoolError, PoolOptions, PoolStatus};
pub use slot::SlotId;
pub use tcp::TcpConnector;
