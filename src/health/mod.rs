//! Health subsystem.
//!
//! # Data Flow
//! ```text
//! Periodic timer (sweeper.rs)
//!     → blocking thread: pool.update_connections()
//!     → dead idle connections replaced in place
//!     → stop on shutdown broadcast
//! ```
//!
//! # Design Decisions
//! - The pool never schedules itself; the sweep is driven from here
//! - Sweeps run on the blocking pool so they never stall async workers

pub mod sweeper;

pub use sweeper::PoolSweeper;
