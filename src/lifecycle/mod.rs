//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown (shutdown.rs):
//!     Ctrl+C received → trigger broadcast
//!     → HTTP server stops accepting and drains
//!     → pool sweeper exits its loop
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
