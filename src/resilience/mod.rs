//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Pool operation fails (connect, reconnect, grow):
//!     → retries.rs (policy: may we try again? how long to wait?)
//!     → sleep with jittered exponential backoff
//!     → retry, or surface PoolError::Unavailable once the budget is spent
//! ```
//!
//! # Design Decisions
//! - Default policy retries forever, matching a pool that never gives up
//! - A bounded policy turns an outage into a typed error instead of a hang
//! - Jitter keeps concurrent borrowers from reconnecting in lockstep

pub mod retries;

pub use retries::RetryPolicy;
