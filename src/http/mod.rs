//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID, tracing, timeout, body buffering)
//!     → task.rs (HttpTask: request + writable response)
//!     → Router::call on a blocking thread
//!     → task.rs (TaskResponse → HTTP response)
//!     → Send to client
//! ```

pub mod server;
pub mod task;

pub use server::HttpServer;
pub use task::{HttpTask, Method, TaskResponse};
