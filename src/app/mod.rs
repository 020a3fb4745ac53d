//! Application wiring: the shared request context and the built-in routes.

pub mod context;
pub mod handlers;

pub use context::Context;
pub use handlers::build_router;
