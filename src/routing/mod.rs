//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (single thread):
//!     router.route("/rooms/list")
//!     → path.rs (strip query, split on '/', drop blank segments)
//!     → router.rs (walk the trie, creating missing nodes)
//!     → assign GET/POST/PUT/DELETE handler slots on the terminal node
//!     → freeze as Arc<Router>
//!
//! Per request (any worker thread):
//!     router.call(url, method, task, ctx)
//!     → path.rs (same normalization)
//!     → router.rs (walk existing nodes only)
//!     → handler slot, or the shared 404 handler
//! ```
//!
//! # Design Decisions
//! - Routes are exact segment matches; no parameters or wildcards
//! - Lookup never allocates nodes, so misses cannot grow the trie
//! - One handler slot per method per node

pub mod path;
pub mod router;

pub use router::{write_not_found, Handler, NodeId, RouteError, RouteMut, Router, NOT_FOUND_MESSAGE};
