//! Route registration and dispatch.
//!
//! # Responsibilities
//! - Store route nodes in an arena addressed by [`NodeId`]
//! - Create nodes on registration, never on lookup
//! - Dispatch a (path, method) pair to a handler slot or the 404 handler
//!
//! # Design Decisions
//! - Registration needs `&mut Router`, dispatch only `&Router`; once the
//!   router is frozen behind an `Arc` the trie cannot change
//! - Nodes are never removed, so a `NodeId` stays valid for the router's life
//! - Unset slots all point at one shared not-found handler
//! - A miss is an ordinary response, never an error to the caller

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::task::{HttpTask, Method, TaskResponse};
use crate::observability::metrics;
use crate::routing::path;

/// A route handler: writes its result into the task's response.
pub type Handler<Ctx> = Arc<dyn Fn(&mut HttpTask, &Ctx) + Send + Sync>;

/// Message carried by every synthesized 404.
pub const NOT_FOUND_MESSAGE: &str = "API not found";

/// Index of a node inside a [`Router`].
///
/// Only meaningful for the router that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Errors from direct (non-creating) node access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("no route segment {segment:?} below node {parent}")]
    NoSuchSegment { parent: usize, segment: String },
}

/// Write the standard "API not found" response.
pub fn write_not_found(response: &mut TaskResponse) {
    response.set_json(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "message": NOT_FOUND_MESSAGE }),
    );
}

struct RouteNode<Ctx> {
    children: HashMap<String, NodeId>,
    handlers: [Handler<Ctx>; 4],
}

impl<Ctx> RouteNode<Ctx> {
    fn new(not_found: &Handler<Ctx>) -> Self {
        Self {
            children: HashMap::new(),
            handlers: std::array::from_fn(|_| Arc::clone(not_found)),
        }
    }
}

/// Trie router keyed by path segments.
pub struct Router<Ctx> {
    nodes: Vec<RouteNode<Ctx>>,
    not_found: Handler<Ctx>,
}

impl<Ctx: 'static> Router<Ctx> {
    /// Create a router holding only the root node.
    pub fn new() -> Self {
        let not_found: Handler<Ctx> = Arc::new(|task: &mut HttpTask, _ctx: &Ctx| {
            write_not_found(&mut task.response);
        });
        let root = RouteNode::new(&not_found);
        Self {
            nodes: vec![root],
            not_found,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether any node besides the root has been registered.
    pub fn has_routes(&self) -> bool {
        self.nodes.len() > 1
    }

    /// Whether `parent` has an immediate child for exactly `segment`.
    pub fn has(&self, parent: NodeId, segment: &str) -> bool {
        self.nodes[parent.0].children.contains_key(segment)
    }

    /// The existing child of `parent` for `segment`.
    pub fn at(&self, parent: NodeId, segment: &str) -> Result<NodeId, RouteError> {
        self.nodes[parent.0]
            .children
            .get(segment)
            .copied()
            .ok_or_else(|| RouteError::NoSuchSegment {
                parent: parent.0,
                segment: segment.to_owned(),
            })
    }

    /// The child of `parent` for `segment`, created if missing.
    pub fn child(&mut self, parent: NodeId, segment: &str) -> NodeId {
        if let Some(&id) = self.nodes[parent.0].children.get(segment) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(RouteNode::new(&self.not_found));
        self.nodes[parent.0].children.insert(segment.to_owned(), id);
        id
    }

    /// Register `url` and return a cursor on its terminal node.
    ///
    /// Registering the same normalized path again returns the same node.
    pub fn route(&mut self, url: &str) -> RouteMut<'_, Ctx> {
        let root = self.root();
        RouteMut { router: self, id: root }.route(url)
    }

    /// Assign the handler slot for `method` on `node`.
    pub fn set_handler<F>(&mut self, node: NodeId, method: Method, handler: F)
    where
        F: Fn(&mut HttpTask, &Ctx) + Send + Sync + 'static,
    {
        self.nodes[node.0].handlers[method.slot()] = Arc::new(handler);
    }

    /// Whether the slot for `method` on `node` was assigned by the application.
    pub fn is_configured(&self, node: NodeId, method: Method) -> bool {
        !Arc::ptr_eq(&self.nodes[node.0].handlers[method.slot()], &self.not_found)
    }

    /// Resolve `url` without creating anything.
    pub fn lookup(&self, url: &str) -> Option<NodeId> {
        self.resolve(self.root(), url)
    }

    fn resolve(&self, from: NodeId, url: &str) -> Option<NodeId> {
        path::segments(url).try_fold(from, |node, segment| {
            self.nodes[node.0].children.get(segment).copied()
        })
    }

    /// Run the handler slot for `method` on `node`.
    pub fn invoke(&self, node: NodeId, method: Method, task: &mut HttpTask, ctx: &Ctx) {
        let handler = &self.nodes[node.0].handlers[method.slot()];
        handler(task, ctx);
    }

    /// Resolve `url` and dispatch to the slot for `method`.
    ///
    /// Unknown paths and unassigned methods both produce the 404 response.
    pub fn call(&self, url: &str, method: Method, task: &mut HttpTask, ctx: &Ctx) {
        match self.lookup(url) {
            Some(node) => {
                if !self.is_configured(node, method) {
                    tracing::debug!(%url, %method, "No handler for method");
                    metrics::record_route_miss(method.as_str());
                }
                self.invoke(node, method, task, ctx);
            }
            None => {
                tracing::debug!(%url, %method, "No route matched");
                metrics::record_route_miss(method.as_str());
                (self.not_found)(task, ctx);
            }
        }
    }
}

impl<Ctx: 'static> Default for Router<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> std::fmt::Debug for Router<Ctx> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("nodes", &self.nodes.len())
            .finish_non_exhaustive()
    }
}

/// Mutable cursor on one node of a [`Router`], used while building routes.
pub struct RouteMut<'a, Ctx> {
    router: &'a mut Router<Ctx>,
    id: NodeId,
}

impl<'a, Ctx: 'static> RouteMut<'a, Ctx> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn has(&self, segment: &str) -> bool {
        self.router.has(self.id, segment)
    }

    /// Move to an existing child; fails if it was never created.
    pub fn at(self, segment: &str) -> Result<Self, RouteError> {
        let id = self.router.at(self.id, segment)?;
        Ok(Self { router: self.router, id })
    }

    /// Move to a child, creating it if missing.
    pub fn child(self, segment: &str) -> Self {
        let id = self.router.child(self.id, segment);
        Self { router: self.router, id }
    }

    /// Register `url` relative to this node.
    pub fn route(self, url: &str) -> Self {
        let mut id = self.id;
        for segment in path::segments(url) {
            id = self.router.child(id, segment);
        }
        Self { router: self.router, id }
    }

    pub fn on<F>(self, method: Method, handler: F) -> Self
    where
        F: Fn(&mut HttpTask, &Ctx) + Send + Sync + 'static,
    {
        self.router.set_handler(self.id, method, handler);
        self
    }

    pub fn get<F>(self, handler: F) -> Self
    where
        F: Fn(&mut HttpTask, &Ctx) + Send + Sync + 'static,
    {
        self.on(Method::Get, handler)
    }

    pub fn post<F>(self, handler: F) -> Self
    where
        F: Fn(&mut HttpTask, &Ctx) + Send + Sync + 'static,
    {
        self.on(Method::Post, handler)
    }

    pub fn put<F>(self, handler: F) -> Self
    where
        F: Fn(&mut HttpTask, &Ctx) + Send + Sync + 'static,
    {
        self.on(Method::Put, handler)
    }

    pub fn delete<F>(self, handler: F) -> Self
    where
        F: Fn(&mut HttpTask, &Ctx) + Send + Sync + 'static,
    {
        self.on(Method::Delete, handler)
    }
}
