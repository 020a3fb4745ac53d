//! Request/response exchange handed to route handlers.
//!
//! # Responsibilities
//! - Carry the inbound request (method, URI, headers, buffered body)
//! - Collect the outbound response written by a handler
//! - Map HTTP methods onto the four routable handler slots
//!
//! # Design Decisions
//! - Handlers write into the response in place instead of returning one
//! - Bodies are fully buffered; streaming is the server runtime's concern

use axum::body::Bytes;
use axum::http::{self, header, HeaderMap, HeaderValue, Request, StatusCode};
use bytes::BytesMut;
use serde::Serialize;

/// The HTTP methods a route node has handler slots for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// All routable methods, in slot order.
    pub const ALL: [Method; 4] = [Method::Get, Method::Post, Method::Put, Method::Delete];

    /// Slot index of this method within a route node.
    pub fn slot(self) -> usize {
        match self {
            Method::Get => 0,
            Method::Post => 1,
            Method::Put => 2,
            Method::Delete => 3,
        }
    }

    /// Map an HTTP method; anything outside the four slots is `None`.
    pub fn from_http(method: &http::Method) -> Option<Self> {
        Method::ALL
            .into_iter()
            .find(|m| m.as_str() == method.as_str())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response side of an [`HttpTask`], mutated by handlers.
#[derive(Debug)]
pub struct TaskResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BytesMut,
}

impl Default for TaskResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }
}

impl TaskResponse {
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Append raw bytes to the output body.
    pub fn append_body(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    /// Serialize `value` as compact JSON, append it and set the content type.
    ///
    /// Serialization failures become a 500 with an empty body.
    pub fn set_json<T: Serialize + ?Sized>(&mut self, status: StatusCode, value: &T) {
        match serde_json::to_vec(value) {
            Ok(json) => {
                self.status = status;
                self.headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                self.append_body(&json);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response body");
                self.status = StatusCode::INTERNAL_SERVER_ERROR;
                self.body.clear();
            }
        }
    }
}

/// A single request/response exchange.
#[derive(Debug)]
pub struct HttpTask {
    pub request: Request<Bytes>,
    pub response: TaskResponse,
}

impl HttpTask {
    pub fn new(request: Request<Bytes>) -> Self {
        Self {
            request,
            response: TaskResponse::default(),
        }
    }

    /// Build a task with an empty body, mostly useful in tests.
    pub fn from_parts(method: http::Method, uri: &str) -> Result<Self, http::Error> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::new())?;
        Ok(Self::new(request))
    }

    /// The request target including the query string, as routed.
    pub fn target(&self) -> &str {
        self.request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    /// Finish the exchange and hand back the collected response.
    pub fn into_response(self) -> TaskResponse {
        self.response
    }
}
