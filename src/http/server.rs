//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wire up middleware (request ID, tracing, timeout)
//! - Buffer each request into an [`HttpTask`]
//! - Dispatch through the route trie on the blocking pool
//! - Bind server to listener and shut down gracefully

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ListenerConfig;
use crate::http::task::{HttpTask, Method, TaskResponse};
use crate::lifecycle::Shutdown;
use crate::routing::{write_not_found, Router};

/// Largest request body buffered for a handler.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state injected into the dispatch handler.
struct AppState<Ctx> {
    router: Arc<Router<Ctx>>,
    ctx: Arc<Ctx>,
}

impl<Ctx> Clone for AppState<Ctx> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
            ctx: Arc::clone(&self.ctx),
        }
    }
}

/// HTTP front end for a frozen [`Router`].
pub struct HttpServer<Ctx> {
    state: AppState<Ctx>,
    config: ListenerConfig,
}

impl<Ctx: Send + Sync + 'static> HttpServer<Ctx> {
    /// Take ownership of the router; no routes can be added afterwards.
    pub fn new(router: Router<Ctx>, ctx: Ctx, config: ListenerConfig) -> Self {
        tracing::info!(nodes = router.len(), "Route table frozen");
        Self {
            state: AppState {
                router: Arc::new(router),
                ctx: Arc::new(ctx),
            },
            config,
        }
    }

    /// Build the axum application with all middleware layers.
    #[allow(deprecated)]
    pub fn app(&self) -> axum::Router {
        axum::Router::new()
            .fallback(dispatch::<Ctx>)
            .with_state(self.state.clone())
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.request_timeout_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve on `listener` until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch<Ctx: Send + Sync + 'static>(
    State(state): State<AppState<Ctx>>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let method = Method::from_http(&parts.method);
    let mut task = HttpTask::new(axum::http::Request::from_parts(parts, body));

    // Handlers may block on the connection pool.
    let handled = tokio::task::spawn_blocking(move || {
        match method {
            Some(method) => {
                let target = task.target().to_owned();
                state.router.call(&target, method, &mut task, &state.ctx);
            }
            None => {
                tracing::debug!(method = %task.request.method(), "Unroutable method");
                write_not_found(&mut task.response);
            }
        }
        task.into_response()
    })
    .await;

    match handled {
        Ok(response) => into_http_response(response),
        Err(e) => {
            tracing::error!(error = %e, "Route handler panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn into_http_response(task_response: TaskResponse) -> Response {
    let TaskResponse { status, headers, body } = task_response;
    let mut response = Response::new(Body::from(body.freeze()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
