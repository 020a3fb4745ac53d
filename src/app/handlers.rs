//! Built-in operational routes.
//!
//! - `GET /health`: liveness, never touches the pool
//! - `GET /api/pool/status`: pool size and borrow counts
//! - `GET /api/pool/ping`: borrow a connection and report its slot

use axum::http::StatusCode;
use serde::Serialize;

use crate::app::Context;
use crate::db::{Connector, PoolStatus};
use crate::http::HttpTask;
use crate::routing::Router;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct PingResult {
    pub connected: bool,
    pub slot: u64,
}

/// Register the built-in routes on a fresh router.
pub fn build_router<M: Connector>() -> Router<Context<M>> {
    let mut router = Router::new();
    router.route("/health").get(health::<M>);
    router
        .route("/api/pool")
        .child("status")
        .get(pool_status::<M>);
    router.route("/api/pool/ping").get(pool_ping::<M>);
    router
}

fn health<M: Connector>(task: &mut HttpTask, _ctx: &Context<M>) {
    task.response.set_json(
        StatusCode::OK,
        &SystemStatus {
            version: env!("CARGO_PKG_VERSION"),
            status: "operational",
        },
    );
}

fn pool_status<M: Connector>(task: &mut HttpTask, ctx: &Context<M>) {
    let status: PoolStatus = ctx.pool.status();
    task.response.set_json(StatusCode::OK, &status);
}

fn pool_ping<M: Connector>(task: &mut HttpTask, ctx: &Context<M>) {
    match ctx.pool.get_connection() {
        Ok(conn) => {
            let result = PingResult {
                connected: ctx.pool.connector().is_connected(&conn),
                slot: conn.slot(),
            };
            task.response.set_json(StatusCode::OK, &result);
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ping could not borrow a connection");
            task.response.set_json(
                StatusCode::SERVICE_UNAVAILABLE,
                &serde_json::json!({ "message": e.to_string() }),
            );
        }
    }
}
