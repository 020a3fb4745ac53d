//! Request dispatch and connection pooling for the reservation server.

pub mod app;
pub mod config;
pub mod db;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::ServerConfig;
pub use db::{ConnectionPool, Connector, PooledConnection};
pub use http::{HttpServer, HttpTask, Method};
pub use lifecycle::Shutdown;
pub use routing::Router;
