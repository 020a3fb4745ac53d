//! TCP-backed connector.
//!
//! Treats the data source name as a `host:port` and keeps one TCP session
//! per pooled connection. Liveness is a non-blocking one-byte peek: an
//! orderly shutdown from the server reads as zero bytes.

use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::db::connector::{ConnectError, Connector, DataSource};

#[derive(Debug, Clone)]
pub struct TcpConnector {
    connect_timeout: Duration,
}

impl TcpConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

impl Connector for TcpConnector {
    type Connection = TcpStream;

    fn connect(&self, source: &DataSource) -> Result<TcpStream, ConnectError> {
        let addr = source
            .name
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConnectError::InvalidDataSource(source.name.clone()))?;

        let stream = TcpStream::connect_timeout(&addr, self.connect_timeout)?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    fn is_connected(&self, conn: &TcpStream) -> bool {
        if conn.set_nonblocking(true).is_err() {
            return false;
        }

        let mut buf = [0u8; 1];
        let alive = match conn.peek(&mut buf) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => e.kind() == io::ErrorKind::WouldBlock,
        };

        conn.set_nonblocking(false).is_ok() && alive
    }
}
