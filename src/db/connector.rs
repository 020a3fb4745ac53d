//! Driver abstraction for pooled connections.
//!
//! The pool never looks inside a connection; it only needs to open one,
//! ask whether it is still alive, and reopen it in place.

use thiserror::Error;

use crate::config::PoolConfig;

/// Where connections go and who they log in as.
#[derive(Clone, PartialEq, Eq)]
pub struct DataSource {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl DataSource {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl From<&PoolConfig> for DataSource {
    fn from(config: &PoolConfig) -> Self {
        Self::new(
            config.data_source.clone(),
            config.username.clone(),
            config.password.clone(),
        )
    }
}

// Keep the password out of logs.
impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSource")
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Failure to open or reopen a connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid data source {0:?}")]
    InvalidDataSource(String),

    #[error("connection refused: {0}")]
    Refused(String),
}

/// Opens and checks connections for a [`ConnectionPool`](crate::db::ConnectionPool).
pub trait Connector: Send + Sync + 'static {
    type Connection: Send + 'static;

    /// Open a brand-new connection.
    fn connect(&self, source: &DataSource) -> Result<Self::Connection, ConnectError>;

    /// Whether `conn` is currently usable.
    fn is_connected(&self, conn: &Self::Connection) -> bool;

    /// Re-establish `conn` in place. Replaces it with a fresh one by default.
    fn reconnect(
        &self,
        conn: &mut Self::Connection,
        source: &DataSource,
    ) -> Result<(), ConnectError> {
        *conn = self.connect(source)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_password() {
        let source = DataSource::new("db:5432", "booking", "hunter2");
        let printed = format!("{:?}", source);
        assert!(printed.contains("booking"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_from_pool_config() {
        let config = PoolConfig {
            data_source: "db.internal:5432".into(),
            username: "svc".into(),
            password: "pw".into(),
            ..PoolConfig::default()
        };
        assert_eq!(DataSource::from(&config), DataSource::new("db.internal:5432", "svc", "pw"));
    }
}
