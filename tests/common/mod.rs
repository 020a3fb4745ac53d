//! Shared utilities for integration tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use reservation_server::db::{ConnectError, Connector, DataSource};

/// A connection whose liveness the test controls.
#[derive(Debug)]
pub struct FakeConn {
    pub serial: usize,
    pub alive: Arc<AtomicBool>,
}

/// In-memory connector that counts attempts and can refuse on demand.
#[derive(Debug, Default)]
pub struct FakeConnector {
    /// Shared so a test can still read it after the pool consumed the connector.
    pub attempts: Arc<AtomicUsize>,
    pub reconnects: AtomicUsize,
    pub refuse: AtomicBool,
    handles: Mutex<Vec<Arc<AtomicBool>>>,
}

#[allow(dead_code)]
impl FakeConnector {
    /// Mark every connection opened so far as disconnected.
    pub fn kill_all(&self) {
        for handle in self.handles.lock().unwrap().iter() {
            handle.store(false, Ordering::SeqCst);
        }
    }

    /// Mark the connection with the given serial as disconnected.
    pub fn kill(&self, serial: usize) {
        self.handles.lock().unwrap()[serial].store(false, Ordering::SeqCst);
    }

    pub fn opened(&self) -> usize {
        self.handles.lock().unwrap().len()
    }
}

impl Connector for FakeConnector {
    type Connection = FakeConn;

    fn connect(&self, _source: &DataSource) -> Result<FakeConn, ConnectError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ConnectError::Refused("fake data source is down".into()));
        }

        let alive = Arc::new(AtomicBool::new(true));
        let mut handles = self.handles.lock().unwrap();
        handles.push(Arc::clone(&alive));
        Ok(FakeConn {
            serial: handles.len() - 1,
            alive,
        })
    }

    fn is_connected(&self, conn: &FakeConn) -> bool {
        conn.alive.load(Ordering::SeqCst)
    }

    fn reconnect(&self, conn: &mut FakeConn, _source: &DataSource) -> Result<(), ConnectError> {
        self.reconnects.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ConnectError::Refused("fake data source is down".into()));
        }
        conn.alive.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[allow(dead_code)]
pub fn source() -> DataSource {
    DataSource::new("fake://reservations", "booking", "secret")
}
