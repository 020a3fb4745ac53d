//! Blocking connection pool for a single data source.
//!
//! # Responsibilities
//! - Open the initial connections eagerly
//! - Lend idle connections, rotating past borrowed ones
//! - Grow by one connection when a full rotation finds nothing idle
//! - Reconnect a lent connection until it is usable (or the retry budget ends)
//! - Sweep idle connections and replace dead ones
//!
//! # Design Decisions
//! - One mutex covers all queue bookkeeping; callers use connections unlocked
//! - Reconnecting a lent connection happens outside the lock, since the slot
//!   is already marked borrowed
//! - Growth is unbounded unless `max_size` is set; at the cap, borrowers wait
//!   for a release up to `acquire_timeout`

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::config::PoolConfig;
use crate::db::connector::{ConnectError, Connector, DataSource};
use crate::db::guard::PooledConnection;
use crate::db::slot::{SlotId, SlotQueue, SlotState};
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

/// Errors surfaced by the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("connection pool size must be greater than 0")]
    InvalidSize,

    #[error("maximum pool size {max} is smaller than initial size {size}")]
    InvalidMaxSize { size: usize, max: usize },

    #[error("failed to open connection {index} of {size}")]
    Connect {
        index: usize,
        size: usize,
        #[source]
        source: ConnectError,
    },

    #[error("data source unavailable after {attempts} attempts")]
    Unavailable {
        attempts: u32,
        #[source]
        source: ConnectError,
    },

    #[error("all {size} connections stayed borrowed for {waited:?}")]
    Exhausted { size: usize, waited: Duration },
}

/// Tunables for a [`ConnectionPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOptions {
    /// Initial size; the CPU count when `None`.
    pub size: Option<usize>,
    pub max_size: Option<usize>,
    pub acquire_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            size: None,
            max_size: None,
            acquire_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

impl PoolOptions {
    pub fn size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl From<&PoolConfig> for PoolOptions {
    fn from(config: &PoolConfig) -> Self {
        Self {
            size: config.size,
            max_size: config.max_size,
            acquire_timeout: Duration::from_millis(config.acquire_timeout_ms),
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Point-in-time view of the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStatus {
    pub size: usize,
    pub idle: usize,
    pub borrowed: usize,
}

pub(crate) struct Shared<M: Connector> {
    connector: M,
    source: DataSource,
    options: PoolOptions,
    queue: Mutex<SlotQueue<M::Connection>>,
    released: Condvar,
}

impl<M: Connector> Shared<M> {
    fn lock(&self) -> MutexGuard<'_, SlotQueue<M::Connection>> {
        // Queue updates are single statements, so a poisoned queue is still consistent.
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn checkin(&self, slot: SlotId, conn: M::Connection) {
        let mut queue = self.lock();
        if queue.checkin(slot, conn).is_err() {
            tracing::warn!(slot, "Released connection has no slot; dropping it");
        }
        drop(queue);
        self.released.notify_one();
    }
}

/// A pool of reusable connections to one [`DataSource`].
///
/// Cloning is cheap and shares the same pool.
pub struct ConnectionPool<M: Connector> {
    shared: Arc<Shared<M>>,
}

impl<M: Connector> Clone for ConnectionPool<M> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<M: Connector> std::fmt::Debug for ConnectionPool<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("source", &self.shared.source)
            .field("status", &self.status())
            .finish()
    }
}

impl<M: Connector> ConnectionPool<M> {
    /// Open the initial connections and build the pool.
    ///
    /// A size of zero is rejected before any connection is attempted.
    pub fn new(connector: M, source: DataSource, options: PoolOptions) -> Result<Self, PoolError> {
        let size = options.size.unwrap_or_else(num_cpus::get);
        if size == 0 {
            return Err(PoolError::InvalidSize);
        }
        if let Some(max) = options.max_size {
            if max < size {
                return Err(PoolError::InvalidMaxSize { size, max });
            }
        }

        let mut queue = SlotQueue::with_capacity(size);
        for index in 0..size {
            let conn = connector
                .connect(&source)
                .map_err(|source| PoolError::Connect { index, size, source })?;
            queue.push_idle(conn);
        }

        tracing::info!(data_source = %source.name, size, max_size = ?options.max_size, "Connection pool ready");
        metrics::record_pool_size(size);

        Ok(Self {
            shared: Arc::new(Shared {
                connector,
                source,
                options,
                queue: Mutex::new(queue),
                released: Condvar::new(),
            }),
        })
    }

    /// Pool of exactly `size` connections with default options.
    pub fn with_size(connector: M, source: DataSource, size: usize) -> Result<Self, PoolError> {
        Self::new(connector, source, PoolOptions::default().size(size))
    }

    /// Pool configured from the `[pool]` config section.
    pub fn from_config(connector: M, config: &PoolConfig) -> Result<Self, PoolError> {
        Self::new(connector, DataSource::from(config), PoolOptions::from(config))
    }

    pub fn connector(&self) -> &M {
        &self.shared.connector
    }

    pub fn status(&self) -> PoolStatus {
        let queue = self.shared.lock();
        let size = queue.len();
        let idle = queue.idle();
        PoolStatus {
            size,
            idle,
            borrowed: size - idle,
        }
    }

    /// Borrow a connected handle.
    ///
    /// The handle goes back to the pool when the returned guard is dropped.
    pub fn get_connection(&self) -> Result<PooledConnection<M>, PoolError> {
        let (slot, conn) = self.checkout()?;
        let mut conn = PooledConnection::new(Arc::clone(&self.shared), slot, conn);
        self.ensure_connected(&mut conn)?;
        metrics::record_borrow();
        Ok(conn)
    }

    fn checkout(&self) -> Result<(SlotId, M::Connection), PoolError> {
        let shared = &*self.shared;
        let policy = shared.options.retry;
        let deadline = Instant::now() + shared.options.acquire_timeout;
        let mut failures = 0;

        let mut queue = shared.lock();
        loop {
            if let Some(found) = queue.checkout() {
                return Ok(found);
            }

            if shared.options.max_size.is_some_and(|max| queue.len() >= max) {
                let now = Instant::now();
                if now >= deadline {
                    tracing::warn!(size = queue.len(), "Connection pool exhausted at maximum size");
                    return Err(PoolError::Exhausted {
                        size: queue.len(),
                        waited: shared.options.acquire_timeout,
                    });
                }
                queue = shared
                    .released
                    .wait_timeout(queue, deadline - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
                continue;
            }

            match shared.connector.connect(&shared.source) {
                Ok(conn) => {
                    let slot = queue.push_borrowed();
                    tracing::info!(size = queue.len(), "Connection pool grown after full rotation");
                    metrics::record_pool_growth();
                    metrics::record_pool_size(queue.len());
                    return Ok((slot, conn));
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(error = %e, attempt = failures, "Connection pool: failed to create new connection");
                    metrics::record_connect_failure("grow");
                    if policy.is_exhausted(failures) {
                        return Err(PoolError::Unavailable {
                            attempts: failures,
                            source: e,
                        });
                    }
                    drop(queue);
                    policy.pause(failures);
                    queue = shared.lock();
                }
            }
        }
    }

    fn ensure_connected(&self, conn: &mut PooledConnection<M>) -> Result<(), PoolError> {
        let shared = &*self.shared;
        let policy = shared.options.retry;
        let mut failures = 0;

        while !shared.connector.is_connected(conn) {
            match shared.connector.reconnect(conn, &shared.source) {
                Ok(()) => {
                    tracing::debug!(slot = conn.slot(), "Reconnected pooled connection");
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(slot = conn.slot(), error = %e, attempt = failures, "Connection pool: failed to reconnect");
                    metrics::record_connect_failure("reconnect");
                    if policy.is_exhausted(failures) {
                        return Err(PoolError::Unavailable {
                            attempts: failures,
                            source: e,
                        });
                    }
                    policy.pause(failures);
                }
            }
        }
        Ok(())
    }

    /// Visit every slot once and replace idle connections that are down.
    ///
    /// Borrowed slots are left alone. Returns how many were replaced.
    pub fn update_connections(&self) -> usize {
        let shared = &*self.shared;
        let mut queue = shared.lock();
        let mut repaired = 0;

        for _ in 0..queue.len() {
            let Some(mut slot) = queue.slots.pop_front() else {
                break;
            };

            if let SlotState::Idle(conn) = &mut slot.state {
                if !shared.connector.is_connected(conn) {
                    match shared.connector.connect(&shared.source) {
                        Ok(fresh) => {
                            *conn = fresh;
                            repaired += 1;
                        }
                        Err(e) => {
                            tracing::warn!(slot = slot.id, error = %e, "Sweep could not replace dead connection");
                            metrics::record_connect_failure("sweep");
                        }
                    }
                }
            }

            queue.slots.push_back(slot);
        }

        if repaired > 0 {
            tracing::info!(repaired, "Sweep replaced dead connections");
            metrics::record_sweep_repaired(repaired);
        }
        repaired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Connection whose liveness is shared with the test.
    struct TestConn {
        alive: Arc<AtomicBool>,
    }

    #[derive(Default)]
    struct TestConnector {
        attempts: Arc<AtomicUsize>,
        opened: AtomicUsize,
        refuse: AtomicBool,
        handles: Mutex<Vec<Arc<AtomicBool>>>,
    }

    impl Connector for TestConnector {
        type Connection = TestConn;

        fn connect(&self, _source: &DataSource) -> Result<TestConn, ConnectError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.refuse.load(Ordering::SeqCst) {
                return Err(ConnectError::Refused("test".into()));
            }
            self.opened.fetch_add(1, Ordering::SeqCst);
            let alive = Arc::new(AtomicBool::new(true));
            self.handles.lock().unwrap().push(Arc::clone(&alive));
            Ok(TestConn { alive })
        }

        fn is_connected(&self, conn: &TestConn) -> bool {
            conn.alive.load(Ordering::SeqCst)
        }
    }

    fn source() -> DataSource {
        DataSource::new("test-db", "svc", "pw")
    }

    fn pool(size: usize) -> ConnectionPool<TestConnector> {
        let options = PoolOptions::default().size(size).retry(RetryPolicy::immediate());
        ConnectionPool::new(TestConnector::default(), source(), options).unwrap()
    }

    #[test]
    fn test_zero_size_fails_without_connecting() {
        let connector = TestConnector::default();
        let attempts = Arc::clone(&connector.attempts);
        let err = ConnectionPool::with_size(connector, source(), 0).unwrap_err();
        assert!(matches!(err, PoolError::InvalidSize));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_size_is_cpu_count() {
        let p = ConnectionPool::new(TestConnector::default(), source(), PoolOptions::default()).unwrap();
        assert_eq!(p.status().size, num_cpus::get());
    }

    #[test]
    fn test_opens_eagerly() {
        let p = pool(3);
        assert_eq!(p.connector().opened.load(Ordering::SeqCst), 3);
        assert_eq!(p.status(), PoolStatus { size: 3, idle: 3, borrowed: 0 });
    }

    #[test]
    fn test_initial_connect_failure() {
        let connector = TestConnector::default();
        connector.refuse.store(true, Ordering::SeqCst);
        let err = ConnectionPool::with_size(connector, source(), 2).unwrap_err();
        assert!(matches!(err, PoolError::Connect { index: 0, size: 2, .. }));
    }

    #[test]
    fn test_drop_returns_connection() {
        let p = pool(1);
        {
            let _conn = p.get_connection().unwrap();
            assert_eq!(p.status().borrowed, 1);
        }
        assert_eq!(p.status().borrowed, 0);
        let again = p.get_connection().unwrap();
        again.release();
        assert_eq!(p.status(), PoolStatus { size: 1, idle: 1, borrowed: 0 });
    }

    #[test]
    fn test_grows_when_all_borrowed() {
        let p = pool(2);
        let a = p.get_connection().unwrap();
        let b = p.get_connection().unwrap();
        let c = p.get_connection().unwrap();

        assert_eq!(p.status(), PoolStatus { size: 3, idle: 0, borrowed: 3 });
        assert_ne!(a.slot(), b.slot());
        assert_ne!(b.slot(), c.slot());
        assert_ne!(a.slot(), c.slot());
    }

    #[test]
    fn test_borrow_heals_dead_connection() {
        let p = pool(2);
        for handle in p.connector().handles.lock().unwrap().iter() {
            handle.store(false, Ordering::SeqCst);
        }

        let conn = p.get_connection().unwrap();
        assert!(p.connector().is_connected(&conn));
    }

    #[test]
    fn test_bounded_reconnect_reports_unavailable() {
        let options = PoolOptions::default()
            .size(1)
            .retry(RetryPolicy::bounded(3).with_delays(Duration::ZERO, Duration::ZERO));
        let p = ConnectionPool::new(TestConnector::default(), source(), options).unwrap();

        p.connector().handles.lock().unwrap()[0].store(false, Ordering::SeqCst);
        p.connector().refuse.store(true, Ordering::SeqCst);

        let err = p.get_connection().unwrap_err();
        assert!(matches!(err, PoolError::Unavailable { attempts: 3, .. }));
        // The dead handle went back to the pool.
        assert_eq!(p.status(), PoolStatus { size: 1, idle: 1, borrowed: 0 });
    }

    #[test]
    fn test_max_size_times_out() {
        let options = PoolOptions::default()
            .size(1)
            .max_size(1)
            .acquire_timeout(Duration::from_millis(20))
            .retry(RetryPolicy::immediate());
        let p = ConnectionPool::new(TestConnector::default(), source(), options).unwrap();

        let _held = p.get_connection().unwrap();
        let err = p.get_connection().unwrap_err();
        assert!(matches!(err, PoolError::Exhausted { size: 1, .. }));
    }

    #[test]
    fn test_max_size_waits_for_release() {
        let options = PoolOptions::default()
            .size(1)
            .max_size(1)
            .acquire_timeout(Duration::from_secs(5))
            .retry(RetryPolicy::immediate());
        let p = ConnectionPool::new(TestConnector::default(), source(), options).unwrap();

        let held = p.get_connection().unwrap();
        let waiter = {
            let p = p.clone();
            std::thread::spawn(move || p.get_connection().map(|c| c.slot()))
        };
        std::thread::sleep(Duration::from_millis(50));
        let slot = held.slot();
        drop(held);

        assert_eq!(waiter.join().unwrap().unwrap(), slot);
    }

    #[test]
    fn test_invalid_max_size() {
        let options = PoolOptions::default().size(4).max_size(2);
        let err = ConnectionPool::new(TestConnector::default(), source(), options).unwrap_err();
        assert!(matches!(err, PoolError::InvalidMaxSize { size: 4, max: 2 }));
    }

    #[test]
    fn test_sweep_skips_borrowed() {
        let p = pool(2);
        let held = p.get_connection().unwrap();
        held.alive.store(false, Ordering::SeqCst);

        assert_eq!(p.update_connections(), 0);
        assert!(!p.connector().is_connected(&held));
    }
}
