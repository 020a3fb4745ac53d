//! Periodic pool sweep.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::db::{ConnectionPool, Connector};

pub struct PoolSweeper<M: Connector> {
    pool: ConnectionPool<M>,
    interval: Duration,
}

impl<M: Connector> PoolSweeper<M> {
    pub fn new(pool: ConnectionPool<M>, interval: Duration) -> Self {
        Self { pool, interval }
    }

    /// Sweep once per interval until `shutdown` fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Pool sweeper starting");

        let mut ticker = time::interval(self.interval);
        // The first tick completes immediately; the pool was just opened.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Pool sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run a single sweep on the blocking pool. Returns connections repaired.
    pub async fn sweep_once(&self) -> usize {
        let pool = self.pool.clone();
        match tokio::task::spawn_blocking(move || pool.update_connections()).await {
            Ok(repaired) => repaired,
            Err(e) => {
                tracing::error!(error = %e, "Pool sweep task failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::db::{ConnectError, DataSource, PoolOptions};
    use crate::lifecycle::Shutdown;

    struct Conn {
        alive: Arc<AtomicBool>,
    }

    #[derive(Default)]
    struct Flaky {
        opened: AtomicUsize,
        handles: Mutex<Vec<Arc<AtomicBool>>>,
    }

    impl Flaky {
        fn kill(&self, index: usize) {
            self.handles.lock().unwrap()[index].store(false, Ordering::SeqCst);
        }
    }

    impl Connector for Flaky {
        type Connection = Conn;

        fn connect(&self, _source: &DataSource) -> Result<Conn, ConnectError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let alive = Arc::new(AtomicBool::new(true));
            self.handles.lock().unwrap().push(Arc::clone(&alive));
            Ok(Conn { alive })
        }

        fn is_connected(&self, conn: &Conn) -> bool {
            conn.alive.load(Ordering::SeqCst)
        }
    }

    fn pool(size: usize) -> ConnectionPool<Flaky> {
        let source = DataSource::new("sweep-test", "svc", "pw");
        ConnectionPool::new(Flaky::default(), source, PoolOptions::default().size(size)).unwrap()
    }

    #[tokio::test]
    async fn test_sweep_once_replaces_dead_member() {
        let pool = pool(2);
        pool.connector().kill(1);

        let sweeper = PoolSweeper::new(pool.clone(), Duration::from_secs(60));
        assert_eq!(sweeper.sweep_once().await, 1);
        assert_eq!(sweeper.sweep_once().await, 0);
        assert_eq!(pool.connector().opened.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_sweeps_on_tick_and_stops_on_shutdown() {
        let pool = pool(2);
        let shutdown = Shutdown::new();
        let sweeper = PoolSweeper::new(pool.clone(), Duration::from_millis(10));
        let handle = tokio::spawn(sweeper.run(shutdown.subscribe()));

        pool.connector().kill(0);
        let repaired = time::timeout(Duration::from_secs(2), async {
            while pool.connector().opened.load(Ordering::SeqCst) < 3 {
                time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(repaired.is_ok(), "sweeper never replaced the dead connection");

        shutdown.trigger();
        time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("sweeper should exit after shutdown")
            .unwrap();
    }
}
