use super::{Connection, config::PoolConfig};
use crate::core::{DbError, Result};
use crate::storage::Database;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Hands one pooled connection to each top-level executor call.
///
/// The provider is an explicit constructor dependency of the executor, never
/// a global; substituting it is how tests inject pool behavior.
#[async_trait]
pub trait ConnectionProvider: Send + Sync {
    async fn acquire(&self) -> Result<PoolGuard>;
}

/// Connection pool
///
/// Manages a bounded set of database connections. One connection serves one
/// top-level operation at a time; concurrent operations never share one.
pub struct ConnectionPool {
    config: PoolConfig,
    inner: Arc<PoolInner>,
    db: Arc<RwLock<Database>>,
}

struct PoolInner {
    /// Available connections
    available: Mutex<VecDeque<PooledConnection>>,
    /// Total number of connections created
    total_connections: AtomicUsize,
    /// Next connection ID
    next_id: AtomicU64,
}

/// A connection from the pool
struct PooledConnection {
    connection: Connection,
    created_at: Instant,
    last_used: Instant,
}

impl PooledConnection {
    fn new(connection: Connection) -> Self {
        let now = Instant::now();
        Self {
            connection,
            created_at: now,
            last_used: now,
        }
    }

    fn is_expired(&self, max_lifetime: Option<Duration>) -> bool {
        max_lifetime.is_some_and(|lifetime| self.created_at.elapsed() > lifetime)
    }

    fn is_idle_too_long(&self, idle_timeout: Option<Duration>) -> bool {
        idle_timeout.is_some_and(|timeout| self.last_used.elapsed() > timeout)
    }

    fn refresh_last_used(&mut self) {
        self.last_used = Instant::now();
    }
}

impl ConnectionPool {
    /// Create a pool over a fresh, empty database.
    pub fn new(config: PoolConfig) -> Result<Self> {
        Self::with_database(config, Arc::new(RwLock::new(Database::new())))
    }

    /// Create a pool over a specific database instance.
    ///
    /// Lets several pools (or a test harness) share one database.
    pub fn with_database(config: PoolConfig, db: Arc<RwLock<Database>>) -> Result<Self> {
        config.validate().map_err(DbError::Pool)?;

        let pool = Self {
            config,
            inner: Arc::new(PoolInner {
                available: Mutex::new(VecDeque::new()),
                total_connections: AtomicUsize::new(0),
                next_id: AtomicU64::new(1),
            }),
            db,
        };

        pool.ensure_min_connections()?;
        Ok(pool)
    }

    /// Get a connection from the pool, waiting up to the configured timeout.
    pub async fn get_connection(&self) -> Result<PoolGuard> {
        let start = Instant::now();

        loop {
            // Try to get an available connection
            if let Some(mut pooled) = self.try_get_available()? {
                pooled.refresh_last_used();
                return Ok(PoolGuard {
                    connection: Some(pooled.connection),
                    inner: Arc::clone(&self.inner),
                });
            }

            // Try to create a new connection if under limit
            if let Some(connection) = self.try_create_connection() {
                return Ok(PoolGuard {
                    connection: Some(connection),
                    inner: Arc::clone(&self.inner),
                });
            }

            if start.elapsed() > self.config.connect_timeout {
                return Err(DbError::Pool(
                    "Connection pool timeout: no connections available".into(),
                ));
            }

            // Wait a bit before retrying
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Take an available connection, discarding expired ones on the way.
    fn try_get_available(&self) -> Result<Option<PooledConnection>> {
        let mut available = self.inner.available.lock()?;

        let mut kept = VecDeque::with_capacity(available.len());
        let mut removed = 0usize;
        while let Some(pooled) = available.pop_front() {
            if pooled.is_expired(self.config.max_lifetime)
                || pooled.is_idle_too_long(self.config.idle_timeout)
            {
                removed += 1;
            } else {
                kept.push_back(pooled);
            }
        }
        *available = kept;

        if removed > 0 {
            self.inner
                .total_connections
                .fetch_sub(removed, Ordering::SeqCst);
            debug!(removed, "expired pooled connections discarded");
        }

        Ok(available.pop_front())
    }

    fn try_create_connection(&self) -> Option<Connection> {
        let total = self.inner.total_connections.load(Ordering::SeqCst);
        if total >= self.config.max_connections {
            return None;
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.total_connections.fetch_add(1, Ordering::SeqCst);
        debug!(id, "pooled connection created");

        Some(Connection::new(id, Arc::clone(&self.db)))
    }

    fn ensure_min_connections(&self) -> Result<()> {
        let mut available = self.inner.available.lock()?;

        while self.inner.total_connections.load(Ordering::SeqCst) < self.config.min_connections {
            let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
            let connection = Connection::new(id, Arc::clone(&self.db));
            available.push_back(PooledConnection::new(connection));
            self.inner.total_connections.fetch_add(1, Ordering::SeqCst);
        }

        Ok(())
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let available = self
            .inner
            .available
            .lock()
            .map(|queue| queue.len())
            .unwrap_or(0);
        let total = self.inner.total_connections.load(Ordering::SeqCst);

        PoolStats {
            total_connections: total,
            available_connections: available,
            active_connections: total.saturating_sub(available),
            max_connections: self.config.max_connections,
        }
    }

    /// The shared database behind this pool.
    pub fn database(&self) -> &Arc<RwLock<Database>> {
        &self.db
    }
}

#[async_trait]
impl ConnectionProvider for ConnectionPool {
    async fn acquire(&self) -> Result<PoolGuard> {
        self.get_connection().await
    }
}

/// Connection pool statistics
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub total_connections: usize,
    pub available_connections: usize,
    pub active_connections: usize,
    pub max_connections: usize,
}

impl std::fmt::Display for PoolStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pool Stats: {}/{} active, {} available, max {}",
            self.active_connections,
            self.total_connections,
            self.available_connections,
            self.max_connections
        )
    }
}

/// RAII guard for pooled connections
///
/// Returns the connection to the pool when dropped, rolling back any
/// transaction that was left open.
pub struct PoolGuard {
    connection: Option<Connection>,
    inner: Arc<PoolInner>,
}

impl PoolGuard {
    /// The held connection.
    pub fn connection(&mut self) -> &mut Connection {
        self.connection
            .as_mut()
            .expect("Connection already returned to pool")
    }
}

impl Drop for PoolGuard {
    fn drop(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if connection.is_in_transaction() {
                debug!(
                    id = connection.id(),
                    "guard dropped with open transaction; rolling back"
                );
                let _ = connection.rollback();
            }

            match self.inner.available.lock() {
                Ok(mut available) => available.push_back(PooledConnection::new(connection)),
                Err(_) => {
                    // Poisoned pool; drop the connection instead of returning it.
                    self.inner.total_connections.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }
    }
}
