// ============================================================================
// keyseek Library
// ============================================================================
//
// A transactional query-execution engine with keyset-pagination cursors:
// - BorderValueHandle / CombinedBorderValue encode sort-key snapshots as
//   fixed-width string tokens.
// - KeysetAnchor serializes a page descriptor into a compact chat code and
//   parses it back safely.
// - Pagination / DefineOrder turn an anchor into a seek filter plus an
//   ordering clause, and a fetched batch into a KeysetPage with next and
//   previous anchors.
// - QueryExecutor / Transaction run commands against pooled connections,
//   with one-shot and retry-on-serialization-failure modes and
//   savepoint-scoped nested transactions.
//
// ============================================================================

pub mod connection;
pub mod core;
pub mod cursor;
pub mod executor;
pub mod pagination;
pub mod query;
pub mod storage;

// Re-export main types for convenience
pub use crate::core::{DbError, Result, Row, Value};
pub use storage::Database;

// Re-export connection API
pub use connection::{
    Connection,
    config::PoolConfig,
    pool::{ConnectionPool, ConnectionProvider, PoolGuard, PoolStats},
};

pub use cursor::{
    BorderValueHandle, CombinedBorderValue, I64Handle, InstantHandle, KeysetAnchor, UuidHandle,
};
pub use executor::{BackoffPolicy, QueryExecutor, Transaction, TransactionalCommand};
pub use pagination::{DefineOrder, KeysetPage, Pagination, SortedColumn};
pub use query::{Filter, OrderTerm, SelectQuery};

use std::sync::Arc;

// ============================================================================
// High-level Client API
// ============================================================================

/// Database client bundling a connection pool and a query executor.
///
/// This is the recommended entry point for applications.
///
/// # Examples
///
/// ```
/// use keyseek::{Client, PoolConfig, Value};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> keyseek::Result<()> {
/// let client = Client::open(PoolConfig::new())?;
///
/// client
///     .execute(|tx: &mut keyseek::Transaction<'_>| {
///         tx.create_table("users", vec!["id".into(), "name".into()])?;
///         tx.insert("users", vec![Value::Integer(1), Value::from("alice")])
///     })
///     .await?;
///
/// let rows = client
///     .query(|tx: &mut keyseek::Transaction<'_>| {
///         tx.select(&keyseek::SelectQuery::from("users"))
///     })
///     .await?;
/// assert_eq!(rows.len(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Client {
    pool: Arc<ConnectionPool>,
    executor: QueryExecutor<ConnectionPool>,
}

impl Client {
    /// Open a client over a fresh database with the given pool settings.
    pub fn open(config: PoolConfig) -> Result<Self> {
        let pool = Arc::new(ConnectionPool::new(config)?);
        let executor = QueryExecutor::new(Arc::clone(&pool));
        Ok(Self { pool, executor })
    }

    /// Open a client with custom retry backoff.
    pub fn open_with_backoff(config: PoolConfig, backoff: BackoffPolicy) -> Result<Self> {
        let pool = Arc::new(ConnectionPool::new(config)?);
        let executor = QueryExecutor::with_backoff(Arc::clone(&pool), backoff);
        Ok(Self { pool, executor })
    }

    /// The underlying executor, for callers that hold onto it directly.
    pub fn executor(&self) -> &QueryExecutor<ConnectionPool> {
        &self.executor
    }

    /// The underlying pool.
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Run a command once, without retry.
    pub async fn execute<C: TransactionalCommand>(&self, command: C) -> Result<C::Output> {
        self.executor.execute(command).await
    }

    /// Run a command with a retry budget of `attempts` total attempts.
    pub async fn execute_with_retry<C: TransactionalCommand>(
        &self,
        attempts: u32,
        command: C,
    ) -> Result<C::Output> {
        self.executor.execute_with_retry(attempts, command).await
    }

    /// Run a read-only command once.
    pub async fn query<C: TransactionalCommand>(&self, command: C) -> Result<C::Output> {
        self.executor.query(command).await
    }

    /// Run a read-only command with retry.
    pub async fn query_with_retry<C: TransactionalCommand>(
        &self,
        attempts: u32,
        command: C,
    ) -> Result<C::Output> {
        self.executor.query_with_retry(attempts, command).await
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }
}
