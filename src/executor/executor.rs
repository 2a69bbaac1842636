use super::retry::{AttemptFailure, BackoffPolicy, classify};
use super::transaction::Transaction;
use crate::connection::pool::ConnectionProvider;
use crate::core::{DbError, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// A unit of work run inside one transaction attempt.
///
/// Any `Fn(&mut Transaction) -> Result<R>` closure implements this. Under
/// [`QueryExecutor::execute_with_retry`] the command may run several times,
/// so it must be safely re-runnable; every attempt starts from a fresh
/// snapshot, so partial work from an aborted attempt is never visible.
///
/// `is_read_only` is an optimization hint: it marks the connection read-only
/// for the attempt, skipping write-lock acquisition the command will not
/// need. Closures report false; implement the trait on a command type to
/// override, or use [`QueryExecutor::query`] to force the hint on.
pub trait TransactionalCommand: Send + Sync {
    type Output: Send;

    fn run(&self, tx: &mut Transaction<'_>) -> Result<Self::Output>;

    fn is_read_only(&self) -> bool {
        false
    }
}

impl<F, R> TransactionalCommand for F
where
    F: Fn(&mut Transaction<'_>) -> Result<R> + Send + Sync,
    R: Send,
{
    type Output = R;

    fn run(&self, tx: &mut Transaction<'_>) -> Result<R> {
        self(tx)
    }
}

/// Runs commands against pooled connections.
///
/// Exactly one connection is held per top-level call, for its entire
/// duration including all retries and nested savepoints; callers await a
/// future and never block their own thread. The provider is passed in
/// explicitly; the executor owns no global state.
pub struct QueryExecutor<P: ConnectionProvider> {
    provider: Arc<P>,
    backoff: BackoffPolicy,
}

impl<P: ConnectionProvider> QueryExecutor<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self::with_backoff(provider, BackoffPolicy::default())
    }

    pub fn with_backoff(provider: Arc<P>, backoff: BackoffPolicy) -> Self {
        Self { provider, backoff }
    }

    /// Run `command` once: fresh connection, begin, commit on success.
    ///
    /// On any failure the transaction is rolled back and the original error
    /// propagated, with a rollback error attached as a secondary cause.
    /// Never retried; reserved for operations known not to conflict under
    /// the isolation level in use.
    pub async fn execute<C: TransactionalCommand>(&self, command: C) -> Result<C::Output> {
        let read_only = command.is_read_only();
        self.run_once(&command, read_only).await
    }

    /// Run `command`, retrying serialization-aborted attempts.
    ///
    /// `attempts` is the total attempt budget (at least 1). One connection
    /// serves the whole operation; a retryable failure rolls back, sleeps a
    /// jittered exponential backoff, and re-runs on the same connection. Any
    /// other failure rolls back and propagates immediately. Exhausting the
    /// budget yields [`DbError::RetryExhausted`] carrying every
    /// serialization failure, most recent first.
    pub async fn execute_with_retry<C: TransactionalCommand>(
        &self,
        attempts: u32,
        command: C,
    ) -> Result<C::Output> {
        let read_only = command.is_read_only();
        self.run_with_retry(attempts, &command, read_only).await
    }

    /// One-shot read: [`execute`](Self::execute) with the read-only hint
    /// forced on.
    pub async fn query<C: TransactionalCommand>(&self, command: C) -> Result<C::Output> {
        self.run_once(&command, true).await
    }

    /// Retrying read: [`execute_with_retry`](Self::execute_with_retry) with
    /// the read-only hint forced on.
    pub async fn query_with_retry<C: TransactionalCommand>(
        &self,
        attempts: u32,
        command: C,
    ) -> Result<C::Output> {
        self.run_with_retry(attempts, &command, true).await
    }

    async fn run_once<C: TransactionalCommand>(
        &self,
        command: &C,
        read_only: bool,
    ) -> Result<C::Output> {
        let mut guard = self.provider.acquire().await?;
        let conn = guard.connection();

        conn.begin(read_only)?;
        let mut tx = Transaction::new(&mut *conn);
        let result = command.run(&mut tx);
        let rolled_back = tx.is_rolled_back();

        match result {
            Ok(output) => {
                if rolled_back {
                    conn.rollback()?;
                } else {
                    conn.commit()?;
                }
                Ok(output)
            }
            Err(error) => match conn.rollback() {
                Ok(()) => Err(error),
                Err(rollback) => Err(DbError::RollbackFailed {
                    source: Box::new(error),
                    rollback: Box::new(rollback),
                }),
            },
        }
    }

    async fn run_with_retry<C: TransactionalCommand>(
        &self,
        attempts: u32,
        command: &C,
        read_only: bool,
    ) -> Result<C::Output> {
        if attempts == 0 {
            return Err(DbError::Execution(
                "Retry budget must allow at least one attempt".into(),
            ));
        }

        let mut guard = self.provider.acquire().await?;
        let conn = guard.connection();
        let mut failures: Vec<DbError> = Vec::new();

        for attempt in 1..=attempts {
            if attempt > 1 {
                let delay = self.backoff.delay(attempt - 1);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "retrying after serialization failure"
                );
                tokio::time::sleep(delay).await;
            }

            conn.begin(read_only)?;
            let mut tx = Transaction::new(&mut *conn);
            let result = command.run(&mut tx);
            let rolled_back = tx.is_rolled_back();

            let failure = match result {
                Ok(output) => {
                    if rolled_back {
                        conn.rollback()?;
                        note_contention(attempt, attempts);
                        return Ok(output);
                    }
                    match conn.commit() {
                        Ok(()) => {
                            note_contention(attempt, attempts);
                            return Ok(output);
                        }
                        Err(error) => classify(error),
                    }
                }
                Err(error) => classify(error),
            };

            match failure {
                AttemptFailure::Retryable(cause) => {
                    conn.rollback()?;
                    failures.insert(0, cause);
                }
                AttemptFailure::Fatal(error) => {
                    return match conn.rollback() {
                        Ok(()) => Err(error),
                        Err(rollback) => Err(DbError::RollbackFailed {
                            source: Box::new(error),
                            rollback: Box::new(rollback),
                        }),
                    };
                }
            }
        }

        warn!(attempts, "retry budget exhausted");
        Err(DbError::RetryExhausted {
            attempts,
            causes: failures,
        })
    }
}

/// Contention worth tuning shows up as operations that regularly eat most of
/// their retry budget before succeeding.
fn note_contention(used: u32, budget: u32) {
    if used > 1 && used > budget / 2 {
        warn!(
            used,
            budget, "operation consumed more than half its retry budget"
        );
    }
}
