pub mod config;
pub mod pool;

use crate::core::{DbError, Result, Row};
use crate::query::SelectQuery;
use crate::storage::Database;
use std::sync::{Arc, RwLock};

/// A session against the shared database.
///
/// Holds at most one open transaction: a snapshot working copy, a savepoint
/// checkpoint stack, and the read-only flag fixed at `begin`. Commit applies
/// the working copy only if no other writer committed since the snapshot was
/// taken (first-committer-wins); otherwise the transaction aborts with
/// SQLSTATE 40001 and the operation should be retried.
pub struct Connection {
    id: u64,
    db: Arc<RwLock<Database>>,
    tx: Option<TxState>,
}

struct TxState {
    base_version: u64,
    working: Database,
    savepoints: Vec<Database>,
    read_only: bool,
    dirty: bool,
}

impl Connection {
    pub(crate) fn new(id: u64, db: Arc<RwLock<Database>>) -> Self {
        Self { id, db, tx: None }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Start a transaction by snapshotting the current database state.
    ///
    /// The read-only flag is a whole-transaction property; nested savepoint
    /// scopes cannot change it.
    pub fn begin(&mut self, read_only: bool) -> Result<()> {
        if self.tx.is_some() {
            return Err(DbError::Execution("Transaction already active".into()));
        }
        let snapshot = self.db.read()?.clone();
        self.tx = Some(TxState {
            base_version: snapshot.version(),
            working: snapshot,
            savepoints: Vec::new(),
            read_only,
            dirty: false,
        });
        Ok(())
    }

    /// Commit the open transaction.
    ///
    /// A read-only or untouched transaction commits vacuously. A dirty one
    /// replaces the shared state, unless another writer committed first; the
    /// transaction is then aborted with a serialization failure.
    pub fn commit(&mut self) -> Result<()> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| DbError::Execution("No active transaction".into()))?;

        if !tx.dirty {
            return Ok(());
        }

        let mut db = self.db.write()?;
        if db.version() != tx.base_version {
            return Err(DbError::serialization(format!(
                "write-write conflict: snapshot at version {}, database at version {}",
                tx.base_version,
                db.version()
            )));
        }
        let mut working = tx.working;
        working.bump_version();
        *db = working;
        Ok(())
    }

    /// Discard the open transaction. A no-op without one, so failure paths
    /// can always call it.
    pub fn rollback(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }

    /// Checkpoint the working state; returns a token for the new savepoint.
    pub fn savepoint(&mut self) -> Result<usize> {
        let tx = self.require_tx()?;
        tx.savepoints.push(tx.working.clone());
        Ok(tx.savepoints.len() - 1)
    }

    /// Release a savepoint, keeping all changes made since it.
    pub fn release_savepoint(&mut self, savepoint: usize) -> Result<()> {
        let tx = self.require_tx()?;
        if savepoint >= tx.savepoints.len() {
            return Err(DbError::Execution(format!(
                "Savepoint {savepoint} is not active"
            )));
        }
        tx.savepoints.truncate(savepoint);
        Ok(())
    }

    /// Revert the working state to a savepoint, discarding it and everything
    /// nested above it. Statements before the savepoint are untouched.
    pub fn rollback_to_savepoint(&mut self, savepoint: usize) -> Result<()> {
        let tx = self.require_tx()?;
        if savepoint >= tx.savepoints.len() {
            return Err(DbError::Execution(format!(
                "Savepoint {savepoint} is not active"
            )));
        }
        tx.working = tx.savepoints[savepoint].clone();
        tx.savepoints.truncate(savepoint);
        Ok(())
    }

    /// Run a SELECT against the transaction's snapshot, or against the
    /// current state when no transaction is open.
    pub fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        match &self.tx {
            Some(tx) => tx.working.select(query),
            None => self.db.read()?.select(query),
        }
    }

    pub fn insert(&mut self, table: &str, row: Row) -> Result<()> {
        match &mut self.tx {
            Some(tx) => {
                if tx.read_only {
                    return Err(DbError::read_only("INSERT in a read-only transaction"));
                }
                tx.working.insert(table, row)?;
                tx.dirty = true;
                Ok(())
            }
            None => {
                // Auto-commit single statement.
                let mut db = self.db.write()?;
                db.insert(table, row)?;
                db.bump_version();
                Ok(())
            }
        }
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> Result<()> {
        match &mut self.tx {
            Some(tx) => {
                if tx.read_only {
                    return Err(DbError::read_only(
                        "CREATE TABLE in a read-only transaction",
                    ));
                }
                tx.working.create_table(name, columns)?;
                tx.dirty = true;
                Ok(())
            }
            None => {
                let mut db = self.db.write()?;
                db.create_table(name, columns)?;
                db.bump_version();
                Ok(())
            }
        }
    }

    fn require_tx(&mut self) -> Result<&mut TxState> {
        self.tx
            .as_mut()
            .ok_or_else(|| DbError::Execution("No active transaction".into()))
    }
}
