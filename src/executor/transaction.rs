use crate::connection::Connection;
use crate::core::{DbError, Result, Row};
use crate::query::SelectQuery;

/// The scope of one executor attempt, bound to the operation's single
/// connection for its whole duration.
///
/// Statements go through this handle. Nested savepoint scopes are owned by
/// their parent and cannot outlive it; each is released or rolled back on
/// every exit path.
pub struct Transaction<'c> {
    conn: &'c mut Connection,
    rolled_back: bool,
}

impl<'c> Transaction<'c> {
    pub(crate) fn new(conn: &'c mut Connection) -> Self {
        Self {
            conn,
            rolled_back: false,
        }
    }

    pub fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        self.conn.select(query)
    }

    pub fn insert(&mut self, table: &str, row: Row) -> Result<()> {
        self.conn.insert(table, row)
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> Result<()> {
        self.conn.create_table(name, columns)
    }

    /// Mark this scope rolled back.
    ///
    /// The executor (or the enclosing scope, for a nested transaction) then
    /// reverts instead of committing (or releasing the savepoint).
    pub fn rollback(&mut self) {
        self.rolled_back = true;
    }

    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    /// Run `f` inside a savepoint scope.
    ///
    /// If the nested scope finishes without rolling back, the savepoint is
    /// released and its changes stay in the parent transaction. If it fails
    /// or calls [`rollback`](Self::rollback), state reverts to the savepoint
    /// only: statements issued before the savepoint are untouched, and the
    /// parent can still commit. The read-only property is fixed at `begin`
    /// and cannot change here.
    pub fn execute_nested<R>(
        &mut self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<R>,
    ) -> Result<R> {
        let savepoint = self.conn.savepoint()?;

        let mut nested = Transaction::new(&mut *self.conn);
        let result = f(&mut nested);
        let rolled_back = nested.rolled_back;

        match (result, rolled_back) {
            (Ok(value), false) => {
                self.conn.release_savepoint(savepoint)?;
                Ok(value)
            }
            (Ok(value), true) => {
                self.conn.rollback_to_savepoint(savepoint)?;
                Ok(value)
            }
            (Err(error), _) => match self.conn.rollback_to_savepoint(savepoint) {
                Ok(()) => Err(error),
                Err(rollback) => Err(DbError::RollbackFailed {
                    source: Box::new(error),
                    rollback: Box::new(rollback),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;
    use crate::storage::Database;
    use std::sync::{Arc, RwLock};

    fn open_transaction() -> Connection {
        let db = Arc::new(RwLock::new(Database::new()));
        let mut conn = Connection::new(1, db);
        conn.create_table("t", vec!["id".into()]).unwrap();
        conn.begin(false).unwrap();
        conn
    }

    fn ids(tx: &Transaction<'_>) -> Vec<i64> {
        tx.select(&SelectQuery::from("t"))
            .unwrap()
            .iter()
            .map(|row| row[0].as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_nested_success_retains_changes() {
        let mut conn = open_transaction();
        let mut tx = Transaction::new(&mut conn);

        tx.insert("t", vec![Value::Integer(1)]).unwrap();
        tx.execute_nested(|nested| nested.insert("t", vec![Value::Integer(2)]))
            .unwrap();

        assert_eq!(ids(&tx), vec![1, 2]);
    }

    #[test]
    fn test_nested_explicit_rollback_reverts_to_savepoint() {
        let mut conn = open_transaction();
        let mut tx = Transaction::new(&mut conn);

        tx.insert("t", vec![Value::Integer(1)]).unwrap();
        let result: Result<()> = tx.execute_nested(|nested| {
            nested.insert("t", vec![Value::Integer(2)])?;
            nested.rollback();
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(ids(&tx), vec![1]);
        assert!(!tx.is_rolled_back());
    }

    #[test]
    fn test_nested_error_reverts_to_savepoint() {
        let mut conn = open_transaction();
        let mut tx = Transaction::new(&mut conn);

        tx.insert("t", vec![Value::Integer(1)]).unwrap();
        let result: Result<()> = tx.execute_nested(|nested| {
            nested.insert("t", vec![Value::Integer(2)])?;
            Err(DbError::Execution("nested failure".into()))
        });

        assert!(result.is_err());
        assert_eq!(ids(&tx), vec![1]);
    }

    #[test]
    fn test_deeply_nested_scopes() {
        let mut conn = open_transaction();
        let mut tx = Transaction::new(&mut conn);

        tx.insert("t", vec![Value::Integer(1)]).unwrap();
        tx.execute_nested(|outer| {
            outer.insert("t", vec![Value::Integer(2)])?;
            let _: Result<()> = outer.execute_nested(|inner| {
                inner.insert("t", vec![Value::Integer(3)])?;
                inner.rollback();
                Ok(())
            });
            Ok(())
        })
        .unwrap();

        // The inner scope rolled back alone; the outer one kept its insert.
        assert_eq!(ids(&tx), vec![1, 2]);
    }
}
