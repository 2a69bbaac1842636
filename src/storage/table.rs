use crate::core::{DbError, Result, Row};
use im::Vector;

/// A named, ordered set of columns plus its rows.
///
/// Rows live in a persistent vector, so transaction snapshots and savepoint
/// checkpoints are cheap structural clones.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<String>,
    rows: Vector<Row>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vector::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DbError::ColumnNotFound(column.to_string(), self.name.clone()))
    }

    pub fn insert(&mut self, row: Row) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(DbError::Execution(format!(
                "table '{}' has {} columns, row has {} values",
                self.name,
                self.columns.len(),
                row.len()
            )));
        }
        self.rows.push_back(row);
        Ok(())
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Value;

    #[test]
    fn test_insert_checks_arity() {
        let mut table = Table::new("t", vec!["id".into(), "name".into()]);
        assert!(table
            .insert(vec![Value::Integer(1), Value::Text("a".into())])
            .is_ok());
        assert!(table.insert(vec![Value::Integer(2)]).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_column_index() {
        let table = Table::new("t", vec!["id".into(), "name".into()]);
        assert_eq!(table.column_index("name").unwrap(), 1);
        assert!(matches!(
            table.column_index("missing"),
            Err(DbError::ColumnNotFound(_, _))
        ));
    }
}
