use super::table::Table;
use crate::core::{DbError, Result, Row, Value};
use crate::query::{Filter, OrderTerm, SelectQuery};
use im::HashMap;
use std::cmp::Ordering;

/// The full database state at one commit version.
///
/// Built on persistent structures, so cloning the whole database is cheap;
/// transaction snapshots and savepoint checkpoints are exactly such clones.
#[derive(Debug, Clone, Default)]
pub struct Database {
    tables: HashMap<String, Table>,
    version: u64,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic commit counter; bumped once per committed write.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn create_table(&mut self, name: &str, columns: Vec<String>) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(DbError::TableExists(name.to_string()));
        }
        self.tables.insert(name.to_string(), Table::new(name, columns));
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    pub fn insert(&mut self, table: &str, row: Row) -> Result<()> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| DbError::TableNotFound(table.to_string()))?
            .insert(row)
    }

    /// Run a SELECT: filter, sort, limit, project.
    pub fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        let table = self.table(query.table())?;

        // Resolve filter columns once, not per row.
        let key_indexes: Vec<usize> = query
            .filter_ref()
            .columns()
            .iter()
            .map(|name| table.column_index(name))
            .collect::<Result<_>>()?;

        let mut rows = Vec::new();
        for row in table.rows() {
            let keep = match query.filter_ref() {
                Filter::True => true,
                filter => {
                    let row_key: Vec<Value> = key_indexes
                        .iter()
                        .map(|&i| row.get(i).cloned().unwrap_or(Value::Null))
                        .collect();
                    filter.matches_key(&row_key)?
                }
            };
            if keep {
                rows.push(row.clone());
            }
        }

        sort_rows(&mut rows, table, query.order())?;

        if let Some(limit) = query.limit_value() {
            rows.truncate(limit);
        }

        if !query.projection().is_empty() {
            let indexes: Vec<usize> = query
                .projection()
                .iter()
                .map(|name| table.column_index(name))
                .collect::<Result<_>>()?;
            rows = rows
                .into_iter()
                .map(|row| indexes.iter().map(|&i| row[i].clone()).collect())
                .collect();
        }

        Ok(rows)
    }
}

/// Stable multi-column sort. NULL ordering follows the SQL standard: NULLS
/// LAST ascending, NULLS FIRST descending (`Value::compare` puts NULL last;
/// the direction reversal takes care of the rest).
fn sort_rows(rows: &mut [Row], table: &Table, terms: &[OrderTerm]) -> Result<()> {
    if rows.is_empty() || terms.is_empty() {
        return Ok(());
    }

    let keys: Vec<(usize, bool)> = terms
        .iter()
        .map(|term| Ok((table.column_index(term.column)?, term.descending)))
        .collect::<Result<_>>()?;

    let mut sort_error: Option<DbError> = None;
    rows.sort_by(|a, b| {
        for &(index, descending) in &keys {
            let left = a.get(index).unwrap_or(&Value::Null);
            let right = b.get(index).unwrap_or(&Value::Null);
            match left.compare(right) {
                Ok(Ordering::Equal) => continue,
                Ok(ordering) => {
                    return if descending {
                        ordering.reverse()
                    } else {
                        ordering
                    };
                }
                Err(error) => {
                    if sort_error.is_none() {
                        sort_error = Some(error);
                    }
                    return Ordering::Equal;
                }
            }
        }
        Ordering::Equal
    });

    match sort_error {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::OrderTerm;

    fn sample_db() -> Database {
        let mut db = Database::new();
        db.create_table("entries", vec!["id".into(), "label".into()])
            .unwrap();
        for (id, label) in [(3, "c"), (1, "a"), (2, "b")] {
            db.insert(
                "entries",
                vec![Value::Integer(id), Value::Text(label.into())],
            )
            .unwrap();
        }
        db
    }

    #[test]
    fn test_select_orders_and_limits() {
        let db = sample_db();
        let rows = db
            .select(
                &SelectQuery::from("entries")
                    .order_by(vec![OrderTerm::asc("id")])
                    .limit(2),
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::Integer(1));
        assert_eq!(rows[1][0], Value::Integer(2));
    }

    #[test]
    fn test_select_seek_filter() {
        let db = sample_db();
        let rows = db
            .select(
                &SelectQuery::from("entries")
                    .filter(Filter::KeyBeyond {
                        columns: vec!["id"],
                        key: vec![Value::Integer(1)],
                        greater: true,
                    })
                    .order_by(vec![OrderTerm::asc("id")]),
            )
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::Integer(2));
    }

    #[test]
    fn test_select_projection() {
        let db = sample_db();
        let rows = db
            .select(
                &SelectQuery::from("entries")
                    .columns(vec!["label"])
                    .order_by(vec![OrderTerm::asc("id")]),
            )
            .unwrap();
        assert_eq!(rows[0], vec![Value::Text("a".into())]);
    }

    #[test]
    fn test_select_missing_table() {
        let db = Database::new();
        assert!(matches!(
            db.select(&SelectQuery::from("nope")),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_create_table_twice() {
        let mut db = sample_db();
        assert!(matches!(
            db.create_table("entries", vec!["id".into()]),
            Err(DbError::TableExists(_))
        ));
    }
}
