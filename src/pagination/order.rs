use crate::core::Value;
use crate::query::OrderTerm;
use std::fmt;

/// One sortable column: its name in the backing table and how to extract its
/// part of the composite key from a border value.
pub struct SortedColumn<T> {
    name: &'static str,
    part: fn(&T) -> Value,
}

impl<T> SortedColumn<T> {
    pub fn new(name: &'static str, part: fn(&T) -> Value) -> Self {
        Self { name, part }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn part_of(&self, border: &T) -> Value {
        (self.part)(border)
    }
}

impl<T> Clone for SortedColumn<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SortedColumn<T> {}

impl<T> fmt::Debug for SortedColumn<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedColumn").field("name", &self.name).finish()
    }
}

/// The sort columns of one query shape, in significance order.
///
/// The sequence is fixed per query shape and determines both the ORDER BY
/// clause and the composite comparison key used by the seek filter.
#[derive(Clone)]
pub struct DefineOrder<T> {
    columns: Vec<SortedColumn<T>>,
}

impl<T> DefineOrder<T> {
    /// # Panics
    ///
    /// Panics if `columns` is empty; a query shape must sort by something.
    pub fn new(columns: Vec<SortedColumn<T>>) -> Self {
        assert!(!columns.is_empty(), "DefineOrder requires at least one column");
        Self { columns }
    }

    pub fn columns(&self) -> &[SortedColumn<T>] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(SortedColumn::name).collect()
    }

    /// The composite key of `border`, one value per column, in order.
    pub fn key_of(&self, border: &T) -> Vec<Value> {
        self.columns.iter().map(|c| c.part_of(border)).collect()
    }

    /// ORDER BY terms over the declared columns, all in one direction.
    pub fn order_terms(&self, descending: bool) -> Vec<OrderTerm> {
        self.columns
            .iter()
            .map(|c| OrderTerm {
                column: c.name(),
                descending,
            })
            .collect()
    }
}

impl<T> fmt::Debug for DefineOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.columns.iter().map(SortedColumn::name))
            .finish()
    }
}
