use crate::core::{Result, Value};
use crate::pagination::Pagination;
use std::cmp::Ordering;
use std::fmt;

/// One ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTerm {
    pub column: &'static str,
    pub descending: bool,
}

impl OrderTerm {
    pub fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

impl fmt::Display for OrderTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.column,
            if self.descending { "DESC" } else { "ASC" }
        )
    }
}

/// A WHERE predicate the engine can evaluate and `to_sql` can render.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// No filtering.
    True,
    /// The row's composite key, read from `columns` in order, lies strictly
    /// beyond `key`: greater when `greater` is set, less otherwise.
    KeyBeyond {
        columns: Vec<&'static str>,
        key: Vec<Value>,
        greater: bool,
    },
}

impl Filter {
    /// Columns the filter reads, in comparison order.
    pub fn columns(&self) -> &[&'static str] {
        match self {
            Filter::True => &[],
            Filter::KeyBeyond { columns, .. } => columns,
        }
    }

    /// Evaluate against a row key extracted in the same column order.
    pub fn matches_key(&self, row_key: &[Value]) -> Result<bool> {
        match self {
            Filter::True => Ok(true),
            Filter::KeyBeyond { key, greater, .. } => {
                let mut ordering = Ordering::Equal;
                for (row_part, key_part) in row_key.iter().zip(key) {
                    ordering = row_part.compare(key_part)?;
                    if ordering != Ordering::Equal {
                        break;
                    }
                }
                Ok(if *greater {
                    ordering == Ordering::Greater
                } else {
                    ordering == Ordering::Less
                })
            }
        }
    }

    /// Render as SQL text, expanded into the portable OR/AND form rather
    /// than a row-value constructor:
    /// `(a > v1) OR (a = v1 AND b > v2) OR ...`
    pub fn to_sql(&self) -> String {
        match self {
            Filter::True => "TRUE".to_string(),
            Filter::KeyBeyond {
                columns,
                key,
                greater,
            } => {
                let op = if *greater { '>' } else { '<' };
                let alternatives: Vec<String> = (0..columns.len())
                    .map(|i| {
                        let mut conjuncts: Vec<String> = (0..i)
                            .map(|j| format!("{} = {}", columns[j], key[j]))
                            .collect();
                        conjuncts.push(format!("{} {} {}", columns[i], op, key[i]));
                        format!("({})", conjuncts.join(" AND "))
                    })
                    .collect();
                alternatives.join(" OR ")
            }
        }
    }
}

/// A fluent SELECT description.
///
/// The in-memory engine consumes it directly; `to_sql` renders the same
/// query as text for logging or for handing to an external SQL builder.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    projection: Vec<&'static str>,
    filter: Filter,
    order: Vec<OrderTerm>,
    limit: Option<usize>,
}

impl SelectQuery {
    /// Start a query over `table`, selecting all columns.
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            projection: Vec::new(),
            filter: Filter::True,
            order: Vec::new(),
            limit: None,
        }
    }

    /// Restrict the selected columns. Empty means all columns.
    pub fn columns(mut self, columns: Vec<&'static str>) -> Self {
        self.projection = columns;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn order_by(mut self, order: Vec<OrderTerm>) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Augment with a pagination's seek filter, ordering, and page-size
    /// limit in one step.
    pub fn paginated<T: Clone>(self, pagination: &Pagination<T>, page_size: usize) -> Self {
        self.filter(pagination.seeking())
            .order_by(pagination.order())
            .limit(page_size)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn projection(&self) -> &[&'static str] {
        &self.projection
    }

    pub fn filter_ref(&self) -> &Filter {
        &self.filter
    }

    pub fn order(&self) -> &[OrderTerm] {
        &self.order
    }

    pub fn limit_value(&self) -> Option<usize> {
        self.limit
    }

    /// Render the query as SQL text.
    pub fn to_sql(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.projection.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.projection.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);
        if self.filter != Filter::True {
            sql.push_str(" WHERE ");
            sql.push_str(&self.filter.to_sql());
        }
        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            let terms: Vec<String> = self.order.iter().map(OrderTerm::to_string).collect();
            sql.push_str(&terms.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }
}
