// ============================================================================
// Keyset Pagination Module
// ============================================================================
//
// Keyset (seek) pagination filters on the last-seen row's sort key instead
// of an offset, so pages stay stable while the table is concurrently
// mutated. An anchor plus the declared sort columns becomes a seek filter
// and an ordering clause; a fetched batch becomes a page with anchors to its
// neighbours.
//
// ============================================================================

pub mod order;
pub mod page;

pub use order::{DefineOrder, SortedColumn};
pub use page::KeysetPage;

use crate::cursor::KeysetAnchor;
use crate::query::{Filter, OrderTerm};

/// Pagination state for one query shape: the current anchor, the table's
/// nominal sort direction, and the declared sort columns.
///
/// Pure and stateless beyond its fields; freely shared across threads.
#[derive(Debug, Clone)]
pub struct Pagination<T> {
    anchor: KeysetAnchor<T>,
    ascending: bool,
    order: DefineOrder<T>,
}

impl<T: Clone> Pagination<T> {
    pub fn new(anchor: KeysetAnchor<T>, ascending: bool, order: DefineOrder<T>) -> Self {
        Self {
            anchor,
            ascending,
            order,
        }
    }

    pub fn anchor(&self) -> &KeysetAnchor<T> {
        &self.anchor
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    /// An equivalent pagination with a different anchor; direction and
    /// declared order are unchanged.
    pub fn with_anchor(&self, anchor: KeysetAnchor<T>) -> Self {
        Self {
            anchor,
            ascending: self.ascending,
            order: self.order.clone(),
        }
    }

    /// The seek filter: rows whose composite key lies strictly beyond the
    /// anchor's border value. `Filter::True` when no anchor is set.
    ///
    /// "Beyond" is greater when scroll direction agrees with the nominal
    /// sort direction, less when scrolling backward temporarily inverts the
    /// comparison so the nearest preceding rows come back under a LIMIT.
    pub fn seeking(&self) -> Filter {
        match &self.anchor {
            KeysetAnchor::Unset => Filter::True,
            KeysetAnchor::At {
                border, forward, ..
            } => Filter::KeyBeyond {
                columns: self.order.column_names(),
                key: self.order.key_of(border),
                greater: self.ascending == *forward,
            },
        }
    }

    /// ORDER BY terms for the fetch.
    ///
    /// Scrolling backward inverts the nominal direction; the batch is put
    /// back into display order by [`page_from_rows`](Self::page_from_rows).
    pub fn order(&self) -> Vec<OrderTerm> {
        self.order.order_terms(self.fetch_descending())
    }

    fn fetch_descending(&self) -> bool {
        if self.anchor.forward() {
            !self.ascending
        } else {
            self.ascending
        }
    }

    /// Assemble a fetched batch into a page with next/previous anchors.
    ///
    /// `rows` must be exactly what the query returned, in fetch order; the
    /// backward-scroll reversal happens here, before anchor construction.
    pub fn page_from_rows<D>(
        &self,
        mut rows: Vec<D>,
        page_size: usize,
        border_of: impl Fn(&D) -> T,
    ) -> KeysetPage<D, T> {
        if !self.anchor.forward() {
            rows.reverse();
        }
        KeysetPage::build(self.anchor.page(), rows, page_size, border_of)
    }
}
