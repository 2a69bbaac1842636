use crate::cursor::KeysetAnchor;

/// One fetched page plus the anchors leading away from it.
///
/// Derived from a fetched batch, never stored. `data` is in nominal display
/// order regardless of scroll direction.
#[derive(Debug, Clone)]
pub struct KeysetPage<D, T> {
    data: Vec<D>,
    next: Option<KeysetAnchor<T>>,
    last: Option<KeysetAnchor<T>>,
}

impl<D, T> KeysetPage<D, T> {
    /// Assemble a page from `rows` already in display order.
    ///
    /// The next-page anchor exists only for a full batch (a short batch means
    /// the table ran out). The previous-page anchor exists for any page past
    /// the first, borrowing the first row's border value.
    pub(crate) fn build(
        page: u32,
        rows: Vec<D>,
        page_size: usize,
        border_of: impl Fn(&D) -> T,
    ) -> Self {
        let next = if rows.len() < page_size {
            None
        } else {
            rows.last()
                .map(|row| KeysetAnchor::at(page + 1, border_of(row), true))
        };
        let last = if page <= 1 {
            None
        } else {
            rows.first()
                .map(|row| KeysetAnchor::at(page - 1, border_of(row), false))
        };
        Self {
            data: rows,
            next,
            last,
        }
    }

    /// The page's rows, at most one page size worth, in display order.
    pub fn data(&self) -> &[D] {
        &self.data
    }

    pub fn into_data(self) -> Vec<D> {
        self.data
    }

    /// Anchor fetching the page after this one, if there is one.
    pub fn next_page_anchor(&self) -> Option<&KeysetAnchor<T>> {
        self.next.as_ref()
    }

    /// Anchor fetching the page before this one, absent on page 1.
    pub fn last_page_anchor(&self) -> Option<&KeysetAnchor<T>> {
        self.last.as_ref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn border(row: &i64) -> i64 {
        *row
    }

    #[test]
    fn test_full_first_page() {
        let page = KeysetPage::build(1, vec![1i64, 2, 3, 4, 5], 5, border);
        assert_eq!(
            page.next_page_anchor(),
            Some(&KeysetAnchor::at(2, 5, true))
        );
        assert_eq!(page.last_page_anchor(), None);
    }

    #[test]
    fn test_short_batch_has_no_next() {
        let page = KeysetPage::build(3, vec![11i64, 12], 5, border);
        assert_eq!(page.next_page_anchor(), None);
        assert_eq!(
            page.last_page_anchor(),
            Some(&KeysetAnchor::at(2, 11, false))
        );
    }

    #[test]
    fn test_empty_batch() {
        let page = KeysetPage::<i64, i64>::build(1, Vec::new(), 5, border);
        assert!(page.is_empty());
        assert_eq!(page.next_page_anchor(), None);
        assert_eq!(page.last_page_anchor(), None);
    }

    #[test]
    fn test_empty_batch_past_first_page() {
        // A stale anchor can point past the end of the table; no rows means
        // no border value to anchor backward from either.
        let page = KeysetPage::<i64, i64>::build(4, Vec::new(), 5, border);
        assert_eq!(page.next_page_anchor(), None);
        assert_eq!(page.last_page_anchor(), None);
    }
}
