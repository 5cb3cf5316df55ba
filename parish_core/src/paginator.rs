use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use tracing::trace;

use crate::pagination::{PageSize, Pagination, PaginationHandler};

/// Owns the page state of one table.
///
/// The page number always belongs to a particular view of the data, the
/// filter plus page size, identified by a fingerprint. Observing a different
/// view resets the page to 1 and paginating clamps it into range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    page_size: PageSize,
    fingerprint: Option<u64>,
}

/// The visible slice of a list plus the control describing it.
#[derive(Debug)]
pub struct PageSlice<'a, T> {
    pub items: &'a [T],
    pub control: Pagination,
}

impl Paginator {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page: 1,
            page_size,
            fingerprint: None,
        }
    }

    /// Restores state handed back by a client, e.g. from query parameters.
    pub fn resume(page: Option<usize>, page_size: PageSize, fingerprint: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size,
            fingerprint,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn fingerprint(&self) -> Option<u64> {
        self.fingerprint
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: PageSize) {
        if page_size != self.page_size {
            self.page_size = page_size;
            self.page = 1;
        }
    }

    /// Records the filter the current page belongs to. A filter (or page size)
    /// different from the last observed one sends the view back to page 1.
    pub fn observe<F: Hash + ?Sized>(&mut self, filter: &F) {
        let mut hasher = DefaultHasher::new();
        filter.hash(&mut hasher);
        self.page_size.hash(&mut hasher);
        let fingerprint = hasher.finish();
        if let Some(previous) = self.fingerprint
            && previous != fingerprint
        {
            trace!("view changed, resetting page {} to 1", self.page);
            self.page = 1;
        }
        self.fingerprint = Some(fingerprint);
    }

    pub fn paginate<'a, T>(&mut self, items: &'a [T]) -> PageSlice<'a, T> {
        let per_page = self.page_size.get();
        let total_pages = items.len().div_ceil(per_page).max(1);
        if self.page > total_pages {
            trace!("clamping page {} to {}", self.page, total_pages);
            self.page = total_pages;
        }
        let start = ((self.page - 1) * per_page).min(items.len());
        let end = (start + per_page).min(items.len());
        PageSlice {
            items: &items[start..end],
            control: Pagination::new(self.page, items.len(), self.page_size.non_zero()),
        }
    }
}

impl PaginationHandler for Paginator {
    fn on_page_change(&mut self, page: usize) {
        self.set_page(page);
    }

    fn on_items_per_page_change(&mut self, size: usize) {
        if let Ok(size) = PageSize::try_from(size) {
            self.set_page_size(size);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::pagination::Control;

    fn items(n: usize) -> Vec<usize> {
        (1..=n).collect()
    }

    #[test]
    fn test_paginate_slices_current_page() {
        let data = items(23);
        let mut paginator = Paginator::resume(Some(3), PageSize::Ten, None);
        let slice = paginator.paginate(&data);
        assert_eq!(slice.items, &[21, 22, 23]);
        assert_eq!(slice.control.range_text(), "Showing 21 to 23 of 23 entries");
    }

    #[test]
    fn test_paginate_clamps_after_shrink() {
        let mut paginator = Paginator::resume(Some(3), PageSize::Ten, None);
        let data = items(12);
        let slice = paginator.paginate(&data);
        assert_eq!(slice.items, &[11, 12]);
        assert_eq!(slice.control.current_page(), 2);
        assert_eq!(paginator.page(), 2);
    }

    #[test]
    fn test_paginate_empty_list() {
        let mut paginator = Paginator::resume(Some(4), PageSize::Ten, None);
        let data: Vec<usize> = vec![];
        let slice = paginator.paginate(&data);
        assert!(slice.items.is_empty());
        assert_eq!(slice.control.range_text(), "Showing 0 to 0 of 0 entries");
        assert_eq!(paginator.page(), 1);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let mut paginator = Paginator::new(PageSize::Ten);
        paginator.observe("baptism");
        paginator.set_page(4);
        paginator.observe("baptism");
        assert_eq!(paginator.page(), 4);
        paginator.observe("marriage");
        assert_eq!(paginator.page(), 1);
    }

    #[test]
    fn test_resumed_fingerprint_survives_same_filter() {
        let mut first = Paginator::new(PageSize::TwentyFive);
        first.observe(&("smith", Some("active")));

        let mut next = Paginator::resume(Some(3), PageSize::TwentyFive, first.fingerprint());
        next.observe(&("smith", Some("active")));
        assert_eq!(next.page(), 3);
    }

    #[test]
    fn test_resumed_with_new_page_size_resets() {
        let mut first = Paginator::new(PageSize::Ten);
        first.observe("");

        let mut next = Paginator::resume(Some(3), PageSize::Fifty, first.fingerprint());
        next.observe("");
        assert_eq!(next.page(), 1);
    }

    #[test]
    fn test_page_size_change_resets() {
        let mut paginator = Paginator::resume(Some(5), PageSize::Ten, None);
        paginator.set_page_size(PageSize::Ten);
        assert_eq!(paginator.page(), 5);
        paginator.set_page_size(PageSize::Hundred);
        assert_eq!(paginator.page(), 1);
    }

    #[test]
    fn test_control_dispatches_into_paginator() {
        let data = items(100);
        let mut paginator = Paginator::new(PageSize::Ten);
        let control = paginator.paginate(&data).control;
        control.dispatch(Control::Next, &mut paginator);
        assert_eq!(paginator.page(), 2);

        let control = paginator.paginate(&data).control;
        control.dispatch(Control::PageSize(PageSize::TwentyFive), &mut paginator);
        assert_eq!(paginator.page(), 1);
        assert_eq!(paginator.page_size(), PageSize::TwentyFive);
    }
}
