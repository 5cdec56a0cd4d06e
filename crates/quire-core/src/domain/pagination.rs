//! Page-based pagination.

use serde::Serialize;

pub const MIN_PER_PAGE: u64 = 10;
pub const MAX_PER_PAGE: u64 = 20;
pub const DEFAULT_PER_PAGE: u64 = 20;
/// Highest page number accepted. Keeps `offset` inside a SQL `BIGINT`.
pub const MAX_PAGE: u64 = i64::MAX as u64 / MAX_PER_PAGE;

/// A 1-based page request. Construct with [`PageRequest::new`] to get the bounds applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
            per_page: per_page.clamp(MIN_PER_PAGE, MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PER_PAGE)
    }
}

/// One page of results plus the totals needed to render navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
        }
    }

    /// Last page number; an empty result still has page 1.
    pub fn last_page(&self) -> u64 {
        self.total.div_ceil(self.per_page).max(1)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.last_page()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_bounds() {
        assert_eq!(PageRequest::new(0, 5), PageRequest { page: 1, per_page: 10 });
        assert_eq!(PageRequest::new(3, 100), PageRequest { page: 3, per_page: 20 });
        assert_eq!(PageRequest::new(3, 15).offset(), 30);
    }

    #[test]
    fn test_huge_page_is_capped() {
        let request = PageRequest::new(u64::MAX, MAX_PER_PAGE);
        assert_eq!(request.page, MAX_PAGE);
        assert!(request.offset() <= i64::MAX as u64);

        let page = Page::<()>::new(vec![], request, 3);
        assert!(!page.has_next());
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn test_last_page() {
        let request = PageRequest::new(1, 20);
        assert_eq!(Page::<()>::new(vec![], request, 0).last_page(), 1);
        assert_eq!(Page::<()>::new(vec![], request, 20).last_page(), 1);
        assert_eq!(Page::<()>::new(vec![], request, 21).last_page(), 2);
        assert!(Page::<()>::new(vec![], request, 21).has_next());
    }
}
